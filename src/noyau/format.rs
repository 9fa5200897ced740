// src/noyau/format.rs
//
// Reconstruction : suite de jetons -> chaîne LaTeX relisible par `tokenize`.

use std::ops::Range;

use super::jetons::{Cote, Jeton, Monome, Op};

/* ------------------------ Jetons isolés ------------------------ */

/// f64 -> texte court ("14", "0.5", "-2") ; -0 s'écrit 0.
pub fn texte_nombre(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    format!("{v}")
}

/// 2x, -x, x^{2}, 3x^{2}
fn texte_monome(m: &Monome) -> String {
    let coeff = if m.coeff == 1.0 {
        String::new()
    } else if m.coeff == -1.0 {
        "-".to_string()
    } else {
        texte_nombre(m.coeff)
    };
    if m.puissance == 1 {
        format!("{coeff}{}", m.nom)
    } else {
        format!("{coeff}{}^{{{}}}", m.nom, m.puissance)
    }
}

pub fn texte_jeton(j: &Jeton) -> String {
    match j {
        Jeton::Nombre(v) => texte_nombre(*v),
        Jeton::Variable(m) => texte_monome(m),
        Jeton::Booleen(b) => b.to_string(),
        Jeton::Op(o) => o.symbole().to_string(),
        Jeton::Paren { .. } if j.est_ouvrante() => "(".to_string(),
        Jeton::Paren { .. } => ")".to_string(),
    }
}

/* ------------------------ Appariement ------------------------ */

/// Jumelle de chaque parenthèse, par pile. Ne dépend pas des identités :
/// la reconstruction accepte une suite fraîchement épissée.
fn apparier(jetons: &[Jeton]) -> Vec<Option<usize>> {
    let mut paires = vec![None; jetons.len()];
    let mut pile = Vec::new();
    for (i, j) in jetons.iter().enumerate() {
        if j.est_ouvrante() {
            pile.push(i);
        } else if j.est_fermante() {
            if let Some(o) = pile.pop() {
                paires[o] = Some(i);
                paires[i] = Some(o);
            }
        }
    }
    paires
}

fn double_droite(j: &Jeton) -> bool {
    j.op().map(Op::cote) == Some(Cote::DoubleDroite)
}

/// Groupe ouvert en `o` : argument de frac/binom (rendu entre accolades).
fn argument_double(jetons: &[Jeton], paires: &[Option<usize>], o: usize) -> bool {
    if o == 0 {
        return false;
    }
    let avant = &jetons[o - 1];
    if double_droite(avant) {
        return true;
    }
    avant.est_fermante()
        && paires[o - 1].is_some_and(|p| p > 0 && double_droite(&jetons[p - 1]))
}

/// Groupe libre (ni argument, ni exposant) : candidat à \frac{…}{…}.
fn groupe_libre(jetons: &[Jeton], paires: &[Option<usize>], o: usize) -> bool {
    if o == 0 {
        return true;
    }
    if argument_double(jetons, paires, o) {
        return false;
    }
    !matches!(jetons[o - 1].op(), Some(op) if op.est_fonction() || op == Op::Puissance)
}

/* ------------------------ Reconstruction ------------------------ */

pub fn reconstruire(jetons: &[Jeton]) -> String {
    let paires = apparier(jetons);
    let mut out = String::new();
    ecrire(jetons, &paires, 0..jetons.len(), &mut out);
    out
}

/// Fin (exclue) de l'opérande qui commence en `i`, s'il y en a un.
fn fin_operande(jetons: &[Jeton], paires: &[Option<usize>], i: usize) -> Option<usize> {
    let j = jetons.get(i)?;
    if j.est_litteral() {
        return Some(i + 1);
    }
    if j.est_ouvrante() {
        return paires[i].map(|f| f + 1);
    }
    None
}

fn ecrire(jetons: &[Jeton], paires: &[Option<usize>], plage: Range<usize>, out: &mut String) {
    // vrai quand le dernier élément écrit est un opérande (littéral ou groupe fermé)
    let mut apres_operande = false;
    let mut i = plage.start;

    while i < plage.end {
        let j = &jetons[i];

        // (A)/B -> \frac{A}{B}
        if j.est_ouvrante() && groupe_libre(jetons, paires, i) {
            if let Some(f) = paires[i] {
                let droite = f + 2;
                let div = jetons.get(f + 1).and_then(Jeton::op) == Some(Op::Div);
                if let Some(fin) = fin_operande(jetons, paires, droite).filter(|&e| div && e <= plage.end) {
                    if apres_operande {
                        out.push('+');
                    }
                    out.push_str("\\frac{");
                    ecrire(jetons, paires, i + 1..f, out);
                    out.push_str("}{");
                    if jetons[droite].est_ouvrante() {
                        ecrire(jetons, paires, droite + 1..fin - 1, out);
                    } else {
                        out.push_str(&texte_jeton(&jetons[droite]));
                    }
                    out.push('}');
                    apres_operande = true;
                    i = fin;
                    continue;
                }
            }
        }

        match j {
            Jeton::Op(op) => {
                let suivant = jetons.get(i + 1);
                match op {
                    // a + -b s'écrit a-b
                    Op::Plus if suivant.is_some_and(|s| s.est_litteral() && s.est_negatif()) => {}
                    Op::Egal => out.push_str(" = "),
                    _ => {
                        let s = op.symbole();
                        out.push_str(s);
                        // \sin x, pas \sinx
                        if s.ends_with(|c: char| c.is_ascii_alphabetic())
                            && matches!(suivant, Some(Jeton::Variable(_)))
                        {
                            out.push(' ');
                        }
                    }
                }
                apres_operande = false;
            }

            Jeton::Paren { .. } if j.est_ouvrante() => {
                let arg = argument_double(jetons, paires, i);
                // deux opérandes juxtaposés : somme implicite
                if apres_operande && !arg {
                    out.push('+');
                }
                out.push(if arg { '{' } else { '(' });
                apres_operande = false;
            }

            Jeton::Paren { .. } => {
                let arg = paires[i].is_some_and(|o| argument_double(jetons, paires, o));
                out.push(if arg { '}' } else { ')' });
                apres_operande = true;
            }

            _ => {
                if apres_operande && !j.est_negatif() {
                    out.push('+');
                }
                let s = texte_jeton(j);
                // (-3)^2, pas -3^2
                let base = jetons.get(i + 1).and_then(Jeton::op) == Some(Op::Puissance);
                if base && j.est_negatif() {
                    out.push('(');
                    out.push_str(&s);
                    out.push(')');
                } else {
                    out.push_str(&s);
                }
                apres_operande = true;
            }
        }
        i += 1;
    }
}
