// src/noyau/reecriture.rs
//
// Réécritures symboliques, quand une opération ne peut pas être substituée
// par un scalaire :
// - développement : (a+b)*(c+d), (a+b)/c, (a+b)^n (n entier, petit)
// - isolement     : `=` avec une variable -> variable à gauche, constantes à droite
// - second degré  : ax² + bx + c = 0 -> racines réelles
//
// Les sorties sont des jetons bruts (sans identités) : le contrôleur épisse,
// `Suite::remplacer` réassigne.

use super::erreur::ErreurNoyau;
use super::jetons::{Jeton, Monome, Op};
use super::post::{joindre_termes, termes_signes};

/// Plus grand exposant développé par produit répété.
pub const PUISSANCE_MAX_DEVELOPPEE: i32 = 10;

/// Termes produits par une distribution, au plus.
pub const TERMES_MAX: usize = 256;

/// Discriminant considéré nul en deçà.
const EPSILON_DISCRIMINANT: f64 = 1e-12;

fn termes(contenu: &[Jeton], quoi: &str) -> Result<Vec<Jeton>, ErreurNoyau> {
    termes_signes(contenu).ok_or_else(|| {
        ErreurNoyau::VariableNonSupportee(format!("{quoi} : terme composé non pris en charge"))
    })
}

fn groupe(contenu: Vec<Jeton>) -> Vec<Jeton> {
    let mut out = Vec::with_capacity(contenu.len() + 2);
    out.push(Jeton::ouvrante());
    out.extend(contenu);
    out.push(Jeton::fermante());
    out
}

/* ------------------------ Développement ------------------------ */

/// Développe `gauche op droite` (contenus sans parenthèses extérieures).
/// Le résultat est un groupe : il remplace exactement la plage de l'opération.
pub fn developper(op: Op, gauche: &[Jeton], droite: &[Jeton]) -> Result<Vec<Jeton>, ErreurNoyau> {
    let a = termes(gauche, "développement")?;

    match op {
        Op::Mul => {
            let b = termes(droite, "développement")?;
            if a.len() * b.len() > TERMES_MAX {
                return Err(ErreurNoyau::VariableNonSupportee(format!(
                    "développement de plus de {TERMES_MAX} termes"
                )));
            }
            let mut out = Vec::new();
            for (k, (ta, tb)) in a
                .iter()
                .flat_map(|ta| b.iter().map(move |tb| (ta, tb)))
                .enumerate()
            {
                if k > 0 {
                    out.push(Jeton::Op(Op::Plus));
                }
                out.extend([ta.clone(), Jeton::Op(Op::Mul), tb.clone()]);
            }
            Ok(groupe(out))
        }

        Op::Div | Op::Frac => {
            let b = termes(droite, "division")?;
            let [d] = b.as_slice() else {
                return Err(ErreurNoyau::VariableNonSupportee(
                    "division par une somme non prise en charge".into(),
                ));
            };
            let mut out = Vec::new();
            for (k, ta) in a.into_iter().enumerate() {
                if k > 0 {
                    out.push(Jeton::Op(Op::Plus));
                }
                out.extend([ta, Jeton::Op(Op::Div), d.clone()]);
            }
            Ok(groupe(out))
        }

        Op::Puissance => {
            let n = match termes(droite, "puissance")?.as_slice() {
                [Jeton::Nombre(v)] if v.fract() == 0.0 => *v as i32,
                _ => {
                    return Err(ErreurNoyau::VariableNonSupportee(
                        "exposant non entier sur une somme".into(),
                    ))
                }
            };
            if !(0..=PUISSANCE_MAX_DEVELOPPEE).contains(&n) {
                return Err(ErreurNoyau::VariableNonSupportee(format!(
                    "exposant {n} hors de 0..={PUISSANCE_MAX_DEVELOPPEE} sur une somme"
                )));
            }
            if n == 0 {
                return Ok(vec![Jeton::Nombre(1.0)]);
            }
            // (A)^n -> ((A)*(A)*…) : les produits se développeront ensuite deux à deux
            let base = groupe(joindre_termes(a));
            let mut out = Vec::new();
            for k in 0..n {
                if k > 0 {
                    out.push(Jeton::Op(Op::Mul));
                }
                out.extend(base.iter().cloned());
            }
            Ok(groupe(out))
        }

        autre => Err(ErreurNoyau::Structure(format!(
            "'{}' ne se développe pas",
            autre.symbole()
        ))),
    }
}

/* ------------------------ Isolement ------------------------ */

#[derive(Clone, Debug, PartialEq)]
pub enum Isolement {
    /// Nouvelle équation, à rebalayer.
    Reecrite(Vec<Jeton>),
    /// Second degré résolu : une racine double ou deux racines.
    Racines { nom: String, racines: Vec<f64> },
}

/// `x = 4` : variable seule (coeff 1, puissance 1) à gauche, nombre à droite.
pub fn deja_isole(gauche: &[Jeton], droite: &[Jeton]) -> bool {
    matches!(
        (gauche, droite),
        ([Jeton::Variable(m)], [Jeton::Nombre(_)]) if m.coeff == 1.0 && m.puissance == 1
    )
}

/// Un pas d'isolement sur `gauche = droite`.
pub fn isoler(gauche: &[Jeton], droite: &[Jeton]) -> Result<Isolement, ErreurNoyau> {
    let tg = termes(gauche, "isolement")?;
    let td = termes(droite, "isolement")?;

    // k = x -> x = k
    let a_variable = |t: &[Jeton]| t.iter().any(|j| matches!(j, Jeton::Variable(_)));
    if !a_variable(&tg) && a_variable(&td) {
        return isoler(droite, gauche);
    }

    let mut variables: Vec<Monome> = Vec::new();
    let mut constantes: Vec<f64> = Vec::new();
    let mut deplacees: Vec<f64> = Vec::new();
    let booleen = || {
        ErreurNoyau::VariableNonSupportee("isolement : booléen dans une équation".into())
    };

    // variables à gauche, constantes à droite ; ce qui traverse change de signe
    for t in &tg {
        match t {
            Jeton::Variable(m) => variables.push(m.clone()),
            Jeton::Nombre(v) => deplacees.push(-v),
            _ => return Err(booleen()),
        }
    }
    for t in &td {
        match t {
            Jeton::Variable(m) => variables.push(Monome {
                coeff: -m.coeff,
                ..m.clone()
            }),
            Jeton::Nombre(v) => constantes.push(*v),
            _ => return Err(booleen()),
        }
    }
    constantes.extend(deplacees);

    let nom = match variables.first() {
        Some(m) => m.nom.clone(),
        None => {
            return Err(ErreurNoyau::Structure(
                "isolement sans variable".into(),
            ))
        }
    };
    if variables.iter().any(|m| m.nom != nom) {
        return Err(ErreurNoyau::deux_variables());
    }

    variables.sort_by(|a, b| b.puissance.cmp(&a.puissance));
    let doublon = variables
        .windows(2)
        .any(|w| w[0].puissance == w[1].puissance);

    // termes semblables ou constantes à sommer : on réémet et le balayage s'en charge
    if doublon || constantes.len() > 1 {
        let mut out = joindre_termes(variables.into_iter().map(Jeton::Variable).collect());
        out.push(Jeton::Op(Op::Egal));
        if constantes.is_empty() {
            out.push(Jeton::Nombre(0.0));
        } else {
            out.extend(joindre_termes(
                constantes.into_iter().map(Jeton::Nombre).collect(),
            ));
        }
        return Ok(Isolement::Reecrite(out));
    }

    let c = constantes.first().copied().unwrap_or(0.0);
    let puissances: Vec<i32> = variables.iter().map(|m| m.puissance).collect();

    match puissances.as_slice() {
        [1] => {
            let m = &variables[0];
            if m.coeff == 0.0 {
                // 0x = c : plus de variable, l'égalité devient un test numérique
                return Ok(Isolement::Reecrite(vec![
                    Jeton::Nombre(0.0),
                    Jeton::Op(Op::Egal),
                    Jeton::Nombre(c),
                ]));
            }
            let x = Jeton::variable(nom);
            if m.coeff == 1.0 {
                return Ok(Isolement::Reecrite(vec![x, Jeton::Op(Op::Egal), Jeton::Nombre(c)]));
            }
            // cx = k -> x = (k)/c
            let mut out = vec![x, Jeton::Op(Op::Egal)];
            out.extend(groupe(vec![Jeton::Nombre(c)]));
            out.extend([Jeton::Op(Op::Div), Jeton::Nombre(m.coeff)]);
            Ok(Isolement::Reecrite(out))
        }

        [2] | [2, 1] => {
            let a = variables[0].coeff;
            let b = variables.get(1).map_or(0.0, |m| m.coeff);
            // ax² + bx = c  <=>  ax² + bx - c = 0
            let racines = quadratique(a, b, -c)?;
            Ok(Isolement::Racines { nom, racines })
        }

        _ => Err(ErreurNoyau::VariableNonSupportee(format!(
            "équation de degré {:?} non prise en charge",
            puissances
        ))),
    }
}

/// Racines réelles de ax² + bx + c = 0 : (-b ± √Δ) / 2a, la racine « + » d'abord.
pub fn quadratique(a: f64, b: f64, c: f64) -> Result<Vec<f64>, ErreurNoyau> {
    if a == 0.0 {
        if b == 0.0 {
            return Err(ErreurNoyau::Indefini("équation sans inconnue".into()));
        }
        return Ok(vec![-c / b]);
    }

    let delta = b * b - 4.0 * a * c;
    if delta < -EPSILON_DISCRIMINANT {
        return Err(ErreurNoyau::Indefini(format!(
            "aucune racine réelle (discriminant {delta})"
        )));
    }
    if delta.abs() <= EPSILON_DISCRIMINANT {
        return Ok(vec![-b / (2.0 * a)]);
    }

    let r = delta.sqrt();
    Ok(vec![(-b + r) / (2.0 * a), (-b - r) / (2.0 * a)])
}
