// src/noyau/post.rs
//
// Post-traitement de la suite brute de jetons :
// 0) arguments doubles : frac(a,b) -> frac(a)(b)
// 1) coalescence : 2π -> 6.28…, 2x -> monôme, x x -> x^2 (sauf autour d'un ^)
// 2) signes : un +/- qui n'est pas entre deux opérandes est replié dans le littéral voisin
// 3) multiplication implicite : 2(…), (…)3, (…)(…), 2sin(…)
//
// + déballage (appelé par le contrôleur avant chaque balayage) : (5) -> 5,
//   (2x+3) en contexte additif -> termes signés.

use super::balayage::{choisir, est_argument, est_premier_argument};
use super::erreur::ErreurNoyau;
use super::jetons::{Jeton, Monome, Op};
use super::parens::Suite;

/// Pipeline complet : jetons bruts -> suite prête pour le balayage.
pub fn post_traiter(jetons: Vec<Jeton>) -> Result<Suite, ErreurNoyau> {
    let mut suite = Suite::nouvelle(jetons)?;
    separer_arguments(&mut suite)?;
    coalescer(&mut suite)?;
    normaliser_signes(&mut suite)?;
    multiplication_implicite(&mut suite)?;
    verifier(&suite)?;
    Ok(suite)
}

/* ------------------------ 0) arguments doubles ------------------------ */

/// Virgule directement dans le groupe qui suit un opérateur DoubleDroite.
fn virgule_d_arguments(suite: &Suite) -> Result<Option<usize>, ErreurNoyau> {
    for o in 0..suite.len() {
        if !(suite.jetons()[o].est_ouvrante() && est_premier_argument(suite, o)) {
            continue;
        }
        let f = suite.partenaire(o)?;
        let mut k = o + 1;
        while k < f {
            let j = &suite.jetons()[k];
            if j.est_ouvrante() {
                k = suite.partenaire(k)? + 1;
                continue;
            }
            if j.op() == Some(Op::Virgule) {
                return Ok(Some(k));
            }
            k += 1;
        }
    }
    Ok(None)
}

pub fn separer_arguments(suite: &mut Suite) -> Result<(), ErreurNoyau> {
    while let Some(v) = virgule_d_arguments(suite)? {
        suite.remplacer(v..v + 1, vec![Jeton::fermante(), Jeton::ouvrante()])?;
    }
    Ok(())
}

/* ------------------------ 1) coalescence ------------------------ */

fn touche_puissance(suite: &Suite, i: usize) -> bool {
    let avant = i > 0 && suite.jetons()[i - 1].op() == Some(Op::Puissance);
    let apres = suite.get(i + 2).and_then(Jeton::op) == Some(Op::Puissance);
    avant || apres
}

fn fusion(a: &Jeton, b: &Jeton) -> Option<Jeton> {
    match (a, b) {
        (Jeton::Nombre(x), Jeton::Nombre(y)) => Some(Jeton::Nombre(x * y)),
        (Jeton::Nombre(c), Jeton::Variable(m)) | (Jeton::Variable(m), Jeton::Nombre(c)) => {
            Some(Jeton::Variable(Monome {
                coeff: c * m.coeff,
                ..m.clone()
            }))
        }
        (Jeton::Variable(a), Jeton::Variable(b)) if a.nom == b.nom => {
            Some(Jeton::Variable(Monome {
                coeff: a.coeff * b.coeff,
                nom: a.nom.clone(),
                puissance: a.puissance.saturating_add(b.puissance),
            }))
        }
        _ => None,
    }
}

pub fn coalescer(suite: &mut Suite) -> Result<(), ErreurNoyau> {
    let mut i = 0;
    while i + 1 < suite.len() {
        // l'exposant lie plus fort : 3x^2 = 3·x², x^2y = x²·y
        if touche_puissance(suite, i) {
            i += 1;
            continue;
        }
        match fusion(&suite.jetons()[i], &suite.jetons()[i + 1]) {
            Some(j) => suite.remplacer(i..i + 2, vec![j])?,
            None => i += 1,
        }
    }
    Ok(())
}

/* ------------------------ 2) signes ------------------------ */

fn est_operande_gauche(j: &Jeton) -> bool {
    j.est_litteral() || j.est_fermante()
}

fn est_operande_droite(j: &Jeton) -> bool {
    j.est_litteral() || j.est_ouvrante() || j.op().is_some_and(Op::est_fonction)
}

/// De droite à gauche : "--3" replie d'abord le signe intérieur.
pub fn normaliser_signes(suite: &mut Suite) -> Result<(), ErreurNoyau> {
    let mut i = suite.len();
    while i > 0 {
        i -= 1;
        let Some(op) = suite.jetons()[i].op() else {
            continue;
        };
        if !op.est_additif() {
            continue;
        }

        let gauche = i > 0 && est_operande_gauche(&suite.jetons()[i - 1]);
        if gauche {
            // binaire (ou opérande droit manquant : le balayage le signalera)
            continue;
        }

        let Some(droite) = suite.get(i + 1).cloned() else {
            continue;
        };
        // -x^2 = -(x^2) : on ne replie pas dans la base d'une puissance
        let base = suite.get(i + 2).and_then(Jeton::op) == Some(Op::Puissance);
        match (op, droite.oppose()) {
            (Op::Plus, _) if est_operande_droite(&droite) => suite.remplacer(i..i + 1, vec![])?,
            (Op::Moins, Some(neg)) if !base => suite.remplacer(i..i + 2, vec![neg])?,
            (Op::Moins, _) if est_operande_droite(&droite) => {
                suite.remplacer(i..i + 1, vec![Jeton::Nombre(-1.0), Jeton::Op(Op::Mul)])?
            }
            _ => {}
        }
    }
    Ok(())
}

/* ------------------------ 3) multiplication implicite ------------------------ */

pub fn multiplication_implicite(suite: &mut Suite) -> Result<(), ErreurNoyau> {
    let mut i = 0;
    while i + 1 < suite.len() {
        let a = &suite.jetons()[i];
        let b = &suite.jetons()[i + 1];

        if est_operande_gauche(a) && est_operande_droite(b) {
            // frac(a)(b) : le premier groupe appartient à l'opérateur
            let proprietaire = a.est_fermante() && {
                let o = suite.partenaire(i)?;
                est_premier_argument(suite, o)
            };
            if !proprietaire {
                suite.remplacer(i + 1..i + 1, vec![Jeton::Op(Op::Mul)])?;
            }
        }
        i += 1;
    }
    Ok(())
}

fn verifier(suite: &Suite) -> Result<(), ErreurNoyau> {
    for (i, j) in suite.jetons().iter().enumerate() {
        if matches!(j, Jeton::Paren { .. }) {
            suite.id(i)?;
        }
        if j.op() == Some(Op::Virgule) {
            return Err(ErreurNoyau::Structure(
                "virgule hors des arguments de frac/binom".into(),
            ));
        }
    }
    Ok(())
}

/* ------------------------ déballage ------------------------ */

/// Contenu “termes signés” : littéral ((+|-) littéral)*. None sinon.
pub(super) fn termes_signes(contenu: &[Jeton]) -> Option<Vec<Jeton>> {
    let mut out = Vec::new();
    let mut signe_moins = false;
    for (k, j) in contenu.iter().enumerate() {
        if k % 2 == 0 {
            let t = if signe_moins { j.oppose()? } else { j.clone() };
            if !t.est_litteral() {
                return None;
            }
            out.push(t);
        } else {
            signe_moins = match j.op() {
                Some(Op::Plus) => false,
                Some(Op::Moins) => true,
                _ => return None,
            };
        }
    }
    (contenu.len() % 2 == 1).then_some(out)
}

pub(super) fn joindre_termes(termes: Vec<Jeton>) -> Vec<Jeton> {
    let mut out = Vec::with_capacity(termes.len() * 2);
    for (k, t) in termes.into_iter().enumerate() {
        if k > 0 {
            out.push(Jeton::Op(Op::Plus));
        }
        out.push(t);
    }
    out
}

/// Un seul déballage ; Ok(true) si la suite a changé.
fn deballer_un(suite: &mut Suite) -> Result<bool, ErreurNoyau> {
    for (_, o, f) in suite.groupes()? {
        if f == o + 1 {
            return Err(ErreurNoyau::Structure("groupe vide".into()));
        }
        if est_argument(suite, o)? {
            continue;
        }

        let contenu = &suite.jetons()[o + 1..f];

        // (5) -> 5
        if contenu.len() == 1 && contenu[0].est_litteral() {
            let j = contenu[0].clone();
            suite.remplacer(o..f + 1, vec![j])?;
            return Ok(true);
        }

        // ((…)) -> (…)
        // une seule épissure : les identités sont revérifiées à chaque remplacement
        if contenu[0].est_ouvrante() && suite.partenaire(o + 1)? == f - 1 {
            let interieur = contenu.to_vec();
            suite.remplacer(o..f + 1, interieur)?;
            return Ok(true);
        }

        if choisir(suite, o + 1..f)?.is_some() {
            continue;
        }
        let Some(termes) = termes_signes(contenu) else {
            continue;
        };

        let avant = (o > 0).then(|| suite.jetons()[o - 1].clone());
        let apres = suite.get(f + 1).cloned();

        let apres_ok = match &apres {
            None => true,
            Some(j) => {
                j.est_fermante() || matches!(j.op(), Some(Op::Plus | Op::Moins | Op::Egal))
            }
        };
        if !apres_ok {
            continue;
        }

        match avant {
            None => suite.remplacer(o..f + 1, joindre_termes(termes))?,
            Some(j) if j.est_ouvrante() || matches!(j.op(), Some(Op::Plus | Op::Egal)) => {
                suite.remplacer(o..f + 1, joindre_termes(termes))?
            }
            // a - (b + c) -> a + -b + -c
            Some(Jeton::Op(Op::Moins)) => {
                let mut nouveaux = vec![Jeton::Op(Op::Plus)];
                let opposes: Option<Vec<Jeton>> = termes.iter().map(Jeton::oppose).collect();
                let Some(opposes) = opposes else {
                    continue;
                };
                nouveaux.extend(joindre_termes(opposes));
                suite.remplacer(o - 1..f + 1, nouveaux)?
            }
            _ => continue,
        }
        return Ok(true);
    }
    Ok(false)
}

/// Déballe jusqu'au point fixe. Chaque pas raccourcit la suite.
pub fn deballer(suite: &mut Suite) -> Result<bool, ErreurNoyau> {
    let mut change = false;
    while deballer_un(suite)? {
        change = true;
    }
    Ok(change)
}
