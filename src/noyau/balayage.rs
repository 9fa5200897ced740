// src/noyau/balayage.rs
//
// Balayage de priorité : trouve la prochaine opération à exécuter.
//
// Règles:
// - on part du groupe parenthésé le plus profond qui contient un opérateur réductible ;
//   un groupe sans opérateur réductible est “vérifié” et on remonte
// - sans tel groupe, la région est la suite entière (hors groupes imbriqués)
// - dans la région : palier le plus fort d'abord, puis ordre de rencontre
// - un balayage ne boucle pas : il visite chaque groupe une fois, puis la racine
// - garde-fou (GardeBalayage) : le contrôleur étant déterministe, revenir sur un état
//   déjà balayé signe un cycle ; au-delà de `limite` retours, DivergenceBalayage

use std::collections::HashSet;
use std::ops::Range;

use log::trace;

use super::erreur::ErreurNoyau;
use super::jetons::{format_jetons, Cote, Jeton, Op};
use super::parens::Suite;

/// Opérande extrait autour d'un opérateur.
/// Emprunte la suite : impossible de le conserver à travers une épissure.
#[derive(Clone, Debug, PartialEq)]
pub struct Portee<'a> {
    /// Jetons couverts (parenthèses du groupe incluses).
    pub jetons: &'a [Jeton],
    /// Sous-expression complète (pas un simple scalaire) : à réécrire, pas à substituer.
    pub multi: bool,
    pub plage: Range<usize>,
}

impl<'a> Portee<'a> {
    fn litteral(suite: &'a Suite, i: usize) -> Self {
        Portee {
            jetons: &suite.jetons()[i..i + 1],
            multi: false,
            plage: i..i + 1,
        }
    }

    fn groupe(suite: &'a Suite, o: usize, f: usize) -> Self {
        let jetons = &suite.jetons()[o..=f];
        let multi = !(jetons.len() == 3 && jetons[1].est_litteral());
        Portee {
            jetons,
            multi,
            plage: o..f + 1,
        }
    }

    /// Région entière (côtés d'un `=`).
    fn cote(suite: &'a Suite, plage: Range<usize>) -> Self {
        let jetons = &suite.jetons()[plage.clone()];
        let multi = !(jetons.len() == 1 && jetons[0].est_litteral());
        Portee {
            jetons,
            multi,
            plage,
        }
    }

    /// Le scalaire porté (littéral seul ou seul contenu d'un groupe).
    pub fn scalaire(&self) -> Option<&'a Jeton> {
        if self.multi {
            return None;
        }
        match self.jetons {
            [j] => Some(j),
            [_, j, _] => Some(j),
            _ => None,
        }
    }

    /// Contenu sans les parenthèses extérieures d'un groupe.
    pub fn contenu(&self) -> &'a [Jeton] {
        match self.jetons {
            [o, milieu @ .., f] if o.est_ouvrante() && f.est_fermante() => milieu,
            tout => tout,
        }
    }
}

/// Prochaine opération. Pour un opérateur `DoubleDroite`, `gauche` porte le
/// premier argument (numérateur, n) et `droite` le second.
#[derive(Clone, Debug, PartialEq)]
pub struct Operation<'a> {
    pub op: Op,
    pub indice: usize,
    pub gauche: Option<Portee<'a>>,
    pub droite: Option<Portee<'a>>,
}

impl Operation<'_> {
    /// Plage consommée par l'opération (opérateur + opérandes).
    pub fn plage(&self) -> Range<usize> {
        let mut debut = self.indice;
        let mut fin = self.indice + 1;
        if let Some(g) = &self.gauche {
            debut = debut.min(g.plage.start);
            fin = fin.max(g.plage.end);
        }
        if let Some(d) = &self.droite {
            fin = fin.max(d.plage.end);
        }
        Range {
            start: debut,
            end: fin,
        }
    }

    pub fn a_variable(&self) -> bool {
        [&self.gauche, &self.droite]
            .into_iter()
            .flatten()
            .any(|p| p.jetons.iter().any(|j| matches!(j, Jeton::Variable(_))))
    }

    pub fn a_multi(&self) -> bool {
        [&self.gauche, &self.droite]
            .into_iter()
            .flatten()
            .any(|p| p.multi)
    }
}

/* ------------------------ Extraction d'opérandes ------------------------ */

/// Vrai si le groupe ouvert en `o` appartient à une fonction (sin(…), frac(…)(…)).
pub fn est_argument(suite: &Suite, o: usize) -> Result<bool, ErreurNoyau> {
    if o == 0 {
        return Ok(false);
    }
    match &suite.jetons()[o - 1] {
        Jeton::Op(op) => Ok(op.est_fonction()),
        j if j.est_fermante() => {
            // second argument : le groupe précédent suit un opérateur DoubleDroite
            let p = suite.partenaire(o - 1)?;
            Ok(p > 0 && est_premier_argument(suite, p))
        }
        _ => Ok(false),
    }
}

/// Vrai si le groupe ouvert en `o` est le premier argument d'un DoubleDroite.
pub fn est_premier_argument(suite: &Suite, o: usize) -> bool {
    o > 0
        && matches!(
            suite.jetons()[o - 1].op().map(Op::cote),
            Some(Cote::DoubleDroite)
        )
}

fn operande_gauche(suite: &Suite, i: usize) -> Result<Option<Portee<'_>>, ErreurNoyau> {
    if i == 0 {
        return Ok(None);
    }
    let j = &suite.jetons()[i - 1];
    if j.est_litteral() {
        return Ok(Some(Portee::litteral(suite, i - 1)));
    }
    if j.est_fermante() {
        let o = suite.partenaire(i - 1)?;
        return Ok(Some(Portee::groupe(suite, o, i - 1)));
    }
    Ok(None)
}

fn operande_droite(suite: &Suite, i: usize) -> Result<Option<Portee<'_>>, ErreurNoyau> {
    let Some(j) = suite.get(i + 1) else {
        return Ok(None);
    };
    if j.est_litteral() {
        return Ok(Some(Portee::litteral(suite, i + 1)));
    }
    if j.est_ouvrante() {
        let f = suite.partenaire(i + 1)?;
        return Ok(Some(Portee::groupe(suite, i + 1, f)));
    }
    Ok(None)
}

fn suivi_de_fonction(suite: &Suite, i: usize) -> bool {
    matches!(suite.get(i + 1).and_then(Jeton::op), Some(o) if o.est_fonction())
}

/// `+`/`-` : voisins de même nature, sinon c'est un signe de terme.
fn meme_nature(g: &Jeton, d: &Jeton) -> bool {
    match (g, d) {
        (Jeton::Nombre(_), Jeton::Nombre(_)) => true,
        // noms différents : on laisse l'évaluateur refuser explicitement
        (Jeton::Variable(a), Jeton::Variable(b)) => a.semblable(b) || a.nom != b.nom,
        _ => false,
    }
}

/* ------------------------ Candidats ------------------------ */

fn candidat<'a>(
    suite: &'a Suite,
    k: usize,
    op: Op,
    region: &Range<usize>,
) -> Result<Option<Operation<'a>>, ErreurNoyau> {
    let operation = |gauche, droite| {
        Ok(Some(Operation {
            op,
            indice: k,
            gauche,
            droite,
        }))
    };

    match op.cote() {
        Cote::Aucun => Ok(None),

        Cote::Deux if op == Op::Egal => {
            let deuxieme = (k + 1..region.end).find(|&i| {
                suite.jetons()[i].op() == Some(Op::Egal)
            });
            if deuxieme.is_some() {
                return Err(ErreurNoyau::VariableNonSupportee(
                    "un seul signe = est pris en charge".into(),
                ));
            }
            let g = (region.start < k).then(|| Portee::cote(suite, region.start..k));
            let d = (k + 1 < region.end).then(|| Portee::cote(suite, k + 1..region.end));
            operation(g, d)
        }

        Cote::Deux => {
            let g = operande_gauche(suite, k)?;
            let d = operande_droite(suite, k)?;

            let (g, d) = match (g, d) {
                (Some(g), Some(d)) => (g, d),
                (g, None) if suivi_de_fonction(suite, k) && g.is_some() => return Ok(None),
                (g, d) => return operation(g, d),
            };

            // sin(30)^2 : la fonction passe d'abord
            if g.jetons[0].est_ouvrante() && est_argument(suite, g.plage.start)? {
                return Ok(None);
            }

            let retenu = match op {
                Op::Plus | Op::Moins => match (g.scalaire(), d.scalaire()) {
                    (Some(a), Some(b)) => meme_nature(a, b),
                    _ => false,
                },
                Op::Inf | Op::Sup | Op::InfEg | Op::SupEg | Op::Diff => {
                    match (g.scalaire(), d.scalaire()) {
                        (Some(Jeton::Nombre(_)), Some(Jeton::Nombre(_))) => true,
                        (Some(Jeton::Booleen(_)), Some(Jeton::Booleen(_))) if op == Op::Diff => {
                            true
                        }
                        // 1<2<3 : le booléen de la première comparaison n'est pas un nombre
                        (Some(Jeton::Booleen(_)), _) | (_, Some(Jeton::Booleen(_))) => {
                            return Err(ErreurNoyau::Structure(format!(
                                "comparaison enchaînée autour de '{}'",
                                op.symbole()
                            )));
                        }
                        _ => false,
                    }
                }
                _ => true,
            };

            if retenu {
                operation(Some(g), Some(d))
            } else {
                Ok(None)
            }
        }

        Cote::Droite => {
            let Some(d) = operande_droite(suite, k)? else {
                if suivi_de_fonction(suite, k) {
                    return Ok(None);
                }
                return operation(None, None);
            };

            let retenu = match d.scalaire() {
                None => false,
                Some(Jeton::Nombre(_)) => true,
                // √(4x^2) -> 2x ; le reste (sin(x), √x) reste symbolique
                Some(Jeton::Variable(m)) => {
                    op == Op::Racine && m.puissance % 2 == 0 && m.coeff >= 0.0
                }
                Some(_) => true,
            };

            if retenu {
                operation(None, Some(d))
            } else {
                Ok(None)
            }
        }

        Cote::DoubleDroite => {
            let premier = match suite.get(k + 1) {
                Some(j) if j.est_ouvrante() => operande_droite(suite, k)?,
                _ => None,
            };
            let Some(premier) = premier else {
                return operation(None, None);
            };
            let fin1 = premier.plage.end;
            let second = match suite.get(fin1) {
                Some(j) if j.est_ouvrante() => {
                    let f = suite.partenaire(fin1)?;
                    Some(Portee::groupe(suite, fin1, f))
                }
                _ => None,
            };
            let Some(second) = second else {
                return operation(Some(premier), None);
            };

            let retenu = match op {
                Op::Binom => matches!(
                    (premier.scalaire(), second.scalaire()),
                    (Some(Jeton::Nombre(_)), Some(Jeton::Nombre(_)))
                ),
                _ => true,
            };

            if retenu {
                operation(Some(premier), Some(second))
            } else {
                Ok(None)
            }
        }
    }
}

/// Choisit l'opération dans la région [debut, fin), sans entrer dans les groupes imbriqués.
pub fn choisir(suite: &Suite, region: Range<usize>) -> Result<Option<Operation<'_>>, ErreurNoyau> {
    for palier in 1..=6u8 {
        let mut k = region.start;
        while k < region.end {
            let j = &suite.jetons()[k];
            if j.est_ouvrante() {
                k = suite.partenaire(k)? + 1;
                continue;
            }
            if let Some(op) = j.op() {
                if op.priorite() == Some(palier) {
                    if let Some(o) = candidat(suite, k, op, &region)? {
                        return Ok(Some(o));
                    }
                }
            }
            k += 1;
        }
    }
    Ok(None)
}

/// Prochaine opération de la suite, ou None si plus rien n'est réductible.
pub fn trouver_operation(suite: &Suite) -> Result<Option<Operation<'_>>, ErreurNoyau> {
    for (profondeur, o, f) in suite.groupes()? {
        if let Some(op) = choisir(suite, o + 1..f)? {
            trace!("groupe {o}..{f} (profondeur {profondeur}): '{}'", op.op.symbole());
            return Ok(Some(op));
        }
    }

    let op = choisir(suite, 0..suite.len())?;
    trace!("niveau racine: {:?}", op.as_ref().map(|o| o.op.symbole()));
    Ok(op)
}

/* ------------------------ Garde-fou ------------------------ */

/// Empreintes des états déjà balayés pendant une évaluation.
#[derive(Debug, Default)]
pub struct GardeBalayage {
    vus: HashSet<String>,
    retours: usize,
    limite: usize,
}

impl GardeBalayage {
    pub fn nouvelle(limite: usize) -> Self {
        Self {
            limite,
            ..Self::default()
        }
    }

    /// Enregistre l'état avant balayage. Ok(true) : état déjà vu (cycle).
    pub fn passage(&mut self, suite: &Suite) -> Result<bool, ErreurNoyau> {
        if self.vus.insert(format_jetons(suite.jetons())) {
            return Ok(false);
        }
        self.retours += 1;
        trace!("état déjà balayé ({} retour(s))", self.retours);
        if self.retours > self.limite {
            return Err(ErreurNoyau::DivergenceBalayage {
                limite: self.limite,
            });
        }
        Ok(true)
    }

    pub fn retours(&self) -> usize {
        self.retours
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noyau::post::post_traiter;
    use crate::noyau::jetons::tokenize;

    fn suite(s: &str) -> Suite {
        post_traiter(tokenize(s).unwrap()).unwrap()
    }

    fn premiere(s: &str) -> Option<(Op, usize)> {
        let su = suite(s);
        trouver_operation(&su)
            .unwrap()
            .map(|o| (o.op, o.indice))
    }

    #[test]
    fn priorite_mul_avant_add() {
        assert_eq!(premiere("2+3*4"), Some((Op::Mul, 3)));
        assert_eq!(premiere("2^3+1"), Some((Op::Puissance, 1)));
    }

    #[test]
    fn groupe_le_plus_profond_dabord() {
        assert_eq!(premiere("(2+3)*4"), Some((Op::Plus, 2)));
    }

    #[test]
    fn signe_de_terme_rejete() {
        // 2x + 3 : natures différentes, rien à faire
        assert_eq!(premiere("2x+3"), None);
        // x + y : mêmes natures, l'évaluateur refusera
        assert_eq!(premiere("x+y"), Some((Op::Plus, 1)));
    }

    #[test]
    fn fonction_avant_puissance() {
        // sin(30)^2 : sin d'abord
        assert_eq!(premiere("sin(30)^2"), Some((Op::Sin, 0)));
    }

    #[test]
    fn egal_prend_les_cotes_entiers() {
        let su = suite("2x+3=7");
        let o = trouver_operation(&su).unwrap().unwrap();
        assert_eq!(o.op, Op::Egal);
        assert!(o.gauche.as_ref().unwrap().multi);
        assert_eq!(o.gauche.as_ref().unwrap().jetons.len(), 3);
        assert!(!o.droite.as_ref().unwrap().multi);
    }

    #[test]
    fn frac_deux_arguments() {
        let su = suite("frac(1)(4)");
        let o = trouver_operation(&su).unwrap().unwrap();
        assert_eq!(o.op, Op::Frac);
        assert_eq!(o.gauche.unwrap().scalaire(), Some(&Jeton::Nombre(1.0)));
        assert_eq!(o.droite.unwrap().scalaire(), Some(&Jeton::Nombre(4.0)));
    }

    #[test]
    fn operande_manquant_signale() {
        let su = suite("3*");
        let o = trouver_operation(&su).unwrap().unwrap();
        assert_eq!(o.op, Op::Mul);
        assert!(o.droite.is_none());
    }

    #[test]
    fn un_balayage_par_etat() {
        // 200 groupes irréductibles : aucune limite de taille
        let su = suite(&vec!["sin(x)"; 200].join("+"));
        assert_eq!(trouver_operation(&su).unwrap(), None);
    }

    #[test]
    fn comparaison_enchainee() {
        // 1<2<3 après la première comparaison
        let su = Suite::nouvelle(vec![
            Jeton::Booleen(true),
            Jeton::Op(Op::Inf),
            Jeton::Nombre(3.0),
        ])
        .unwrap();
        assert!(matches!(trouver_operation(&su), Err(ErreurNoyau::Structure(_))));
    }

    #[test]
    fn garde_detecte_le_cycle() {
        let a = suite("x=2");
        let b = suite("2=x");
        let mut garde = GardeBalayage::nouvelle(2);
        assert!(!garde.passage(&a).unwrap());
        assert!(!garde.passage(&b).unwrap());
        // a -> b -> a -> b -> a : le troisième retour dépasse la limite
        assert!(garde.passage(&a).unwrap());
        assert!(garde.passage(&b).unwrap());
        assert_eq!(
            garde.passage(&a),
            Err(ErreurNoyau::DivergenceBalayage { limite: 2 })
        );
        assert_eq!(garde.retours(), 3);
    }
}
