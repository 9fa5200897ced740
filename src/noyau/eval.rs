//! Noyau : évaluation (boucle de réduction)
//!
//! tokenize -> post-traitement -> { déballage -> balayage -> calcul | développement | isolement }*
//!          -> résultat (nombre arrondi, booléen, solution, forme symbolique)
//!
//! Contrats :
//! - une opération trouvée par le balayage emprunte la suite ; on en tire une
//!   `Action` possédée avant toute épissure
//! - chaque calcul raccourcit la suite : seuls développements et isolements sont
//!   comptés, au-delà de `limite_iterations` on rend la forme atteinte (pas d'erreur)
//! - un état déjà balayé signe un cycle : ses réécritures ne sont pas comptées,
//!   la garde lève DivergenceBalayage au-delà de `limite_balayage` retours
//! - la démarche (jetons, étapes, chaînes intermédiaires) accompagne le résultat

use std::fmt;
use std::ops::Range;

use log::{debug, warn};

use super::balayage::{trouver_operation, GardeBalayage, Operation, Portee};
use super::calcul::{decrire, evaluer};
use super::erreur::ErreurNoyau;
use super::format::{reconstruire, texte_nombre};
use super::jetons::{format_jetons, tokenize, Cote, Jeton, Monome, Op};
use super::lecture::arrondir;
use super::parens::Suite;
use super::post::{deballer, post_traiter};
use super::reecriture::{deja_isole, developper, isoler, Isolement};
use super::reglages::Reglages;

#[derive(Default, Clone, Debug, PartialEq)]
pub struct Demarche {
    /// Jetons bruts.
    pub jetons: String,
    /// Jetons après post-traitement.
    pub post: String,
    /// Une ligne par calcul ("gauche op droite = résultat"), réécriture ou isolement.
    pub etapes: Vec<String>,
    /// Chaîne reconstruite après chaque étape.
    pub intermediaires: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Resultat {
    /// Arrondi à `Reglages::precision`.
    Nombre(f64),
    Booleen(bool),
    /// "x = 4", "x_1 = 2, x_2 = -2"
    Solution(String),
    /// Forme irréductible (variable libre, fonction d'une variable, limite atteinte).
    Symbolique(String),
}

impl fmt::Display for Resultat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resultat::Nombre(v) => f.write_str(&texte_nombre(*v)),
            Resultat::Booleen(b) => write!(f, "{b}"),
            Resultat::Solution(s) | Resultat::Symbolique(s) => f.write_str(s),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub resultat: Resultat,
    pub demarche: Demarche,
}

impl Evaluation {
    pub fn nombre(&self) -> Option<f64> {
        match self.resultat {
            Resultat::Nombre(v) => Some(v),
            _ => None,
        }
    }
}

/// Ce que le contrôleur fait de l'opération trouvée (indépendant de l'emprunt).
enum Action {
    /// Calcul : le résultat scalaire remplace la plage.
    Calcul {
        plage: Range<usize>,
        resultat: Jeton,
        ligne: String,
    },
    /// Développement ou isolement : compté contre la limite d'itérations.
    Reecriture {
        plage: Range<usize>,
        jetons: Vec<Jeton>,
        ligne: String,
    },
    Racines {
        nom: String,
        racines: Vec<f64>,
    },
    Terminer,
}

/* ------------------------ API ------------------------ */

/// API publique : évalue une expression déjà nettoyée par l'appelant.
pub fn eval_expression(entree: &str, reglages: &Reglages) -> Result<Evaluation, ErreurNoyau> {
    let reglages = reglages.clone().bornes();
    let s = entree.trim();
    if s.is_empty() {
        return Err(ErreurNoyau::EntreeVide);
    }

    let mut demarche = Demarche::default();

    // 1) Jetons
    let jetons = tokenize(s)?;
    demarche.jetons = format_jetons(&jetons);
    debug!("jetons: {}", demarche.jetons);

    // 2) Post-traitement (identités, coalescence, signes, multiplication implicite)
    let mut suite = post_traiter(jetons)?;
    demarche.post = format_jetons(suite.jetons());
    debug!("post-traitement: {}", demarche.post);

    // 3) Réduction
    let mut reecritures = 0usize;
    let mut garde = GardeBalayage::nouvelle(reglages.limite_balayage);
    loop {
        deballer(&mut suite)?;
        let deja_vu = garde.passage(&suite)?;

        let action = match trouver_operation(&suite)? {
            Some(operation) => decider(&suite, &operation)?,
            None => Action::Terminer,
        };

        match action {
            Action::Terminer => {
                let resultat = terminal(suite.jetons(), reglages.precision)?;
                debug!("résultat: {resultat}");
                return Ok(Evaluation { resultat, demarche });
            }

            Action::Racines { nom, racines } => {
                let solution = texte_racines(&nom, &racines, reglages.precision)?;
                debug!("second degré: {solution}");
                demarche.etapes.push(format!("second degré : {solution}"));
                return Ok(Evaluation {
                    resultat: Resultat::Solution(solution),
                    demarche,
                });
            }

            Action::Calcul {
                plage,
                resultat,
                ligne,
            } => {
                debug!("calcul: {ligne}");
                demarche.etapes.push(ligne);
                suite.remplacer(plage, vec![resultat])?;
            }

            Action::Reecriture {
                plage,
                jetons,
                ligne,
            } => {
                if !deja_vu {
                    reecritures += 1;
                }
                if reecritures > reglages.limite_iterations {
                    let partiel = reconstruire(&arrondis(suite.jetons(), reglages.precision)?);
                    warn!(
                        "limite de {} réécritures atteinte, forme partielle: {partiel}",
                        reglages.limite_iterations
                    );
                    return Ok(Evaluation {
                        resultat: Resultat::Symbolique(partiel),
                        demarche,
                    });
                }
                debug!("réécriture {reecritures}: {ligne}");
                demarche.etapes.push(ligne);
                suite.remplacer(plage, jetons)?;
            }
        }

        let etat = reconstruire(suite.jetons());
        debug!("intermédiaire: {etat}");
        demarche.intermediaires.push(etat);
    }
}

/* ------------------------ Décision ------------------------ */

fn texte_plage(suite: &Suite, plage: &Range<usize>) -> String {
    reconstruire(&suite.jetons()[plage.clone()])
}

fn decider(suite: &Suite, o: &Operation<'_>) -> Result<Action, ErreurNoyau> {
    let (g, d) = (o.gauche.as_ref(), o.droite.as_ref());

    let manque = match o.op.cote() {
        Cote::Droite => d.is_none(),
        _ => g.is_none() || d.is_none(),
    };
    if manque {
        return Err(ErreurNoyau::OperandeManquant {
            operateur: o.op.symbole().to_string(),
            cote: if d.is_none() { "à droite" } else { "à gauche" },
        });
    }

    let plage = o.plage();

    // Isolement
    if o.op == Op::Egal && o.a_variable() {
        let (Some(g), Some(d)) = (g, d) else {
            return Err(ErreurNoyau::Structure("'=' sans côtés".into()));
        };
        if deja_isole(g.jetons, d.jetons) {
            return Ok(Action::Terminer);
        }
        return match isoler(g.jetons, d.jetons)? {
            Isolement::Reecrite(jetons) => Ok(Action::Reecriture {
                ligne: format!(
                    "isolement : {} -> {}",
                    texte_plage(suite, &plage),
                    reconstruire(&jetons)
                ),
                plage,
                jetons,
            }),
            Isolement::Racines { nom, racines } => Ok(Action::Racines { nom, racines }),
        };
    }

    // Sous-expression complète : développement, ou forme irréductible
    if o.a_multi() {
        return match (o.op, g, d) {
            (Op::Mul | Op::Div | Op::Frac | Op::Puissance, Some(g), Some(d)) => {
                let jetons = developper(o.op, g.contenu(), d.contenu())?;
                Ok(Action::Reecriture {
                    ligne: format!(
                        "développement : {} -> {}",
                        texte_plage(suite, &plage),
                        reconstruire(&jetons)
                    ),
                    plage,
                    jetons,
                })
            }
            _ => Ok(Action::Terminer),
        };
    }

    // Calcul
    let gs = g.and_then(Portee::scalaire);
    let ds = d.and_then(Portee::scalaire);
    let resultat = evaluer(o.op, gs, ds)?;
    Ok(Action::Calcul {
        ligne: decrire(o.op, gs, ds, &resultat),
        plage,
        resultat,
    })
}

/* ------------------------ Terminal ------------------------ */

fn arrondi_jeton(j: &Jeton, precision: usize) -> Result<Jeton, ErreurNoyau> {
    Ok(match j {
        Jeton::Nombre(v) => Jeton::Nombre(arrondir(*v, precision)?),
        Jeton::Variable(m) => Jeton::Variable(Monome {
            coeff: arrondir(m.coeff, precision)?,
            ..m.clone()
        }),
        autre => autre.clone(),
    })
}

fn arrondis(jetons: &[Jeton], precision: usize) -> Result<Vec<Jeton>, ErreurNoyau> {
    jetons.iter().map(|j| arrondi_jeton(j, precision)).collect()
}

fn terminal(jetons: &[Jeton], precision: usize) -> Result<Resultat, ErreurNoyau> {
    match jetons {
        [Jeton::Nombre(v)] => return Ok(Resultat::Nombre(arrondir(*v, precision)?)),
        [Jeton::Booleen(b)] => return Ok(Resultat::Booleen(*b)),
        _ => {}
    }

    let texte = reconstruire(&arrondis(jetons, precision)?);
    match jetons {
        [g, Jeton::Op(Op::Egal), d]
            if deja_isole(std::slice::from_ref(g), std::slice::from_ref(d)) =>
        {
            Ok(Resultat::Solution(texte))
        }
        _ => Ok(Resultat::Symbolique(texte)),
    }
}

/// "x = r" (racine double) ou "x_1 = r1, x_2 = r2".
fn texte_racines(nom: &str, racines: &[f64], precision: usize) -> Result<String, ErreurNoyau> {
    let valeurs = racines
        .iter()
        .map(|r| arrondir(*r, precision).map(texte_nombre))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(match valeurs.as_slice() {
        [seule] => format!("{nom} = {seule}"),
        _ => valeurs
            .iter()
            .enumerate()
            .map(|(k, v)| format!("{nom}_{} = {v}", k + 1))
            .collect::<Vec<_>>()
            .join(", "),
    })
}
