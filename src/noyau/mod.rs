//! Noyau : évaluateur LaTeX (expressions, équations à une inconnue)
//!
//! Organisation interne :
//! - erreur.rs      : taxonomie des erreurs
//! - jetons.rs      : modèle de jetons + tokenisation
//! - parens.rs      : identités de parenthèses + suite possédée
//! - post.rs        : coalescence, signes, multiplication implicite, déballage
//! - balayage.rs    : priorités + extraction des opérandes
//! - calcul.rs      : arithmétique, trig en degrés, binom, monômes
//! - reecriture.rs  : développement, isolement, second degré
//! - format.rs      : reconstruction LaTeX
//! - lecture.rs     : arrondi décimal exact
//! - reglages.rs    : précision + garde-fous
//! - eval.rs        : boucle de réduction complète

pub mod balayage;
pub mod calcul;
pub mod erreur;
pub mod eval;
pub mod format;
pub mod jetons;
pub mod lecture;
pub mod parens;
pub mod post;
pub mod reecriture;
pub mod reglages;

#[cfg(test)]
mod tests_scientifiques;

#[cfg(test)]
mod tests_fuzz_safe;

// API publique minimale
pub use erreur::ErreurNoyau;
pub use eval::{eval_expression, Demarche, Evaluation, Resultat};
pub use reglages::{ErreurReglages, Reglages};
