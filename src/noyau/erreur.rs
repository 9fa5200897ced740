// src/noyau/erreur.rs
//
// Taxonomie des erreurs du noyau.
// Toutes remontent telles quelles à l'appelant : aucune reprise interne.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErreurNoyau {
    #[error("Entrée vide")]
    EntreeVide,

    /// Caractère (ou suite) non reconnu par la tokenisation.
    #[error("caractère inattendu: '{reste}'")]
    Lex { reste: String },

    #[error("parenthèses déséquilibrées: {0}")]
    ParenthesesDesequilibrees(String),

    /// Invariant du post-traitement violé (paren sans identité, groupe vide…).
    #[error("structure invalide: {0}")]
    Structure(String),

    #[error("opérande manquant {cote} de '{operateur}'")]
    OperandeManquant {
        operateur: String,
        cote: &'static str,
    },

    #[error("{0}")]
    VariableNonSupportee(String),

    #[error("balayage divergent: plus de {limite} retours sur un état déjà vu")]
    DivergenceBalayage { limite: usize },

    /// Résultat numérique sans valeur (division par zéro, √ négatif, tan(90)…).
    #[error("indéfini: {0}")]
    Indefini(String),
}

impl ErreurNoyau {
    pub fn deux_variables() -> Self {
        ErreurNoyau::VariableNonSupportee(
            "les équations à deux variables ne sont pas encore prises en charge".into(),
        )
    }
}
