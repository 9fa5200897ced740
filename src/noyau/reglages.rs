//! src/noyau/reglages.rs
//!
//! Réglages du moteur (précision d'affichage, garde-fous de boucle).
//!
//! - Valeurs par défaut sûres, surchargeables en JSON (champs absents = défaut).
//! - `bornes()` ramène toute valeur dans son domaine : un réglage ne peut pas
//!   rendre le moteur non terminant.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Décimales conservées à l'affichage.
pub const PRECISION_DEFAUT: usize = 10;

/// Au-delà, l'arrondi ne reflète plus que le bruit du f64.
pub const PRECISION_MAX: usize = 15;

/// Retours sur un état déjà balayé avant DivergenceBalayage.
pub const LIMITE_BALAYAGE_DEFAUT: usize = 200;

/// Réécritures / isolements par évaluation.
pub const LIMITE_ITERATIONS_DEFAUT: usize = 10;

#[derive(Debug, Error)]
pub enum ErreurReglages {
    #[error("réglages illisibles: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reglages {
    pub precision: usize,
    pub limite_balayage: usize,
    pub limite_iterations: usize,
}

impl Default for Reglages {
    fn default() -> Self {
        Self {
            precision: PRECISION_DEFAUT,
            limite_balayage: LIMITE_BALAYAGE_DEFAUT,
            limite_iterations: LIMITE_ITERATIONS_DEFAUT,
        }
    }
}

impl Reglages {
    /// Précision bornée, au moins un retour toléré.
    pub fn bornes(mut self) -> Self {
        self.precision = self.precision.min(PRECISION_MAX);
        self.limite_balayage = self.limite_balayage.max(1);
        self
    }

    pub fn depuis_json(s: &str) -> Result<Self, ErreurReglages> {
        let r: Reglages = serde_json::from_str(s)?;
        Ok(r.bornes())
    }

    pub fn vers_json(&self) -> Result<String, ErreurReglages> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
