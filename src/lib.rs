// src/lib.rs
//
// Calculatrice LaTeX : évaluation d'expressions et d'équations à une inconnue.

pub mod noyau;
