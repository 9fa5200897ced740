// src/noyau/lecture.rs
//
// Lecture décimale des résultats : arrondi exact à `digits` décimales.
// f64 -> rationnel exact (BigRational) -> entier “scalé” (×10^digits) -> texte.
// Aucun passage par v * 10^digits en flottant : 1.005 s'arrondit sur sa vraie valeur binaire.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, Zero};

use super::erreur::ErreurNoyau;

/* ------------------------ Décimal (scaled -> texte) ------------------------ */

fn pow10(n: usize) -> BigInt {
    BigInt::from(10).pow(n as u32)
}

/// Convertit un entier “scalé” (×10^digits) en texte décimal.
pub fn scaled_to_decimal(mut scaled: BigInt, digits: usize) -> String {
    let neg = scaled.is_negative();
    if neg {
        scaled = -scaled;
    }

    let scale = pow10(digits);
    let int_part = &scaled / &scale;
    let frac_part = &scaled % &scale;

    if digits == 0 {
        return if neg {
            format!("-{int_part}")
        } else {
            format!("{int_part}")
        };
    }

    let mut frac = frac_part.to_str_radix(10);
    while frac.len() < digits {
        frac.insert(0, '0');
    }

    if neg {
        format!("-{int_part}.{frac}")
    } else {
        format!("{int_part}.{frac}")
    }
}

/// r -> entier “scalé” = round(r * 10^digits), demi-unité loin de zéro.
fn rational_scaled(r: &BigRational, digits: usize) -> BigInt {
    let scale = BigRational::from_integer(pow10(digits));
    (r * scale).round().to_integer()
}

/// "2.500" -> "2.5", "3.000" -> "3", "-0.000" -> "0"
fn epurer(mut s: String) -> String {
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

/* ------------------------ API ------------------------ */

/// Texte décimal de `v` arrondi à `digits` décimales, zéros finaux retirés.
pub fn format_decimal(v: f64, digits: usize) -> Result<String, ErreurNoyau> {
    let r = BigRational::from_float(v)
        .ok_or_else(|| ErreurNoyau::Indefini(format!("valeur non finie: {v}")))?;
    let scaled = rational_scaled(&r, digits);
    if scaled.is_zero() {
        return Ok("0".to_string());
    }
    Ok(epurer(scaled_to_decimal(scaled, digits)))
}

/// `v` arrondi à `digits` décimales (pour les jetons affichés).
pub fn arrondir(v: f64, digits: usize) -> Result<f64, ErreurNoyau> {
    let txt = format_decimal(v, digits)?;
    txt.parse::<f64>()
        .map_err(|_| ErreurNoyau::Indefini(format!("lecture décimale illisible: {txt}")))
}
