// src/noyau/calcul.rs
//
// Évaluateur : opérateur + opérandes scalaires -> jeton résultat.
// - trig en degrés (aller et retour)
// - binom : formule multiplicative itérative (pas de factorielles)
// - monômes : seule comptabilité symbolique (coeff, puissance d'une même base)

use super::erreur::ErreurNoyau;
use super::format::texte_jeton;
use super::jetons::{Cote, Jeton, Monome, Op};

/// Tolérance de l'égalité numérique (`=`, `\neq`).
const EPSILON_EGAL: f64 = 1e-9;

/// Un cosinus plus petit que ça : tan indéfini.
const EPSILON_TAN: f64 = 1e-12;

/// Évalue une opération dont les opérandes sont des scalaires.
/// Pour un opérateur DoubleDroite, `gauche` est le premier argument.
pub fn evaluer(
    op: Op,
    gauche: Option<&Jeton>,
    droite: Option<&Jeton>,
) -> Result<Jeton, ErreurNoyau> {
    let manquant = |cote: &'static str| ErreurNoyau::OperandeManquant {
        operateur: op.symbole().to_string(),
        cote,
    };

    let d = droite.ok_or_else(|| manquant("à droite"))?;
    let g = match op.cote() {
        Cote::Droite => None,
        _ => Some(gauche.ok_or_else(|| manquant("à gauche"))?),
    };

    match (g, d) {
        (None, Jeton::Nombre(x)) => fonction(op, *x),
        (Some(Jeton::Nombre(a)), Jeton::Nombre(b)) => binaire(op, *a, *b),
        (Some(Jeton::Booleen(a)), Jeton::Booleen(b)) => match op {
            Op::Egal => Ok(Jeton::Booleen(a == b)),
            Op::Diff => Ok(Jeton::Booleen(a != b)),
            _ => Err(ErreurNoyau::Structure(format!(
                "'{}' entre deux booléens",
                op.symbole()
            ))),
        },
        (g, d) if g.is_some_and(|j| matches!(j, Jeton::Booleen(_)))
            || matches!(d, Jeton::Booleen(_)) =>
        {
            Err(ErreurNoyau::Structure(format!(
                "booléen dans un calcul '{}'",
                op.symbole()
            )))
        }
        (g, d) => symbolique(op, g, d),
    }
}

fn fini(v: f64, quoi: &str) -> Result<Jeton, ErreurNoyau> {
    if v.is_finite() {
        Ok(Jeton::Nombre(v))
    } else {
        Err(ErreurNoyau::Indefini(quoi.to_string()))
    }
}

/* ------------------------ Numérique ------------------------ */

fn fonction(op: Op, x: f64) -> Result<Jeton, ErreurNoyau> {
    match op {
        Op::Racine => {
            if x < 0.0 {
                return Err(ErreurNoyau::Indefini(format!("√ d'un négatif ({x})")));
            }
            fini(x.sqrt(), "√")
        }
        Op::Sin => fini(x.to_radians().sin(), "sin"),
        Op::Cos => fini(x.to_radians().cos(), "cos"),
        Op::Tan => {
            let r = x.to_radians();
            if r.cos().abs() < EPSILON_TAN {
                return Err(ErreurNoyau::Indefini(format!("tan({x})")));
            }
            fini(r.tan(), "tan")
        }
        Op::Asin | Op::Acos => {
            if !(-1.0..=1.0).contains(&x) {
                return Err(ErreurNoyau::Indefini(format!(
                    "{}({x}) hors de [-1, 1]",
                    op.symbole()
                )));
            }
            let r = if op == Op::Asin { x.asin() } else { x.acos() };
            fini(r.to_degrees(), op.symbole())
        }
        Op::Atan => fini(x.atan().to_degrees(), "arctan"),
        _ => Err(ErreurNoyau::Structure(format!(
            "'{}' n'est pas une fonction",
            op.symbole()
        ))),
    }
}

fn binaire(op: Op, a: f64, b: f64) -> Result<Jeton, ErreurNoyau> {
    match op {
        Op::Plus => fini(a + b, "+"),
        Op::Moins => fini(a - b, "-"),
        Op::Mul => fini(a * b, "*"),
        Op::Div | Op::Frac => {
            if b == 0.0 {
                return Err(ErreurNoyau::Indefini("division par zéro".into()));
            }
            fini(a / b, "/")
        }
        Op::Puissance => fini(a.powf(b), &format!("{a}^{b}")),
        Op::Binom => binom(a, b).map(Jeton::Nombre),
        Op::Inf => Ok(Jeton::Booleen(a < b)),
        Op::Sup => Ok(Jeton::Booleen(a > b)),
        Op::InfEg => Ok(Jeton::Booleen(a <= b)),
        Op::SupEg => Ok(Jeton::Booleen(a >= b)),
        Op::Egal => Ok(Jeton::Booleen((a - b).abs() < EPSILON_EGAL)),
        Op::Diff => Ok(Jeton::Booleen((a - b).abs() >= EPSILON_EGAL)),
        _ => Err(ErreurNoyau::Structure(format!(
            "'{}' n'est pas binaire",
            op.symbole()
        ))),
    }
}

fn entier_naturel(v: f64) -> Option<u64> {
    (v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64).then_some(v as u64)
}

/// C(n, k) par produit itératif : C = Π (n-k+i)/i, i = 1..k.
pub fn binom(n: f64, k: f64) -> Result<f64, ErreurNoyau> {
    let (Some(n), Some(k)) = (entier_naturel(n), entier_naturel(k)) else {
        return Err(ErreurNoyau::Indefini(format!(
            "binom({n}, {k}) : entiers naturels attendus"
        )));
    };
    if k > n {
        return Ok(0.0);
    }
    if k == 0 || k == n {
        return Ok(1.0);
    }
    let k = k.min(n - k);
    let mut acc = 1.0f64;
    for i in 1..=k {
        acc = acc * (n - k + i) as f64 / i as f64;
        if !acc.is_finite() {
            return Err(ErreurNoyau::Indefini(format!("binom({n}, {k}) trop grand")));
        }
    }
    Ok(acc.round())
}

/* ------------------------ Symbolique (monômes) ------------------------ */

/// Monôme normalisé : puissance 0 ou coeff 0 -> nombre.
fn monome(coeff: f64, nom: &str, puissance: i32) -> Jeton {
    if puissance == 0 || coeff == 0.0 {
        return Jeton::Nombre(if puissance == 0 { coeff } else { 0.0 });
    }
    Jeton::Variable(Monome {
        coeff,
        nom: nom.to_string(),
        puissance,
    })
}

fn exposant(p: Option<i32>, nom: &str) -> Result<i32, ErreurNoyau> {
    p.ok_or_else(|| ErreurNoyau::VariableNonSupportee(format!("exposant de {nom} hors limites")))
}

fn symbolique(op: Op, g: Option<&Jeton>, d: &Jeton) -> Result<Jeton, ErreurNoyau> {
    use Jeton::{Nombre, Variable};

    let non_supporte = || {
        ErreurNoyau::VariableNonSupportee(format!(
            "opération '{}' non prise en charge sur une variable",
            op.symbole()
        ))
    };

    match (op, g, d) {
        (Op::Mul, Some(Nombre(c)), Variable(m)) | (Op::Mul, Some(Variable(m)), Nombre(c)) => {
            Ok(monome(m.coeff * c, &m.nom, m.puissance))
        }
        (Op::Mul, Some(Variable(a)), Variable(b)) => {
            if a.nom != b.nom {
                return Err(ErreurNoyau::deux_variables());
            }
            let p = exposant(a.puissance.checked_add(b.puissance), &a.nom)?;
            Ok(monome(a.coeff * b.coeff, &a.nom, p))
        }

        (Op::Div | Op::Frac, Some(Variable(m)), Nombre(c)) => {
            if *c == 0.0 {
                return Err(ErreurNoyau::Indefini("division par zéro".into()));
            }
            Ok(monome(m.coeff / c, &m.nom, m.puissance))
        }
        (Op::Div | Op::Frac, Some(Variable(a)), Variable(b)) => {
            if a.nom != b.nom {
                return Err(ErreurNoyau::deux_variables());
            }
            let p = exposant(a.puissance.checked_sub(b.puissance), &a.nom)?;
            Ok(monome(a.coeff / b.coeff, &a.nom, p))
        }

        (Op::Plus | Op::Moins, Some(Variable(a)), Variable(b)) => {
            if a.nom != b.nom {
                return Err(ErreurNoyau::deux_variables());
            }
            if !a.semblable(b) {
                return Err(non_supporte());
            }
            let c = if op == Op::Plus {
                a.coeff + b.coeff
            } else {
                a.coeff - b.coeff
            };
            Ok(monome(c, &a.nom, a.puissance))
        }

        (Op::Puissance, Some(Variable(m)), Nombre(n)) => {
            if n.fract() != 0.0 || n.abs() > i32::MAX as f64 {
                return Err(ErreurNoyau::VariableNonSupportee(format!(
                    "exposant non entier sur {}",
                    m.nom
                )));
            }
            let n = *n as i32;
            let c = m.coeff.powi(n);
            if !c.is_finite() {
                return Err(ErreurNoyau::Indefini(format!("{}^{n}", m.nom)));
            }
            let p = exposant(m.puissance.checked_mul(n), &m.nom)?;
            Ok(monome(c, &m.nom, p))
        }

        (Op::Racine, None, Variable(m)) if m.puissance % 2 == 0 && m.coeff >= 0.0 => {
            Ok(monome(m.coeff.sqrt(), &m.nom, m.puissance / 2))
        }

        _ => Err(non_supporte()),
    }
}

/// Ligne de démarche : "gauche op droite = résultat".
pub fn decrire(op: Op, g: Option<&Jeton>, d: Option<&Jeton>, r: &Jeton) -> String {
    let t = |j: Option<&Jeton>| j.map(texte_jeton).unwrap_or_default();
    match op.cote() {
        Cote::Droite => format!("{}({}) = {}", op.symbole(), t(d), texte_jeton(r)),
        Cote::DoubleDroite => format!(
            "{}{{{}}}{{{}}} = {}",
            op.symbole(),
            t(g),
            t(d),
            texte_jeton(r)
        ),
        _ => format!("{} {} {} = {}", t(g), op.symbole(), t(d), texte_jeton(r)),
    }
}
