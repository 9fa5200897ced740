//! Tests fuzz safe : robustesse + déterminisme + limites contrôlées.
//!
//! But : marteler le pipeline sans brûler la machine.
//! - RNG déterministe (seed fixe)
//! - profondeur bornée
//! - budget temps global
//! - expressions numériques bien formées : seules les erreurs de domaine (Indefini) sont admises
//! - chaînes arbitraires : jamais de panique, toujours une erreur de la taxonomie ou un résultat
//! - invariant clé : un résultat numérique, reconstruit puis réévalué, redonne le même nombre

use std::time::{Duration, Instant};

use super::erreur::ErreurNoyau;
use super::eval::{eval_expression, Resultat};
use super::jetons::{tokenize, Jeton};
use super::parens::assigner_identites;
use super::reglages::Reglages;

/* ------------------------ RNG déterministe minimal ------------------------ */

#[derive(Clone)]
struct Rng {
    state: u64,
}
impl Rng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }
    fn next_u32(&mut self) -> u32 {
        // LCG simple (déterministe)
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u32
    }
    fn pick(&mut self, n: u32) -> u32 {
        if n == 0 {
            0
        } else {
            self.next_u32() % n
        }
    }
    fn coin(&mut self) -> bool {
        (self.next_u32() & 1) == 1
    }
}

/* ------------------------ Budget anti-gel ------------------------ */

fn budget(start: Instant, max: Duration) {
    if start.elapsed() > max {
        panic!("budget temps dépassé: {:?}", max);
    }
}

/* ------------------------ Helpers fuzz ------------------------ */

/// Erreurs *normales* pour une expression numérique bien formée :
/// le domaine des fonctions est volontairement borné (division par zéro, √ négatif,
/// tan(90), binom non entier, dépassement).
fn is_erreur_attendue(e: &ErreurNoyau) -> bool {
    matches!(e, ErreurNoyau::Indefini(_))
}

fn check_aller_retour(expr: &str, v: f64) {
    let relu = Resultat::Nombre(v).to_string();
    match eval_expression(&relu, &Reglages::default()) {
        Ok(ev) => assert_eq!(
            ev.resultat,
            Resultat::Nombre(v),
            "aller-retour: expr={expr:?} relu={relu:?}"
        ),
        Err(e) => panic!("aller-retour: expr={expr:?} relu={relu:?} err={e}"),
    }
}

/* ------------------------ Génération d'expressions (bornée) ------------------------ */

fn gen_nombre(rng: &mut Rng) -> String {
    match rng.pick(10) {
        0 => "0".to_string(),
        1 => "0.5".to_string(),
        2 => "2.25".to_string(),
        3 => "pi".to_string(),
        k => format!("{k}"),
    }
}

fn gen_angle(rng: &mut Rng) -> String {
    let a = match rng.pick(8) {
        0 => 0,
        1 => 30,
        2 => 45,
        3 => 60,
        4 => 90,
        5 => 120,
        6 => 180,
        _ => 270,
    };
    format!("{a}")
}

fn gen_expr(rng: &mut Rng, depth: usize) -> String {
    if depth == 0 {
        return gen_nombre(rng);
    }

    let a = |rng: &mut Rng| gen_expr(rng, depth - 1);

    match rng.pick(12) {
        0 => gen_nombre(rng),
        1 => format!("{}+{}", a(rng), a(rng)),
        2 => format!("{}-{}", a(rng), a(rng)),
        3 => format!("{}*{}", a(rng), a(rng)),
        4 => format!("{}/{}", a(rng), a(rng)),
        5 => format!("({})", a(rng)),
        6 => format!("({})^{}", a(rng), rng.pick(4)),
        7 => {
            let f = ["sin", "\\cos", "tan"][rng.pick(3) as usize];
            if rng.coin() {
                format!("{f}({})", gen_angle(rng))
            } else {
                format!("{f}({})", a(rng))
            }
        }
        8 => format!("\\sqrt{{{}}}", a(rng)),
        9 => format!("\\frac{{{}}}{{{}}}", a(rng), a(rng)),
        10 => format!("frac({},{})", a(rng), a(rng)),
        _ => format!("binom({},{})", rng.pick(9), rng.pick(9)),
    }
}

/// Chaîne arbitraire sur un alphabet proche de la grammaire.
fn gen_bruit(rng: &mut Rng, n: usize) -> String {
    const ALPHABET: &[&str] = &[
        "1", "2", "0", ".", "+", "-", "*", "/", "^", "(", ")", "{", "}", ",", "=", "x", "y",
        "sin", "\\frac", "binom", "\\sqrt", "<", " ",
    ];
    (0..n)
        .map(|_| ALPHABET[rng.pick(ALPHABET.len() as u32) as usize])
        .collect()
}

/* ------------------------ Tests ------------------------ */

#[test]
fn fuzz_safe_numerique_et_aller_retour() {
    let t0 = Instant::now();
    let max = Duration::from_secs(3);

    // Même seed => mêmes expressions => mêmes sorties (déterminisme)
    let mut rng = Rng::new(0xC0FFEE_u64);

    let mut seen_ok = 0usize;
    let mut seen_err = 0usize;

    for _ in 0..150 {
        budget(t0, max);

        let expr = gen_expr(&mut rng, 3);

        match eval_expression(&expr, &Reglages::default()) {
            Ok(ev) => match ev.resultat {
                Resultat::Nombre(v) => {
                    check_aller_retour(&expr, v);
                    seen_ok += 1;
                }
                autre => panic!("nombre attendu: expr={expr:?} obtenu {autre:?}"),
            },
            Err(e) => {
                // On accepte seulement les erreurs de domaine en fuzz numérique.
                assert!(
                    is_erreur_attendue(&e),
                    "erreur non attendue: expr={expr:?} err={e}"
                );
                seen_err += 1;
            }
        }
    }

    // On veut voir surtout des succès, sinon le fuzz ne “balaye” rien.
    assert!(seen_ok > 30, "trop peu de succès: {seen_ok} (erreurs: {seen_err})");
}

#[test]
fn fuzz_safe_determinisme() {
    let mut r1 = Rng::new(42);
    let mut r2 = Rng::new(42);
    for _ in 0..40 {
        let e1 = gen_expr(&mut r1, 3);
        let e2 = gen_expr(&mut r2, 3);
        assert_eq!(e1, e2);
        assert_eq!(
            eval_expression(&e1, &Reglages::default()),
            eval_expression(&e2, &Reglages::default())
        );
    }
}

#[test]
fn fuzz_safe_bruit_sans_panique() {
    let t0 = Instant::now();
    let max = Duration::from_secs(3);

    let mut rng = Rng::new(0xBADC0DE_u64);

    for _ in 0..400 {
        budget(t0, max);

        let n = 1 + rng.pick(12) as usize;
        let expr = gen_bruit(&mut rng, n);

        // résultat ou erreur typée : les deux conviennent, seule une panique échoue
        if let Ok(ev) = eval_expression(&expr, &Reglages::default()) {
            if let Resultat::Nombre(v) = ev.resultat {
                assert!(v.is_finite(), "expr={expr:?} -> {v}");
            }
        }
    }
}

#[test]
fn fuzz_safe_equilibre_parentheses() {
    let mut rng = Rng::new(0x5EED_u64);

    for _ in 0..300 {
        let n = 1 + rng.pick(16) as usize;
        let expr = gen_bruit(&mut rng, n);
        let Ok(mut jetons) = tokenize(&expr) else {
            continue;
        };

        match assigner_identites(&mut jetons) {
            Ok(()) => {
                let ouvrantes = jetons.iter().filter(|j| j.est_ouvrante()).count();
                let fermantes = jetons.iter().filter(|j| j.est_fermante()).count();
                assert_eq!(ouvrantes, fermantes, "expr={expr:?}");
                assert!(jetons
                    .iter()
                    .all(|j| !matches!(j, Jeton::Paren { id: None, .. })));
            }
            Err(e) => assert!(
                matches!(e, ErreurNoyau::ParenthesesDesequilibrees(_)),
                "expr={expr:?} err={e}"
            ),
        }
    }
}
