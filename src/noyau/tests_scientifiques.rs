//! Tests scientifiques (campagne) : propriétés attendues + limites contrôlées.
//!
//! But : vérifier le contrat du noyau de bout en bout, sans faire chauffer la machine.
//! - priorités, trig en degrés, binom aux bornes
//! - isolement (linéaire, second degré), refus explicites
//! - garde-fous (cycle de réécriture, limite de réécritures)
//! - aller-retour : reconstruire puis réévaluer redonne le même scalaire
//!
//! Notes :
//! - les nombres sont arrondis à `precision` (10 par défaut) : sin(30) rend 0.5
//! - un `+`/`-` entre termes de natures différentes reste symbolique (2x+3)

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::balayage::GardeBalayage;
use super::erreur::ErreurNoyau;
use super::eval::{eval_expression, Resultat};
use super::jetons::{tokenize, Jeton, ParenId, Sens};
use super::parens::{assigner_identites, Suite};
use super::reglages::{Reglages, LIMITE_BALAYAGE_DEFAUT};

fn eval_ok(expr: &str) -> Resultat {
    eval_expression(expr, &Reglages::default())
        .unwrap_or_else(|e| panic!("expr={expr:?} err={e}"))
        .resultat
}

fn assert_nombre(expr: &str, attendu: f64) {
    match eval_ok(expr) {
        Resultat::Nombre(v) => assert!(
            (v - attendu).abs() < 1e-9,
            "expr={expr:?} : {v} au lieu de {attendu}"
        ),
        autre => panic!("expr={expr:?} : nombre attendu, obtenu {autre:?}"),
    }
}

fn assert_texte(expr: &str, attendu: &str) {
    assert_eq!(eval_ok(expr).to_string(), attendu, "expr={expr:?}");
}

fn erreur(expr: &str) -> ErreurNoyau {
    match eval_expression(expr, &Reglages::default()) {
        Err(e) => e,
        Ok(ev) => panic!("expr={expr:?} : erreur attendue, obtenu {:?}", ev.resultat),
    }
}

/// Budget global anti-gel.
fn budget(start: Instant, max: Duration) {
    if start.elapsed() > max {
        panic!("budget temps dépassé: {:?}", max);
    }
}

/* ------------------------ Priorités ------------------------ */

#[test]
fn sci_priorites() {
    assert_nombre("2+3*4", 14.0);
    assert_nombre("(2+3)*4", 20.0);
    assert_nombre("2^3+1", 9.0);
    assert_nombre("10-4-3", 3.0);
    assert_nombre("12/3*2", 8.0);
    assert_nombre("-2^2", -4.0);
    assert_nombre("(-2)^2", 4.0);
}

#[test]
fn sci_doubles_parentheses() {
    assert_nombre("((1+2))", 3.0);
    assert_nombre("2*((3+4))", 14.0);
    assert_nombre("((2+3))*4", 20.0);
    assert_nombre("(((5)^3))^1", 125.0);
    // (A)^n passe par ((A)*(A)) puis par un produit développé entre doubles parenthèses
    assert_texte("(x+1)^2", "x^{2}+2x+1");
    assert_texte("3*(x+1)^2", "3x^{2}+6x+3");
}

#[test]
fn sci_multiplication_implicite_et_signes() {
    assert_nombre("2(3+4)", 14.0);
    assert_nombre("(1+1)(2+3)", 10.0);
    assert_nombre("-(2+3)", -5.0);
    assert_nombre("3-(1+2)", 0.0);
    assert_nombre("2*-3", -6.0);
    assert_texte("2pi", "6.2831853072");
}

/* ------------------------ Trig (degrés) ------------------------ */

#[test]
fn sci_trig_degres() {
    assert_nombre("sin(90)", 1.0);
    assert_nombre("cos(180)", -1.0);
    assert_nombre("\\sin{30}", 0.5);
    assert_nombre("tan(45)", 1.0);
    assert_nombre("asin(1)", 90.0);
    assert_nombre("\\arccos(0)", 90.0);
    assert_nombre("2sin(30)", 1.0);
    assert_nombre("sin(30)^2", 0.25);
}

#[test]
fn sci_indefinis() {
    for expr in ["tan(90)", "1/0", "\\sqrt(-4)", "asin(2)", "frac(1,0)"] {
        assert!(
            matches!(erreur(expr), ErreurNoyau::Indefini(_)),
            "expr={expr:?}"
        );
    }
}

/* ------------------------ Fractions, racines, binom ------------------------ */

#[test]
fn sci_fractions_et_racines() {
    assert_nombre("\\frac{1}{4}", 0.25);
    assert_nombre("frac(3,4)+1", 1.75);
    assert_nombre("\\frac{1+2}{2*3}", 0.5);
    assert_nombre("\\sqrt{16}+1", 5.0);
    assert_nombre("2\\frac{1}{2}", 1.0);
}

#[test]
fn sci_binom_bornes() {
    assert_nombre("binom(5,0)", 1.0);
    assert_nombre("binom(5,5)", 1.0);
    assert_nombre("binom(5,6)", 0.0);
    assert_nombre("\\binom{5}{2}", 10.0);
    assert!(matches!(erreur("binom(2.5,1)"), ErreurNoyau::Indefini(_)));
}

#[test]
fn sci_relations() {
    assert_eq!(eval_ok("2<3"), Resultat::Booleen(true));
    assert_eq!(eval_ok("2\\ge3"), Resultat::Booleen(false));
    assert_eq!(eval_ok("1+1=2"), Resultat::Booleen(true));
    assert_eq!(eval_ok("1\\neq1"), Resultat::Booleen(false));
    assert_eq!(eval_ok("(1<2)\\neq(3>4)"), Resultat::Booleen(true));
    assert!(matches!(erreur("1<2<3"), ErreurNoyau::Structure(_)));
}

/* ------------------------ Symbolique + isolement ------------------------ */

#[test]
fn sci_monomes() {
    assert_texte("2x+3x", "5x");
    assert_texte("x^2+x^2", "2x^{2}");
    assert_texte("\\sqrt(4x^2)", "2x");
    assert_texte("6x/3", "2x");
}

#[test]
fn sci_isolement_lineaire() {
    assert_eq!(eval_ok("2*x=8"), Resultat::Solution("x = 4".into()));
    assert_texte("3x-2=x+6", "x = 4");
    assert_texte("4=2y", "y = 2");
    assert_texte("\\frac{x+1}{2}=3", "x = 5");
    assert_texte("x_1+1=3", "x_1 = 2");
}

#[test]
fn sci_second_degre() {
    assert_texte("x^2=4", "x_1 = 2, x_2 = -2");
    assert_texte("(x+1)^2=0", "x = -1");
    assert_texte("x^2-5x+6=0", "x_1 = 3, x_2 = 2");
}

#[test]
fn sci_refus_explicites() {
    assert_eq!(erreur("x+y=5"), ErreurNoyau::deux_variables());
    assert!(matches!(erreur("x*y"), ErreurNoyau::VariableNonSupportee(_)));
    assert!(matches!(erreur("x^3=8"), ErreurNoyau::VariableNonSupportee(_)));
    assert!(matches!(erreur("x=1=2"), ErreurNoyau::VariableNonSupportee(_)));
}

#[test]
fn sci_taxonomie_erreurs() {
    assert!(matches!(erreur("2 $ 3"), ErreurNoyau::Lex { .. }));
    assert!(matches!(erreur("(1+2"), ErreurNoyau::ParenthesesDesequilibrees(_)));
    assert!(matches!(erreur("1+2)"), ErreurNoyau::ParenthesesDesequilibrees(_)));
    assert!(matches!(erreur("1,2"), ErreurNoyau::Structure(_)));
    assert!(matches!(erreur("2+()"), ErreurNoyau::Structure(_)));
    assert!(matches!(erreur("3*"), ErreurNoyau::OperandeManquant { .. }));
    assert!(matches!(erreur("=4"), ErreurNoyau::OperandeManquant { .. }));
    assert_eq!(erreur(""), ErreurNoyau::EntreeVide);
}

/* ------------------------ Garde-fous ------------------------ */

#[test]
fn sci_balayage_divergent() {
    let t0 = Instant::now();

    // réécriture mal formée qui défait la précédente : x = 2 -> 2 = x -> x = 2 …
    let mut suite = Suite::nouvelle(tokenize("x=2").unwrap()).unwrap();
    let mut garde = GardeBalayage::nouvelle(Reglages::default().limite_balayage);
    let e = loop {
        budget(t0, Duration::from_millis(500));
        if let Err(e) = garde.passage(&suite) {
            break e;
        }
        let mut inverse = suite.jetons().to_vec();
        inverse.reverse();
        let n = suite.len();
        suite.remplacer(0..n, inverse).unwrap();
    };

    assert_eq!(
        e,
        ErreurNoyau::DivergenceBalayage {
            limite: LIMITE_BALAYAGE_DEFAUT
        }
    );
    assert_eq!(garde.retours(), LIMITE_BALAYAGE_DEFAUT + 1);
}

#[test]
fn sci_balayage_sans_limite_de_taille() {
    let t0 = Instant::now();

    // 200 groupes irréductibles : forme symbolique, pas de divergence
    let expr = vec!["sin(x)"; 200].join("+");
    match eval_ok(&expr) {
        Resultat::Symbolique(s) => assert_eq!(s.matches("sin").count(), 200, "{s}"),
        autre => panic!("forme symbolique attendue, obtenu {autre:?}"),
    }
    budget(t0, Duration::from_secs(2));
}

#[test]
fn sci_limite_reecritures_non_fatale() {
    let r = Reglages {
        limite_iterations: 1,
        ..Reglages::default()
    };
    // isolement en trois temps : la limite coupe au deuxième
    match eval_expression("2x+3=7", &r).unwrap().resultat {
        Resultat::Symbolique(s) => assert_eq!(s, "2x = 4"),
        autre => panic!("forme partielle attendue, obtenu {autre:?}"),
    }
}

/* ------------------------ Aller-retour ------------------------ */

#[test]
fn sci_aller_retour_final() {
    for expr in [
        "2+3*4",
        "1/3",
        "-7/4",
        "sin(30)+cos(60)",
        "\\sqrt{2}",
        "binom(10,3)/7",
        "2^10-0.5",
    ] {
        let v = eval_ok(expr);
        let relu = eval_ok(&v.to_string());
        assert_eq!(relu, v, "expr={expr:?}");
    }
}

#[test]
fn sci_aller_retour_intermediaires() {
    let ev = eval_expression("(2+3)*4-6/2", &Reglages::default()).unwrap();
    assert_eq!(ev.resultat, Resultat::Nombre(17.0));
    assert_eq!(ev.demarche.intermediaires.len(), 4);
    for s in &ev.demarche.intermediaires {
        assert_nombre(s, 17.0);
    }
}

/* ------------------------ Parenthèses ------------------------ */

#[test]
fn sci_equilibre_parentheses() {
    for expr in ["((1)(2))(3)", "\\frac{(1+2)}{3}", "binom(5,2)*(1+(2*(3)))"] {
        let mut j = tokenize(expr).unwrap();
        assigner_identites(&mut j).unwrap();

        let mut par_id: HashMap<ParenId, (usize, usize)> = HashMap::new();
        for t in &j {
            if let Jeton::Paren { sens, id: Some(id) } = t {
                let e = par_id.entry(*id).or_default();
                match sens {
                    Sens::Ouvrante => e.0 += 1,
                    Sens::Fermante => e.1 += 1,
                }
            }
        }
        assert!(
            par_id.values().all(|&c| c == (1, 1)),
            "expr={expr:?} : {par_id:?}"
        );
    }
}

/* ------------------------ Stress contrôlé ------------------------ */

#[test]
fn sci_stress_somme() {
    let t0 = Instant::now();
    let max = Duration::from_secs(2);

    let mut expr = String::new();
    for k in 0..80 {
        if k > 0 {
            expr.push_str(" + ");
        }
        expr.push_str("1/2");
        budget(t0, max);
    }
    assert_nombre(&expr, 40.0);
    budget(t0, max);
}

#[test]
fn sci_stress_imbrication() {
    let t0 = Instant::now();
    let max = Duration::from_secs(2);

    // √(…(4)^2…) : reste un carré parfait à chaque niveau
    let mut expr = "4".to_string();
    for k in 0..30 {
        expr = if k % 2 == 0 {
            format!("\\sqrt({expr})")
        } else {
            format!("({expr})^2")
        };
        budget(t0, max);
    }
    assert_nombre(&expr, 4.0);
    budget(t0, max);
}
