// src/main.rs
//
// Calculatrice LaTeX : hôte minimal (terminal)
// --------------------------------------------
// But:
// - tenir le rôle de l'éditeur hôte : une expression par argument, sinon une par ligne de stdin
// - afficher `entrée -> résultat`, ou l'erreur en ligne à côté de l'entrée non évaluée
// - `--demarche` : affiche aussi les étapes
// - réglages : fichier JSON désigné par CALCULATRICE_REGLAGES (sinon défauts)
//
// Aucune logique de calcul ici : tout passe par noyau::eval_expression.

use std::io::{self, BufRead};

use log::{info, warn};

use calculatrice_latex::noyau::{eval_expression, Reglages};

/// Variable d'environnement : chemin d'un fichier de réglages JSON.
const VAR_REGLAGES: &str = "CALCULATRICE_REGLAGES";

fn charger_reglages() -> Reglages {
    let Ok(chemin) = std::env::var(VAR_REGLAGES) else {
        return Reglages::default();
    };
    let lu = std::fs::read_to_string(&chemin)
        .map_err(|e| e.to_string())
        .and_then(|txt| Reglages::depuis_json(&txt).map_err(|e| e.to_string()));
    match lu {
        Ok(r) => {
            info!("réglages chargés depuis {chemin}");
            r
        }
        Err(e) => {
            warn!("{chemin}: {e} ; réglages par défaut");
            Reglages::default()
        }
    }
}

fn traiter(entree: &str, reglages: &Reglages, demarche: bool) {
    let entree = entree.trim();
    if entree.is_empty() {
        return;
    }
    match eval_expression(entree, reglages) {
        Ok(ev) => {
            println!("{entree} -> {}", ev.resultat);
            if demarche {
                for etape in &ev.demarche.etapes {
                    println!("    {etape}");
                }
            }
        }
        Err(e) => println!("{entree}  [erreur: {e}]"),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let reglages = charger_reglages();

    let mut demarche = false;
    let mut expressions = Vec::new();
    for a in std::env::args().skip(1) {
        if a == "--demarche" {
            demarche = true;
        } else {
            expressions.push(a);
        }
    }

    if !expressions.is_empty() {
        for e in &expressions {
            traiter(e, &reglages, demarche);
        }
        return;
    }

    for ligne in io::stdin().lock().lines() {
        match ligne {
            Ok(l) => traiter(&l, &reglages, demarche),
            Err(e) => {
                warn!("lecture stdin: {e}");
                break;
            }
        }
    }
}
