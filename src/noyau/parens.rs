// src/noyau/parens.rs
//
// Identités de parenthèses + suite de jetons possédée.
//
// Une identité (profondeur, rang) n'est valable que pour l'état courant de la suite :
// toute insertion/suppression la périme. `Suite::remplacer` réassigne donc
// systématiquement après chaque épissure, et les portées d'opérandes empruntent
// la suite (le vérificateur d'emprunt interdit de les garder à travers une mutation).

use std::collections::HashMap;
use std::ops::Range;

use super::erreur::ErreurNoyau;
use super::jetons::{Jeton, ParenId, Sens};

/// Assigne une identité à chaque parenthèse.
/// Ouvrante : id = (profondeur, compteur[profondeur]++) puis profondeur += 1.
/// Fermante : profondeur -= 1 puis id = (profondeur, compteur[profondeur] - 1).
/// Pas de pile explicite : on s'appuie sur un emboîtement bien formé.
pub fn assigner_identites(jetons: &mut [Jeton]) -> Result<(), ErreurNoyau> {
    let mut compteurs: HashMap<usize, usize> = HashMap::new();
    let mut profondeur: usize = 0;

    for j in jetons.iter_mut() {
        let Jeton::Paren { sens, id } = j else {
            continue;
        };

        match sens {
            Sens::Ouvrante => {
                let c = compteurs.entry(profondeur).or_insert(0);
                *id = Some(ParenId {
                    profondeur,
                    rang: *c,
                });
                *c += 1;
                profondeur += 1;
            }
            Sens::Fermante => {
                if profondeur == 0 {
                    return Err(ErreurNoyau::ParenthesesDesequilibrees(
                        "fermante sans ouvrante".into(),
                    ));
                }
                profondeur -= 1;
                let c = compteurs.get(&profondeur).copied().unwrap_or(0);
                if c == 0 {
                    return Err(ErreurNoyau::ParenthesesDesequilibrees(
                        "fermante sans ouvrante".into(),
                    ));
                }
                *id = Some(ParenId {
                    profondeur,
                    rang: c - 1,
                });
            }
        }
    }

    if profondeur != 0 {
        return Err(ErreurNoyau::ParenthesesDesequilibrees(format!(
            "{profondeur} parenthèse(s) non fermée(s)"
        )));
    }
    Ok(())
}

/// L'état courant de l'expression. Seule structure mutée par le moteur ;
/// modifiée par épissure, jamais recopiée en entier.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Suite {
    jetons: Vec<Jeton>,
}

impl Suite {
    pub fn nouvelle(mut jetons: Vec<Jeton>) -> Result<Self, ErreurNoyau> {
        assigner_identites(&mut jetons)?;
        Ok(Self { jetons })
    }

    pub fn jetons(&self) -> &[Jeton] {
        &self.jetons
    }

    pub fn len(&self) -> usize {
        self.jetons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jetons.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Jeton> {
        self.jetons.get(i)
    }

    /// Remplace la plage [debut, fin) par `nouveaux`, puis réassigne les identités.
    pub fn remplacer(
        &mut self,
        plage: Range<usize>,
        nouveaux: Vec<Jeton>,
    ) -> Result<(), ErreurNoyau> {
        if plage.start > plage.end || plage.end > self.jetons.len() {
            return Err(ErreurNoyau::Structure(format!(
                "épissure hors limites: {plage:?} pour {} jetons",
                self.jetons.len()
            )));
        }
        self.jetons.splice(plage, nouveaux);
        assigner_identites(&mut self.jetons)
    }

    /// Modification sur place d'un jeton sans changement de longueur.
    pub fn modifier(&mut self, i: usize, jeton: Jeton) -> Result<(), ErreurNoyau> {
        self.remplacer(i..i + 1, vec![jeton])
    }

    pub fn id(&self, i: usize) -> Result<ParenId, ErreurNoyau> {
        match self.jetons.get(i) {
            Some(Jeton::Paren { id: Some(id), .. }) => Ok(*id),
            Some(Jeton::Paren { id: None, .. }) => Err(ErreurNoyau::Structure(format!(
                "parenthèse {i} sans identité"
            ))),
            _ => Err(ErreurNoyau::Structure(format!(
                "le jeton {i} n'est pas une parenthèse"
            ))),
        }
    }

    /// Indice de la parenthèse jumelle (même identité).
    pub fn partenaire(&self, i: usize) -> Result<usize, ErreurNoyau> {
        let id = self.id(i)?;
        let meme = |j: &Jeton| matches!(j, Jeton::Paren { id: Some(x), .. } if *x == id);

        let trouve = if self.jetons[i].est_ouvrante() {
            (i + 1..self.jetons.len()).find(|&k| self.jetons[k].est_fermante() && meme(&self.jetons[k]))
        } else {
            (0..i)
                .rev()
                .find(|&k| self.jetons[k].est_ouvrante() && meme(&self.jetons[k]))
        };

        trouve.ok_or_else(|| {
            ErreurNoyau::Structure(format!("parenthèse {i} sans jumelle ({id:?})"))
        })
    }

    /// Toutes les paires (ouvrante, fermante), les plus profondes d'abord,
    /// puis de gauche à droite.
    pub fn groupes(&self) -> Result<Vec<(usize, usize, usize)>, ErreurNoyau> {
        let mut out = Vec::new();
        for (i, j) in self.jetons.iter().enumerate() {
            if j.est_ouvrante() {
                let id = self.id(i)?;
                out.push((id.profondeur, i, self.partenaire(i)?));
            }
        }
        out.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        Ok(out)
    }

    pub fn into_jetons(self) -> Vec<Jeton> {
        self.jetons
    }
}
