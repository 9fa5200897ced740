// src/noyau/jetons.rs
//
// Modèle de jetons + tokenisation.
// - Op : variante fermée par opérateur, porte son côté (arité) et son palier de priorité
// - Jeton : nombre, monôme (coeff·nom^puissance), booléen, opérateur, parenthèse
// - tokenize : balayage gauche -> droite, table d'opérateurs compilée en une alternance

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use super::erreur::ErreurNoyau;

/// Identité d'une paire de parenthèses : (profondeur, rang parmi les sœurs).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParenId {
    pub profondeur: usize,
    pub rang: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sens {
    Ouvrante,
    Fermante,
}

/// Côté(s) où un opérateur prend ses opérandes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cote {
    /// binaire : gauche + droite (+ - * /)
    Deux,
    /// préfixe : un argument à droite (√ sin cos)
    Droite,
    /// deux groupes parenthésés à droite (frac, binom)
    DoubleDroite,
    /// séparateur d'arguments, jamais sélectionné
    Aucun,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Puissance,
    Racine,
    Frac,
    Binom,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Mul,
    Div,
    Plus,
    Moins,
    Inf,
    Sup,
    InfEg,
    SupEg,
    Diff,
    Egal,
    Virgule,
}

impl Op {
    pub fn cote(self) -> Cote {
        use Op::*;
        match self {
            Racine | Sin | Cos | Tan | Asin | Acos | Atan => Cote::Droite,
            Frac | Binom => Cote::DoubleDroite,
            Virgule => Cote::Aucun,
            Puissance | Mul | Div | Plus | Moins | Inf | Sup | InfEg | SupEg | Diff | Egal => {
                Cote::Deux
            }
        }
    }

    /// Palier de priorité (1 = le plus fort). None : jamais exécuté.
    pub fn priorite(self) -> Option<u8> {
        use Op::*;
        let p = match self {
            Puissance | Racine => 1,
            Frac | Binom | Sin | Cos | Tan | Asin | Acos | Atan => 2,
            Mul | Div => 3,
            Plus | Moins => 4,
            Inf | Sup | InfEg | SupEg | Diff => 5,
            Egal => 6,
            Virgule => return None,
        };
        Some(p)
    }

    /// Orthographe LaTeX (relisible par `tokenize`).
    pub fn symbole(self) -> &'static str {
        use Op::*;
        match self {
            Puissance => "^",
            Racine => "\\sqrt",
            Frac => "\\frac",
            Binom => "\\binom",
            Sin => "\\sin",
            Cos => "\\cos",
            Tan => "\\tan",
            Asin => "\\arcsin",
            Acos => "\\arccos",
            Atan => "\\arctan",
            Mul => "*",
            Div => "/",
            Plus => "+",
            Moins => "-",
            Inf => "<",
            Sup => ">",
            InfEg => "\\le",
            SupEg => "\\ge",
            Diff => "\\neq",
            Egal => "=",
            Virgule => ",",
        }
    }

    /// Fonction (préfixe) : possède le groupe qui la suit.
    pub fn est_fonction(self) -> bool {
        matches!(self.cote(), Cote::Droite | Cote::DoubleDroite)
    }

    pub fn est_additif(self) -> bool {
        matches!(self, Op::Plus | Op::Moins)
    }
}

/// Monôme coeff·nom^puissance (comptabilité symbolique minimale).
#[derive(Clone, Debug, PartialEq)]
pub struct Monome {
    pub coeff: f64,
    pub nom: String,
    pub puissance: i32,
}

impl Monome {
    pub fn simple(nom: impl Into<String>) -> Self {
        Self {
            coeff: 1.0,
            nom: nom.into(),
            puissance: 1,
        }
    }

    pub fn semblable(&self, autre: &Monome) -> bool {
        self.nom == autre.nom && self.puissance == autre.puissance
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Jeton {
    Nombre(f64),
    Variable(Monome),
    Booleen(bool),
    Op(Op),
    Paren { sens: Sens, id: Option<ParenId> },
}

impl Jeton {
    pub fn ouvrante() -> Self {
        Jeton::Paren {
            sens: Sens::Ouvrante,
            id: None,
        }
    }

    pub fn fermante() -> Self {
        Jeton::Paren {
            sens: Sens::Fermante,
            id: None,
        }
    }

    pub fn variable(nom: impl Into<String>) -> Self {
        Jeton::Variable(Monome::simple(nom))
    }

    /// Nombre, monôme ou booléen : une valeur scalaire.
    pub fn est_litteral(&self) -> bool {
        matches!(
            self,
            Jeton::Nombre(_) | Jeton::Variable(_) | Jeton::Booleen(_)
        )
    }

    pub fn est_ouvrante(&self) -> bool {
        matches!(
            self,
            Jeton::Paren {
                sens: Sens::Ouvrante,
                ..
            }
        )
    }

    pub fn est_fermante(&self) -> bool {
        matches!(
            self,
            Jeton::Paren {
                sens: Sens::Fermante,
                ..
            }
        )
    }

    pub fn op(&self) -> Option<Op> {
        match self {
            Jeton::Op(o) => Some(*o),
            _ => None,
        }
    }

    pub fn monome(&self) -> Option<&Monome> {
        match self {
            Jeton::Variable(m) => Some(m),
            _ => None,
        }
    }

    pub fn est_negatif(&self) -> bool {
        match self {
            Jeton::Nombre(v) => *v < 0.0,
            Jeton::Variable(m) => m.coeff < 0.0,
            _ => false,
        }
    }

    /// Opposé d'un littéral numérique ; None pour le reste.
    pub fn oppose(&self) -> Option<Jeton> {
        match self {
            Jeton::Nombre(v) => Some(Jeton::Nombre(-v)),
            Jeton::Variable(m) => Some(Jeton::Variable(Monome {
                coeff: -m.coeff,
                ..m.clone()
            })),
            _ => None,
        }
    }
}

/* ------------------------ Table des opérateurs ------------------------ */

#[derive(Clone, Copy, Debug)]
enum Lexeme {
    Op(Op),
    Pi,
    Ouvrante,
    Fermante,
}

/// Orthographes reconnues. Les noms en lettres acceptent un `\` optionnel ;
/// ceux qui commencent déjà par `\` l'exigent.
const TABLE: &[(&str, Lexeme)] = &[
    ("arcsin", Lexeme::Op(Op::Asin)),
    ("arccos", Lexeme::Op(Op::Acos)),
    ("arctan", Lexeme::Op(Op::Atan)),
    ("asin", Lexeme::Op(Op::Asin)),
    ("acos", Lexeme::Op(Op::Acos)),
    ("atan", Lexeme::Op(Op::Atan)),
    ("sin", Lexeme::Op(Op::Sin)),
    ("cos", Lexeme::Op(Op::Cos)),
    ("tan", Lexeme::Op(Op::Tan)),
    ("sqrt", Lexeme::Op(Op::Racine)),
    ("frac", Lexeme::Op(Op::Frac)),
    ("binom", Lexeme::Op(Op::Binom)),
    ("pi", Lexeme::Pi),
    ("\\cdot", Lexeme::Op(Op::Mul)),
    ("\\times", Lexeme::Op(Op::Mul)),
    ("\\div", Lexeme::Op(Op::Div)),
    ("\\leq", Lexeme::Op(Op::InfEg)),
    ("\\geq", Lexeme::Op(Op::SupEg)),
    ("\\le", Lexeme::Op(Op::InfEg)),
    ("\\ge", Lexeme::Op(Op::SupEg)),
    ("\\neq", Lexeme::Op(Op::Diff)),
    ("<=", Lexeme::Op(Op::InfEg)),
    (">=", Lexeme::Op(Op::SupEg)),
    ("!=", Lexeme::Op(Op::Diff)),
    ("√", Lexeme::Op(Op::Racine)),
    ("π", Lexeme::Pi),
    ("·", Lexeme::Op(Op::Mul)),
    ("×", Lexeme::Op(Op::Mul)),
    ("÷", Lexeme::Op(Op::Div)),
    ("+", Lexeme::Op(Op::Plus)),
    ("-", Lexeme::Op(Op::Moins)),
    ("*", Lexeme::Op(Op::Mul)),
    ("/", Lexeme::Op(Op::Div)),
    ("^", Lexeme::Op(Op::Puissance)),
    ("=", Lexeme::Op(Op::Egal)),
    ("<", Lexeme::Op(Op::Inf)),
    (">", Lexeme::Op(Op::Sup)),
    (",", Lexeme::Op(Op::Virgule)),
    ("(", Lexeme::Ouvrante),
    ("{", Lexeme::Ouvrante),
    (")", Lexeme::Fermante),
    ("}", Lexeme::Fermante),
];

struct Lexique {
    symboles: Regex,
    nombre: Regex,
    variable: Regex,
    par_nom: HashMap<String, Lexeme>,
}

fn lexique() -> &'static Lexique {
    static LEXIQUE: OnceLock<Lexique> = OnceLock::new();

    LEXIQUE.get_or_init(|| {
        // le plus long d'abord : "asin" avant "a", "\leq" avant "\le"
        let mut noms: Vec<&str> = TABLE.iter().map(|(n, _)| *n).collect();
        noms.sort_by_key(|n| std::cmp::Reverse(n.chars().count()));

        let alternance: Vec<String> = noms
            .iter()
            .map(|n| {
                if n.starts_with(|c: char| c.is_ascii_alphabetic()) {
                    format!(r"\\?{}", regex::escape(n))
                } else {
                    regex::escape(n)
                }
            })
            .collect();

        let mut par_nom = HashMap::new();
        for (nom, lex) in TABLE {
            par_nom.insert((*nom).to_string(), *lex);
            if nom.starts_with(|c: char| c.is_ascii_alphabetic()) {
                par_nom.insert(format!("\\{nom}"), *lex);
            }
        }

        // Motifs constants : une erreur ici est un bug de la table.
        Lexique {
            symboles: Regex::new(&format!("^(?:{})", alternance.join("|")))
                .expect("alternance d'opérateurs"),
            nombre: Regex::new(r"^[0-9.]+").expect("motif nombre"),
            variable: Regex::new(
                r"^[a-zA-Z]+(?:_(?:\([a-zA-Z0-9]+\)|\{[a-zA-Z0-9]+\}|[a-zA-Z0-9]))?",
            )
            .expect("motif variable"),
            par_nom,
        }
    })
}

/// Tokenize une chaîne déjà nettoyée par l'appelant.
/// Ordre d'essai à chaque position :
/// - opérateur / symbole le plus long de la table
/// - suite maximale de [0-9.] (nombre)
/// - suite de lettres + indice optionnel (variable)
pub fn tokenize(s: &str) -> Result<Vec<Jeton>, ErreurNoyau> {
    let lx = lexique();
    let mut out = Vec::new();
    let mut i = 0usize;

    while i < s.len() {
        let reste = &s[i..];

        if let Some(c) = reste.chars().next() {
            if c.is_whitespace() {
                i += c.len_utf8();
                continue;
            }
        }

        if let Some(m) = lx.symboles.find(reste) {
            let lex = lx
                .par_nom
                .get(m.as_str())
                .copied()
                .ok_or_else(|| ErreurNoyau::Lex {
                    reste: reste.to_string(),
                })?;
            out.push(match lex {
                Lexeme::Op(o) => Jeton::Op(o),
                Lexeme::Pi => Jeton::Nombre(std::f64::consts::PI),
                Lexeme::Ouvrante => Jeton::ouvrante(),
                Lexeme::Fermante => Jeton::fermante(),
            });
            i += m.end();
            continue;
        }

        if let Some(m) = lx.nombre.find(reste) {
            let v: f64 = m.as_str().parse().map_err(|_| ErreurNoyau::Lex {
                reste: reste.to_string(),
            })?;
            if v.is_nan() {
                return Err(ErreurNoyau::Lex {
                    reste: reste.to_string(),
                });
            }
            out.push(Jeton::Nombre(v));
            i += m.end();
            continue;
        }

        if let Some(m) = lx.variable.find(reste) {
            // x_(1), x_{1}, x_1 -> "x_1"
            let nom: String = m
                .as_str()
                .chars()
                .filter(|c| !matches!(c, '(' | ')' | '{' | '}'))
                .collect();
            out.push(Jeton::variable(nom));
            i += m.end();
            continue;
        }

        return Err(ErreurNoyau::Lex {
            reste: reste.to_string(),
        });
    }

    Ok(out)
}

/// Format utilitaire (démarche / journal) : liste de jetons en texte.
pub fn format_jetons(jetons: &[Jeton]) -> String {
    let mut out = Vec::with_capacity(jetons.len());
    for j in jetons {
        let s = match j {
            Jeton::Nombre(v) => format!("{v}"),
            Jeton::Variable(m) => {
                if m.puissance == 1 {
                    format!("{}{}", m.coeff, m.nom)
                } else {
                    format!("{}{}^{}", m.coeff, m.nom, m.puissance)
                }
            }
            Jeton::Booleen(b) => format!("{b}"),
            Jeton::Op(o) => o.symbole().to_string(),
            Jeton::Paren { sens, id } => {
                let c = if *sens == Sens::Ouvrante { "(" } else { ")" };
                match id {
                    Some(id) => format!("{c}{}.{}", id.profondeur, id.rang),
                    None => c.to_string(),
                }
            }
        };
        out.push(s);
    }
    out.join(" ")
}
