//! Pattern-based string generation.
//!
//! Supported syntax:
//! - `\d` digit, `\a` lowercase letter, `\A` uppercase letter
//! - `\w` word character, `\x` / `\X` lower/upper hex digit
//! - `\s` space, `\n` newline, `\t` tab, `\\` literal backslash
//! - `[abc]`, `[a-z0-9]` one character from the class
//! - `{n}` / `{n,m}` repeat the previous atom, at most 1024 times

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

use crate::adapters::example_provider::Generator;

#[derive(Debug, Clone, PartialEq)]
enum Atom {
    Literal(char),
    OneOf(Vec<char>),
}

impl Atom {
    fn sample(&self, rng: &mut dyn RngCore) -> Option<char> {
        match self {
            Self::Literal(c) => Some(*c),
            Self::OneOf(chars) => chars.choose(rng).copied(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Piece {
    atom: Atom,
    min: usize,
    max: usize,
}

/// A compiled generation pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pieces: Vec<Piece>,
}

impl Pattern {
    pub fn parse(pattern: &str) -> Self {
        let mut pieces: Vec<Piece> = Vec::new();
        let mut chars = pattern.chars().peekable();

        while let Some(ch) = chars.next() {
            let atom = match ch {
                '\\' => match chars.next() {
                    Some(escape) => escaped(escape),
                    None => Atom::Literal('\\'),
                },
                '[' => {
                    let mut class = Vec::new();
                    while let Some(c) = chars.next() {
                        if c == ']' {
                            break;
                        }
                        let mut lookahead = chars.clone();
                        if lookahead.next() == Some('-') {
                            if let Some(end) = lookahead.next().filter(|e| *e != ']') {
                                chars.next();
                                chars.next();
                                class.extend(c..=end);
                                continue;
                            }
                        }
                        class.push(c);
                    }
                    Atom::OneOf(class)
                }
                '{' => {
                    let mut spec = String::new();
                    for c in chars.by_ref() {
                        if c == '}' {
                            break;
                        }
                        spec.push(c);
                    }
                    let (min, max) = repetition(&spec);
                    if let Some(last) = pieces.last_mut() {
                        last.min = min;
                        last.max = max.max(min);
                    }
                    continue;
                }
                other => Atom::Literal(other),
            };
            pieces.push(Piece { atom, min: 1, max: 1 });
        }

        Self { pieces }
    }

    pub fn generate(&self, rng: &mut dyn RngCore) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            let count = if piece.min == piece.max {
                piece.min
            } else {
                rng.gen_range(piece.min..=piece.max)
            };
            for _ in 0..count {
                if let Some(c) = piece.atom.sample(rng) {
                    out.push(c);
                }
            }
        }
        out
    }
}

impl From<Pattern> for Generator {
    fn from(pattern: Pattern) -> Self {
        Generator::from_fn(move |rng| pattern.generate(rng).into())
    }
}

fn escaped(escape: char) -> Atom {
    let class: Vec<char> = match escape {
        'd' => ('0'..='9').collect(),
        'a' => ('a'..='z').collect(),
        'A' => ('A'..='Z').collect(),
        'w' => ('a'..='z')
            .chain('A'..='Z')
            .chain('0'..='9')
            .chain(std::iter::once('_'))
            .collect(),
        'x' => ('0'..='9').chain('a'..='f').collect(),
        'X' => ('0'..='9').chain('A'..='F').collect(),
        's' => return Atom::Literal(' '),
        'n' => return Atom::Literal('\n'),
        't' => return Atom::Literal('\t'),
        other => return Atom::Literal(other),
    };
    Atom::OneOf(class)
}

/// Upper bound on any single repetition count.
const MAX_REPEAT: usize = 1024;

fn repetition(spec: &str) -> (usize, usize) {
    let (min, max) = match spec.split_once(',') {
        Some((min, max)) => {
            let min = min.trim().parse().unwrap_or(1);
            let max = max.trim().parse().unwrap_or(min);
            (min, max)
        }
        None => {
            let n = spec.trim().parse().unwrap_or(1);
            (n, n)
        }
    };
    (min.min(MAX_REPEAT), max.min(MAX_REPEAT))
}
