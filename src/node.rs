// src/node.rs - parsed command nodes and their raw parameter words
use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("parameter {letter} has non-numeric value '{token}'")]
    Malformed { letter: char, token: String },
}

/// Letter-keyed raw parameter words of one command. Tokens stay textual
/// until a handler asks for a number, so "absent" and "malformed" remain
/// distinguishable outcomes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSet {
    words: BTreeMap<char, String>,
}

impl ParamSet {
    pub fn insert(&mut self, letter: char, token: impl Into<String>) {
        self.words.insert(letter.to_ascii_uppercase(), token.into());
    }

    pub fn remove(&mut self, letter: char) -> Option<String> {
        self.words.remove(&letter.to_ascii_uppercase())
    }

    pub fn contains(&self, letter: char) -> bool {
        self.words.contains_key(&letter.to_ascii_uppercase())
    }

    pub fn raw(&self, letter: char) -> Option<&str> {
        self.words.get(&letter.to_ascii_uppercase()).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, &str)> + '_ {
        self.words.iter().map(|(letter, token)| (*letter, token.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Parse one word as a number. `Ok(None)` means the letter was not
    /// given at all; a present but non-numeric token is an error.
    pub fn numeric(&self, letter: char) -> Result<Option<f64>, ParamError> {
        match self.words.get(&letter.to_ascii_uppercase()) {
            None => Ok(None),
            Some(token) => token
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| ParamError::Malformed {
                    letter: letter.to_ascii_uppercase(),
                    token: token.clone(),
                }),
        }
    }

    /// Legacy accessor matching the historical interpreter, where a missing
    /// or unparseable token silently read as zero. The interpreter itself
    /// goes through [`ParamSet::numeric`]; this exists for consumers that
    /// still depend on the old contract.
    pub fn numeric_or_zero(&self, letter: char) -> f64 {
        self.numeric(letter).ok().flatten().unwrap_or(0.0)
    }
}

/// One parsed instruction: its command words, raw parameters, source line
/// and owning canal. The parameter set is the only part a handler may
/// rewrite (the G28 auxiliary-letter remap).
#[derive(Debug, Clone, PartialEq)]
pub struct CommandNode {
    pub codes: Vec<String>,
    pub params: ParamSet,
    pub line: u32,
    pub canal: usize,
}

impl CommandNode {
    pub fn new(codes: Vec<String>, params: ParamSet, line: u32, canal: usize) -> Self {
        Self { codes, params, line, canal }
    }

    /// Whether this node carries the given command word, ignoring case and
    /// leading zeros ("G04" matches "G4").
    pub fn has_code(&self, code: &str) -> bool {
        self.codes.iter().any(|own| codes_equal(own, code))
    }
}

impl fmt::Display for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for code in &self.codes {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{code}")?;
            first = false;
        }
        for (letter, token) in self.params.iter() {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{letter}{token}")?;
            first = false;
        }
        if first {
            write!(f, "(empty)")?;
        }
        Ok(())
    }
}

/// Split a command word into its letter and numeric part ("G04" -> ('G', 4)).
pub fn split_code(code: &str) -> Option<(char, u32)> {
    let mut chars = code.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let number: u32 = chars.as_str().parse().ok()?;
    Some((letter, number))
}

fn codes_equal(a: &str, b: &str) -> bool {
    match (split_code(a), split_code(b)) {
        (Some(left), Some(right)) => left == right,
        _ => a.eq_ignore_ascii_case(b),
    }
}
