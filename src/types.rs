use serde::{Deserialize, Serialize};
use std::fmt;

use crate::motif::Motif;

/// Ordered collection of motifs, in the order they were read
pub type MotifCollection = Vec<Motif>;

/// Ordered collection of named sequences, in file order
pub type SequenceCollection = Vec<Sequence>;

/// A named DNA sequence, upper-cased and free of whitespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    pub name: String,
    pub bases: String,
}

impl Sequence {
    pub fn new(name: impl Into<String>, bases: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bases: bases.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }
}

/// DNA strand a match was scored on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strand {
    #[serde(rename = "+")]
    Forward,
    #[serde(rename = "-")]
    Reverse,
}

impl Strand {
    pub fn symbol(&self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A window whose relative affinity reached the scan threshold.
///
/// `start` and `end` are 1-based and inclusive. `matched` is always the
/// forward-strand substring, even for reverse-strand hits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub sequence: String,
    pub start: usize,
    pub end: usize,
    pub motif: String,
    pub strand: Strand,
    pub matched: String,
    pub score: f64,
}

/// Tab-separated record: sequence, start, end, motif, substring, score
impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.sequence, self.start, self.end, self.motif, self.matched, self.score
        )
    }
}
