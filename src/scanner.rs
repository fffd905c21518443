//! Sliding-window scan of sequences against motifs.
use crate::config::{ScanConfig, Strands};
use crate::error::{MotifError, Result};
use crate::motif::Motif;
use crate::types::{Match, Sequence, Strand};
use log::{debug, trace};
use rayon::prelude::*;

/// Applies a set of motifs to sequences with a fixed configuration.
#[derive(Debug, Clone)]
pub struct Scanner<'m> {
    motifs: &'m [Motif],
    /// Reverse complements, index-aligned with `motifs`; empty for forward-only scans
    reverse: Vec<Motif>,
    config: ScanConfig,
}

impl<'m> Scanner<'m> {
    /// Create a new scanner, deriving reverse-complement motifs if both
    /// strands are requested.
    ///
    /// # Errors
    /// * `MotifError::InvalidParameter` if the configuration is invalid
    pub fn new(motifs: &'m [Motif], config: ScanConfig) -> Result<Self> {
        config.validate()?;
        let reverse = match config.strands {
            Strands::Forward => Vec::new(),
            Strands::Both => motifs.iter().map(Motif::reverse_complement).collect(),
        };
        debug!(
            "Scanner ready: {} motifs, threshold {}, linear {}, strands {:?}",
            motifs.len(),
            config.threshold,
            config.linear,
            config.strands
        );
        Ok(Self {
            motifs,
            reverse,
            config,
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn motifs(&self) -> &[Motif] {
        self.motifs
    }

    /// Lazily scans every motif over every sequence.
    ///
    /// Items come out sequence by sequence, motif by motif, in increasing
    /// offset order. A window that cannot be scored yields an `Err` and the
    /// scan carries on with the next window.
    pub fn scan<'a>(&'a self, sequences: &'a [Sequence]) -> Scan<'a> {
        Scan::new(sequences, self.motifs, &self.reverse, self.config.clone())
    }

    /// Scans (sequence, motif) pairs on the rayon pool.
    ///
    /// Output is identical to collecting [`Scanner::scan`], including the
    /// order of items and truncation at `limit`.
    pub fn scan_parallel(&self, sequences: &[Sequence]) -> Vec<Result<Match>> {
        let pairs: Vec<(usize, usize)> = (0..sequences.len())
            .flat_map(|s| (0..self.motifs.len()).map(move |m| (s, m)))
            .collect();

        let per_pair: Vec<Vec<Result<Match>>> = pairs
            .par_iter()
            .map(|&(s, m)| {
                PairScan::new(
                    &sequences[s],
                    &self.motifs[m],
                    self.reverse.get(m),
                    &self.config,
                )
                .collect()
            })
            .collect();

        let mut results = Vec::new();
        let mut emitted = 0;
        for item in per_pair.into_iter().flatten() {
            if self.config.limit.is_some_and(|limit| emitted >= limit) {
                break;
            }
            if item.is_ok() {
                emitted += 1;
            }
            results.push(item);
        }
        results
    }
}

/// Forward-strand scan with default settings and the given threshold.
///
/// Every window is scored on the linear scale. A NaN threshold matches nothing.
pub fn scan<'a>(sequences: &'a [Sequence], motifs: &'a [Motif], threshold: f64) -> Scan<'a> {
    Scan::new(sequences, motifs, &[], ScanConfig::new(threshold))
}

/// Iterator over the matches of a whole scan, see [`Scanner::scan`].
#[derive(Debug)]
pub struct Scan<'a> {
    sequences: &'a [Sequence],
    motifs: &'a [Motif],
    reverse: &'a [Motif],
    config: ScanConfig,
    seq_idx: usize,
    motif_idx: usize,
    current: Option<PairScan<'a>>,
    emitted: usize,
}

impl<'a> Scan<'a> {
    fn new(
        sequences: &'a [Sequence],
        motifs: &'a [Motif],
        reverse: &'a [Motif],
        config: ScanConfig,
    ) -> Self {
        Self {
            sequences,
            motifs,
            reverse,
            config,
            seq_idx: 0,
            motif_idx: 0,
            current: None,
            emitted: 0,
        }
    }

    /// Number of matches produced so far
    pub fn emitted(&self) -> usize {
        self.emitted
    }
}

impl<'a> Iterator for Scan<'a> {
    type Item = Result<Match>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.config.limit.is_some_and(|limit| self.emitted >= limit) {
            return None;
        }

        loop {
            if let Some(pair) = self.current.as_mut() {
                if let Some(item) = pair.next() {
                    if item.is_ok() {
                        self.emitted += 1;
                    }
                    return Some(item);
                }
                self.current = None;
            }

            let sequence = self.sequences.get(self.seq_idx)?;
            match self.motifs.get(self.motif_idx) {
                Some(motif) => {
                    self.current = Some(PairScan::new(
                        sequence,
                        motif,
                        self.reverse.get(self.motif_idx),
                        &self.config,
                    ));
                    self.motif_idx += 1;
                }
                None => {
                    self.seq_idx += 1;
                    self.motif_idx = 0;
                }
            }
        }
    }
}

/// Windows of one motif over one sequence.
#[derive(Debug)]
struct PairScan<'a> {
    sequence: &'a Sequence,
    motif: &'a Motif,
    reverse: Option<&'a Motif>,
    threshold: f64,
    linear: bool,
    offset: usize,
    next_strand: Strand,
}

impl<'a> PairScan<'a> {
    fn new(
        sequence: &'a Sequence,
        motif: &'a Motif,
        reverse: Option<&'a Motif>,
        config: &ScanConfig,
    ) -> Self {
        trace!(
            "Scanning {} ({} bp) with {} ({} columns)",
            sequence.name,
            sequence.len(),
            motif.name(),
            motif.len()
        );
        Self {
            sequence,
            motif,
            reverse,
            threshold: config.threshold,
            linear: config.linear,
            offset: 0,
            next_strand: Strand::Forward,
        }
    }

    fn window(&self, start: usize) -> Result<&'a str> {
        let range = start..start + self.motif.len();
        self.sequence
            .bases
            .get(range.clone())
            .ok_or_else(|| {
                // Slice falls inside a multi-byte character.
                let bytes = &self.sequence.bases.as_bytes()[range];
                let position = bytes.iter().position(|b| !b.is_ascii()).unwrap_or(0);
                MotifError::invalid_sequence(position + 1, char::REPLACEMENT_CHARACTER)
            })
    }
}

impl<'a> Iterator for PairScan<'a> {
    type Item = Result<Match>;

    fn next(&mut self) -> Option<Self::Item> {
        let width = self.motif.len();
        loop {
            let start = self.offset;
            if start + width > self.sequence.len() {
                return None;
            }

            let strand = self.next_strand;
            let motif = match strand {
                Strand::Forward => self.motif,
                Strand::Reverse => self.reverse.unwrap_or(self.motif),
            };
            if strand == Strand::Forward && self.reverse.is_some() {
                self.next_strand = Strand::Reverse;
            } else {
                self.next_strand = Strand::Forward;
                self.offset += 1;
            }

            let scored = self
                .window(start)
                .and_then(|window| Ok((window, motif.relative_affinity(window, self.linear)?)));
            let (window, score) = match scored {
                Ok(scored) => scored,
                Err(e) => {
                    // Validity does not depend on the strand; skip the reverse pass.
                    self.next_strand = Strand::Forward;
                    self.offset = start + 1;
                    return Some(Err(e.in_window(
                        &self.sequence.name,
                        self.motif.name(),
                        start + 1,
                    )));
                }
            };

            if score >= self.threshold {
                return Some(Ok(Match {
                    sequence: self.sequence.name.clone(),
                    start: start + 1,
                    end: start + width,
                    motif: self.motif.name().to_string(),
                    strand,
                    matched: window.to_string(),
                    score,
                }));
            }
        }
    }
}
