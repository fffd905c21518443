use crate::error::{MotifError, Result};
use crate::types::MotifCollection;
use log::debug;
use ndarray::{s, Array1, Array2, Axis};
use phf::phf_map;
use std::fs;

/// Pseudocount added to every cell before converting counts to frequencies
pub const PSEUDOCOUNT: f64 = 0.1;
/// Uniform background frequency of each base
pub const BACKGROUND: f64 = 0.25;
/// Default information content cut-off, in bits
pub const DEFAULT_IC_THRESHOLD: f64 = 1.5;
/// Row order of every matrix
pub const BASES: [char; 4] = ['A', 'C', 'G', 'T'];

static BASE_INDEX: phf::Map<char, usize> = phf_map! {
    'A' => 0,
    'C' => 1,
    'G' => 2,
    'T' => 3,
};

/// Returns the matrix row of a nucleotide, case-insensitively
pub fn base_index(base: char) -> Option<usize> {
    BASE_INDEX.get(&base.to_ascii_uppercase()).copied()
}

/// Name given to the `index`-th (1-based) matrix of a file when it has no header
pub fn default_matrix_name(index: usize) -> String {
    format!("Matrix{}", index)
}

/// A transcription factor motif built from a position frequency matrix.
///
/// All derived values (log-odds weights, information content, reverse
/// complement and score bounds) are computed once at construction; a
/// `Motif` is never mutated afterwards, so it can be shared freely between
/// scanning threads.
#[derive(Debug, Clone, PartialEq)]
pub struct Motif {
    name: String,
    /// Raw counts, shape `(4, len)` with rows in A, C, G, T order
    frequencies: Array2<f64>,
    /// Natural-log odds against a uniform background, same shape
    weights: Array2<f64>,
    /// Bits per column
    information_content: Array1<f64>,
    reverse_complement: Array2<f64>,
    min_bind: f64,
    max_bind: f64,
    threshold: Option<f64>,
}

impl Motif {
    /// Creates a motif from four count rows given in A, C, G, T order.
    ///
    /// # Errors
    /// * `MotifError::MalformedMatrix` if the rows differ in length, are
    ///   empty, or contain negative or non-finite counts
    pub fn new(name: impl Into<String>, counts: [Vec<f64>; 4]) -> Result<Self> {
        let rows = counts
            .into_iter()
            .enumerate()
            .map(|(i, row)| (Some(i), row))
            .collect();
        Self::from_rows(name.into(), rows)
    }

    /// Creates a motif from a `(4, len)` count matrix.
    pub fn from_matrix(name: impl Into<String>, frequencies: Array2<f64>) -> Result<Self> {
        if frequencies.nrows() != 4 {
            return Err(MotifError::malformed_matrix(format!(
                "expected 4 rows, found {}",
                frequencies.nrows()
            )));
        }
        if frequencies.ncols() == 0 {
            return Err(MotifError::malformed_matrix("matrix has no columns"));
        }
        if let Some(bad) = frequencies.iter().find(|c| !c.is_finite() || **c < 0.0) {
            return Err(MotifError::malformed_matrix(format!(
                "counts must be finite and non-negative, found {}",
                bad
            )));
        }
        Ok(Self::derive(name.into(), frequencies))
    }

    /// Parses a single headerless PFM block of four rows.
    ///
    /// Rows are either all labelled (`A [ 2 0 1 ]`, `A: 2 0 1`, `A 2 0 1`)
    /// in any order, or all unlabelled and implicitly in A, C, G, T order.
    ///
    /// # Errors
    /// * `MotifError::MalformedMatrix` on the first malformed token or row
    pub fn from_pfm(name: impl Into<String>, text: &str) -> Result<Self> {
        let rows = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .map(|(line_no, line)| {
                if line.starts_with('>') {
                    Err(MotifError::malformed_matrix(format!(
                        "line {}: unexpected header in a single matrix block",
                        line_no
                    )))
                } else {
                    parse_row(line, line_no)
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_rows(name.into(), rows)
    }

    /// Attaches a minimum relative affinity as metadata.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    fn from_rows(name: String, rows: Vec<(Option<usize>, Vec<f64>)>) -> Result<Self> {
        if rows.len() != 4 {
            return Err(MotifError::malformed_matrix(format!(
                "{}: expected 4 rows, found {}",
                name,
                rows.len()
            )));
        }

        let labelled = rows.iter().filter(|(label, _)| label.is_some()).count();
        let mut ordered: [Option<Vec<f64>>; 4] = Default::default();
        match labelled {
            0 => {
                for (slot, (_, row)) in ordered.iter_mut().zip(rows) {
                    *slot = Some(row);
                }
            }
            4 => {
                for (idx, row) in rows
                    .into_iter()
                    .filter_map(|(label, row)| label.map(|idx| (idx, row)))
                {
                    if ordered[idx].is_some() {
                        return Err(MotifError::malformed_matrix(format!(
                            "{}: duplicate row for base {}",
                            name, BASES[idx]
                        )));
                    }
                    ordered[idx] = Some(row);
                }
            }
            _ => {
                return Err(MotifError::malformed_matrix(format!(
                    "{}: rows must be either all labelled or all unlabelled",
                    name
                )))
            }
        }

        let ordered: Vec<Vec<f64>> = ordered.into_iter().flatten().collect();
        let len = ordered[0].len();
        if ordered.iter().any(|row| row.len() != len) {
            let lengths: Vec<String> = ordered
                .iter()
                .zip(BASES)
                .map(|(row, base)| format!("{}={}", base, row.len()))
                .collect();
            return Err(MotifError::malformed_matrix(format!(
                "{}: rows have unequal lengths ({})",
                name,
                lengths.join(", ")
            )));
        }

        let flat: Vec<f64> = ordered.into_iter().flatten().collect();
        let frequencies = Array2::from_shape_vec((4, len), flat)
            .map_err(|e| MotifError::malformed_matrix(format!("{}: {}", name, e)))?;
        Self::from_matrix(name, frequencies)
    }

    fn derive(name: String, frequencies: Array2<f64>) -> Self {
        let totals = frequencies.sum_axis(Axis(0));
        let mut probabilities = frequencies.mapv(|c| c + PSEUDOCOUNT);
        probabilities /= &totals.mapv(|t| t + 4.0 * PSEUDOCOUNT);

        let weights = probabilities.mapv(|p| (p / BACKGROUND).ln());
        let information_content = probabilities.map_axis(Axis(0), |column| {
            2.0 + column.iter().map(|p| p * p.log2()).sum::<f64>()
        });

        // Reversing the ACGT row order swaps A<->T and C<->G.
        let reverse_complement = frequencies.slice(s![..;-1, ..;-1]).to_owned();

        let min_bind = weights
            .fold_axis(Axis(0), f64::INFINITY, |m, &w| m.min(w))
            .sum();
        let max_bind = weights
            .fold_axis(Axis(0), f64::NEG_INFINITY, |m, &w| m.max(w))
            .sum();

        debug!(
            "Motif {}: {} columns, log-odds bounds [{:.4}, {:.4}]",
            name,
            frequencies.ncols(),
            min_bind,
            max_bind
        );

        Self {
            name,
            frequencies,
            weights,
            information_content,
            reverse_complement,
            min_bind,
            max_bind,
            threshold: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of columns in the motif
    pub fn len(&self) -> usize {
        self.frequencies.ncols()
    }

    /// Always false: construction rejects empty matrices
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn frequencies(&self) -> &Array2<f64> {
        &self.frequencies
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    pub fn information_content_vector(&self) -> &Array1<f64> {
        &self.information_content
    }

    /// Counts of the motif read on the opposite strand
    pub fn reverse_complement_frequencies(&self) -> &Array2<f64> {
        &self.reverse_complement
    }

    pub fn min_bind(&self) -> f64 {
        self.min_bind
    }

    pub fn max_bind(&self) -> f64 {
        self.max_bind
    }

    pub fn threshold(&self) -> Option<f64> {
        self.threshold
    }

    /// Builds the opposite-strand motif, named `<name>_rc`.
    pub fn reverse_complement(&self) -> Motif {
        let mut motif = Self::derive(
            format!("{}_rc", self.name),
            self.reverse_complement.clone(),
        );
        motif.threshold = self.threshold;
        motif
    }

    /// Information content of a 1-based column, in bits.
    ///
    /// # Errors
    /// * `MotifError::OutOfRange` if `position` is outside `[1, len]`
    pub fn column_information(&self, position: usize) -> Result<f64> {
        if position == 0 || position > self.len() {
            return Err(MotifError::OutOfRange {
                position,
                length: self.len(),
            });
        }
        Ok(self.information_content[position - 1])
    }

    /// Whether the information content of a 1-based column reaches `threshold` bits.
    ///
    /// Use [`DEFAULT_IC_THRESHOLD`] for the conventional 1.5 bit cut-off.
    ///
    /// # Errors
    /// * `MotifError::OutOfRange` if `position` is outside `[1, len]`
    /// * `MotifError::InvalidThreshold` if `threshold` is outside `[0, 2]`
    pub fn information_content(&self, position: usize, threshold: f64) -> Result<bool> {
        let bits = self.column_information(position)?;
        if !(0.0..=2.0).contains(&threshold) {
            return Err(MotifError::InvalidThreshold(threshold));
        }
        Ok(bits >= threshold)
    }

    /// Sum of the per-column information content
    pub fn total_information(&self) -> f64 {
        self.information_content.sum()
    }

    /// Highest-weight base at every column, ties going to the first of A, C, G, T
    pub fn consensus(&self) -> String {
        self.pick_column_bases(|candidate, best| candidate > best)
    }

    /// Lowest-weight base at every column, ties going to the first of A, C, G, T
    pub fn anti_consensus(&self) -> String {
        self.pick_column_bases(|candidate, best| candidate < best)
    }

    fn pick_column_bases<F>(&self, better: F) -> String
    where
        F: Fn(f64, f64) -> bool,
    {
        self.weights
            .axis_iter(Axis(1))
            .map(|column| {
                let mut best = 0;
                for (i, &w) in column.iter().enumerate().skip(1) {
                    if better(w, column[best]) {
                        best = i;
                    }
                }
                BASES[best]
            })
            .collect()
    }

    /// Summed log-odds weight of a window.
    ///
    /// The window is trimmed and upper-cased first.
    ///
    /// # Errors
    /// * `MotifError::InvalidSequence` on the first symbol outside ACGT (1-based position)
    /// * `MotifError::LengthMismatch` if the window length differs from the motif length
    pub fn log_odds(&self, window: &str) -> Result<f64> {
        let indices = window
            .trim()
            .chars()
            .enumerate()
            .map(|(i, c)| base_index(c).ok_or_else(|| MotifError::invalid_sequence(i + 1, c)))
            .collect::<Result<Vec<_>>>()?;

        if indices.len() != self.len() {
            return Err(MotifError::LengthMismatch {
                expected: self.len(),
                found: indices.len(),
            });
        }

        Ok(indices
            .iter()
            .enumerate()
            .map(|(column, &base)| self.weights[[base, column]])
            .sum())
    }

    /// Relative affinity of a window, normalised so that the anti-consensus
    /// scores 0 and the consensus scores 1.
    ///
    /// # Arguments
    /// * `window` - Exactly `len()` bases; surrounding whitespace and case are ignored
    /// * `linear` - Normalise `exp(log_odds)` instead of the log-odds themselves
    ///
    /// # Errors
    /// * Same as [`Motif::log_odds`]
    ///
    /// A motif whose bounds coincide (every column uniform) scores every
    /// window as 1.0. Scores are clamped to `[0, 1]`.
    pub fn relative_affinity(&self, window: &str, linear: bool) -> Result<f64> {
        let log_odds = self.log_odds(window)?;
        Ok(self.normalize(log_odds, linear))
    }

    pub(crate) fn normalize(&self, log_odds: f64, linear: bool) -> f64 {
        let span = self.max_bind - self.min_bind;
        if span <= 0.0 {
            return 1.0;
        }
        let score = if linear {
            // Shifted by max_bind so long motifs cannot overflow exp().
            let floor = (self.min_bind - self.max_bind).exp();
            ((log_odds - self.max_bind).exp() - floor) / -(self.min_bind - self.max_bind).exp_m1()
        } else {
            (log_odds - self.min_bind) / span
        };
        // Rounding in the summed bounds can push the extremes just outside [0, 1].
        score.clamp(0.0, 1.0)
    }
}

/// Parses one matrix row into an optional base label and its counts.
fn parse_row(line: &str, line_no: usize) -> Result<(Option<usize>, Vec<f64>)> {
    let mut rest = line.trim();
    let mut label = None;

    if let Some(first) = rest.chars().next().filter(|c| c.is_ascii_alphabetic()) {
        let idx = base_index(first).ok_or_else(|| {
            MotifError::malformed_matrix(format!(
                "line {}: unknown row label {:?}",
                line_no, first
            ))
        })?;
        label = Some(idx);
        rest = rest[first.len_utf8()..].trim_start();
        rest = rest.strip_prefix(':').unwrap_or(rest).trim();
    }

    if let Some(inner) = rest.strip_prefix('[') {
        rest = inner.strip_suffix(']').ok_or_else(|| {
            MotifError::malformed_matrix(format!("line {}: unclosed '['", line_no))
        })?;
    } else if rest.ends_with(']') {
        return Err(MotifError::malformed_matrix(format!(
            "line {}: unmatched ']'",
            line_no
        )));
    }

    let counts = rest
        .split_whitespace()
        .map(|token| match token.parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
            _ => Err(MotifError::malformed_matrix(format!(
                "line {}: invalid count {:?}",
                line_no, token
            ))),
        })
        .collect::<Result<Vec<_>>>()?;

    if counts.is_empty() {
        return Err(MotifError::malformed_matrix(format!(
            "line {}: row has no counts",
            line_no
        )));
    }

    Ok((label, counts))
}

/// Parses every matrix in a PFM text.
///
/// Each record is an optional `>NAME` header followed by four rows. Records
/// without a header (or with an empty one) are named after their 1-based
/// position in the text: `Matrix1`, `Matrix2`, and so on.
///
/// # Errors
/// * `MotifError::MalformedMatrix` on the first malformed row or truncated record
/// * `MotifError::InvalidFileFormat` if the text contains no matrix
pub fn parse_motifs(text: &str) -> Result<MotifCollection> {
    let mut motifs = Vec::new();
    let mut header: Option<String> = None;
    let mut rows = Vec::with_capacity(4);

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(name) = line.strip_prefix('>') {
            if header.is_some() || !rows.is_empty() {
                return Err(MotifError::malformed_matrix(format!(
                    "line {}: previous record has {} rows, expected 4",
                    i + 1,
                    rows.len()
                )));
            }
            header = Some(name.trim().to_string());
            continue;
        }

        rows.push(parse_row(line, i + 1)?);
        if rows.len() == 4 {
            let name = header
                .take()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| default_matrix_name(motifs.len() + 1));
            motifs.push(Motif::from_rows(name, std::mem::take(&mut rows))?);
        }
    }

    if header.is_some() || !rows.is_empty() {
        return Err(MotifError::malformed_matrix(format!(
            "last record has {} rows, expected 4",
            rows.len()
        )));
    }
    if motifs.is_empty() {
        return Err(MotifError::InvalidFileFormat("No matrices found".into()));
    }

    debug!("Parsed {} motifs", motifs.len());
    Ok(motifs)
}

/// Reads every matrix of a PFM file, see [`parse_motifs`].
pub fn read_motifs(filename: &str) -> Result<MotifCollection> {
    let text = fs::read_to_string(filename)?;
    parse_motifs(&text)
}
