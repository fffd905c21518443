use crate::error::{MotifError, Result};
use crate::types::{Sequence, SequenceCollection};
use log::debug;
use phf::phf_map;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};

/// Name given to bases that appear before any `>` header
pub const DEFAULT_SEQUENCE_NAME: &str = "SEQUENCE";

static COMPLEMENT: phf::Map<char, char> = phf_map! {
    'A' => 'T',
    'T' => 'A',
    'C' => 'G',
    'G' => 'C',
};

fn parse_lines<I>(lines: I) -> Result<SequenceCollection>
where
    I: Iterator<Item = io::Result<String>>,
{
    let mut sequences: SequenceCollection = Vec::new();
    let mut current: Option<Sequence> = None;

    for line in lines {
        let line = line?;
        let line = line.trim();

        if let Some(header) = line.strip_prefix('>') {
            if let Some(done) = current.take() {
                sequences.push(done);
            }
            let name = match header.trim() {
                "" => DEFAULT_SEQUENCE_NAME,
                name => name,
            };
            current = Some(Sequence::new(name, String::new()));
        } else if !line.is_empty() {
            let sequence =
                current.get_or_insert_with(|| Sequence::new(DEFAULT_SEQUENCE_NAME, String::new()));
            sequence.bases.extend(
                line.chars()
                    .filter(|c| !c.is_whitespace())
                    .map(|c| c.to_ascii_uppercase()),
            );
        }
    }

    if let Some(done) = current {
        sequences.push(done);
    }

    if sequences.is_empty() {
        return Err(MotifError::InvalidFileFormat("No sequences found".into()));
    }

    debug!("Parsed {} sequences", sequences.len());
    Ok(sequences)
}

/// Parses FASTA-like text into sequences, preserving file order.
///
/// Lines starting with `>` open a new record named by the rest of the line.
/// Subsequent non-empty lines are concatenated, upper-cased, with all
/// whitespace removed. Bases before the first header belong to a record named
/// [`DEFAULT_SEQUENCE_NAME`]. Duplicate names are kept as separate records.
///
/// # Errors
/// * Returns `MotifError::InvalidFileFormat` if no sequences are found
pub fn parse_fasta(text: &str) -> Result<SequenceCollection> {
    parse_lines(text.lines().map(|line| Ok(line.to_string())))
}

/// Reads sequences from a FASTA format file.
///
/// # Arguments
/// * `filename` - Path to the FASTA file to read
///
/// # Returns
/// * `Result<SequenceCollection>` - Sequences in file order, see [`parse_fasta`]
///
/// # Errors
/// * Returns `MotifError::InvalidFileFormat` if no sequences are found
/// * Returns `MotifError::Io` for file reading issues
pub fn read_fasta(filename: &str) -> Result<SequenceCollection> {
    let file = File::open(filename)?;
    let reader = BufReader::new(file);
    parse_lines(reader.lines())
}

/// Writes sequences to a FASTA format file, one line of bases per record.
///
/// # Errors
/// * Returns `MotifError::Io` for file writing issues
pub fn write_fasta(sequences: &[Sequence], filename: &str) -> Result<()> {
    let mut file = File::create(filename)?;

    for sequence in sequences {
        writeln!(file, ">{}", sequence.name)?;
        writeln!(file, "{}", sequence.bases)?;
    }

    Ok(())
}

/// Generates the reverse complement of a DNA sequence.
///
/// # Returns
/// * `Result<String>` - The upper-case reverse complement (A ↔ T, C ↔ G)
///
/// # Errors
/// * Returns `MotifError::InvalidSequence` with the 1-based position of the
///   first character other than A, C, G or T
pub fn reverse_complement(sequence: &str) -> Result<String> {
    let complemented = sequence
        .chars()
        .enumerate()
        .map(|(i, c)| {
            COMPLEMENT
                .get(&c.to_ascii_uppercase())
                .copied()
                .ok_or_else(|| MotifError::invalid_sequence(i + 1, c))
        })
        .collect::<Result<Vec<char>>>()?;
    Ok(complemented.into_iter().rev().collect())
}

/// Fraction of G and C bases in a sequence, 0.0 for an empty one
pub fn gc_content(sequence: &Sequence) -> f64 {
    if sequence.is_empty() {
        return 0.0;
    }
    let gc_count = sequence
        .bases
        .chars()
        .filter(|&c| c == 'G' || c == 'C')
        .count() as f64;
    gc_count / sequence.len() as f64
}
