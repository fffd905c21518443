use crate::error::{MotifError, Result};
use crate::types::Match;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Collects matches into a DataFrame.
///
/// # Returns
/// * `Result<DataFrame>` - One row per match with columns "sequence",
///   "start", "end", "motif", "strand", "matched" and "score"
///
/// # Errors
/// * Returns `MotifError::DataError` if DataFrame creation fails
pub fn to_dataframe(matches: &[Match]) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Column::new(
            "sequence".into(),
            matches.iter().map(|m| m.sequence.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(
            "start".into(),
            matches.iter().map(|m| m.start as u64).collect::<Vec<_>>(),
        ),
        Column::new(
            "end".into(),
            matches.iter().map(|m| m.end as u64).collect::<Vec<_>>(),
        ),
        Column::new(
            "motif".into(),
            matches.iter().map(|m| m.motif.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(
            "strand".into(),
            matches
                .iter()
                .map(|m| m.strand.to_string())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "matched".into(),
            matches.iter().map(|m| m.matched.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(
            "score".into(),
            matches.iter().map(|m| m.score).collect::<Vec<_>>(),
        ),
    ])?;

    Ok(df)
}

/// Writes matches to a table whose format follows the file extension:
/// `.csv`, `.tsv`/`.txt` (tab-separated) or `.parquet`.
///
/// # Errors
/// * Returns `MotifError::InvalidParameter` for any other extension
/// * Returns `MotifError::Io` or `MotifError::DataError` if writing fails
pub fn write_matches(matches: &[Match], filename: &str) -> Result<()> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let separator = match extension.as_str() {
        "csv" => Some(b','),
        "tsv" | "txt" => Some(b'\t'),
        "parquet" => None,
        _ => {
            return Err(MotifError::invalid_parameter(
                "output",
                filename,
                "expected a .csv, .tsv, .txt or .parquet file",
            ))
        }
    };

    let mut df = to_dataframe(matches)?;
    let mut file = File::create(filename)?;
    match separator {
        Some(separator) => {
            CsvWriter::new(&mut file)
                .include_header(true)
                .with_separator(separator)
                .finish(&mut df)?;
        }
        None => {
            ParquetWriter::new(&mut file).finish(&mut df)?;
        }
    }

    Ok(())
}
