//! Relative-affinity scanning of DNA sequences against transcription factor
//! position frequency matrices

pub mod config;
pub mod error;
pub mod fasta;
pub mod motif;
pub mod report;
pub mod scanner;
pub mod types;

pub use config::{ScanConfig, Strands};
pub use error::{MotifError, Result};
pub use motif::Motif;
pub use scanner::{scan, Scan, Scanner};
pub use types::{Match, Sequence, Strand};
