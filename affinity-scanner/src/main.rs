use clap::Parser;
use log::{info, warn, LevelFilter};
use std::io::{self, BufWriter, Write};
use tfbs_affinity::fasta::read_fasta;
use tfbs_affinity::motif::read_motifs;
use tfbs_affinity::report::write_matches;
use tfbs_affinity::{Match, MotifError, ScanConfig, Scanner, Strands};

#[derive(thiserror::Error, Debug)]
pub enum ScannerError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Motif(#[from] MotifError),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Parser)]
#[command(
    name = "affinity-scanner",
    about = "Reports every window of a set of DNA sequences whose relative affinity for a motif reaches a threshold",
    long_about = "Scores every window of each input sequence against each position frequency matrix. \
                  Matrices are converted to log-odds weights against a uniform background and window \
                  scores are normalised between the weakest (0) and strongest (1) possible site. \
                  Matches are written tab-separated: sequence, start, end, motif, site, score.",
    version,
    after_help = "Example usage:\n    \
                  affinity-scanner promoters.fa motifs.pfm 0.8\n    \
                  affinity-scanner promoters.fa motifs.pfm 0.5 --both-strands --output hits.parquet",
    color = clap::ColorChoice::Auto
)]
#[derive(Debug)]
struct Args {
    /// Path to FASTA-like sequence file
    #[arg(value_name = "SEQUENCES")]
    sequences: String,

    /// Path to position frequency matrix file
    /// (optional `>NAME` header followed by rows A, C, G and T)
    #[arg(value_name = "MOTIFS")]
    motifs: String,

    /// Minimum relative affinity, between 0 and 1
    #[arg(value_name = "THRESHOLD", default_value_t = 0.0)]
    threshold: f64,

    /// Normalise log-odds scores instead of linear affinities
    #[arg(long)]
    log_scale: bool,

    /// Also score the reverse complement of every motif
    #[arg(long)]
    both_strands: bool,

    /// Stop after this many matches
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// Write matches to a .csv, .tsv or .parquet file instead of stdout
    #[arg(long, short, value_name = "FILE")]
    output: Option<String>,

    /// Number of worker threads; above 1 the scan runs in parallel
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn scan_config(&self) -> ScanConfig {
        let mut config = ScanConfig::new(self.threshold)
            .with_linear(!self.log_scale)
            .with_strands(if self.both_strands {
                Strands::Both
            } else {
                Strands::Forward
            });
        config.limit = self.limit;
        config
    }

    fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// One output line; the strand column is only present for two-strand scans
fn format_record(m: &Match, with_strand: bool) -> String {
    if with_strand {
        format!("{}\t{}", m, m.strand)
    } else {
        m.to_string()
    }
}

fn main() -> Result<(), ScannerError> {
    let start_time = std::time::Instant::now();

    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.log_level())
        .parse_default_env()
        .init();

    let sequences = read_fasta(&args.sequences)?;
    let motifs = read_motifs(&args.motifs)?;
    info!(
        "{} sequences and {} motifs to scan",
        sequences.len(),
        motifs.len()
    );

    let config = args.scan_config();
    let with_strand = config.strands == Strands::Both;
    let scanner = Scanner::new(&motifs, config)?;

    let mut skipped = 0usize;
    let mut report = |item: Result<Match, MotifError>| match item {
        Ok(m) => Some(m),
        Err(e) => {
            warn!("Skipping window: {}", e);
            skipped += 1;
            None
        }
    };

    let mut found = 0usize;
    if args.threads > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .build()?;
        let matches: Vec<Match> = pool
            .install(|| scanner.scan_parallel(&sequences))
            .into_iter()
            .filter_map(&mut report)
            .collect();
        found = matches.len();
        emit(&matches, args.output.as_deref(), with_strand)?;
    } else if let Some(output) = args.output.as_deref() {
        let matches: Vec<Match> = scanner.scan(&sequences).filter_map(&mut report).collect();
        found = matches.len();
        write_matches(&matches, output)?;
    } else {
        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        for m in scanner.scan(&sequences).filter_map(&mut report) {
            writeln!(out, "{}", format_record(&m, with_strand))?;
            found += 1;
        }
        out.flush()?;
    }

    if skipped > 0 {
        warn!("{} windows could not be scored", skipped);
    }
    info!("{} matches reported", found);

    let elapsed = start_time.elapsed();
    info!(
        "Total execution time: {:.4} minutes",
        elapsed.as_secs_f64() / 60.0
    );

    Ok(())
}

fn emit(matches: &[Match], output: Option<&str>, with_strand: bool) -> Result<(), ScannerError> {
    match output {
        Some(path) => write_matches(matches, path)?,
        None => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            for m in matches {
                writeln!(out, "{}", format_record(m, with_strand))?;
            }
            out.flush()?;
        }
    }
    Ok(())
}
