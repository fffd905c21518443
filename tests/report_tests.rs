use std::fs;
use tfbs_affinity::report::{to_dataframe, write_matches};
use tfbs_affinity::{scan, Match, Motif, MotifError, Sequence};

fn matches() -> Vec<Match> {
    let motif = Motif::from_pfm("ACGA_like", "A [2 0 0 2]\nC [0 2 0 0]\nG [0 0 2 0]\nT [0 0 0 0]")
        .unwrap();
    let sequences = vec![Sequence::new("seq1", "TTACGATT")];
    scan(&sequences, &[motif], 0.0).map(|m| m.unwrap()).collect()
}

#[test]
fn test_to_dataframe() {
    let matches = matches();
    let df = to_dataframe(&matches).unwrap();
    assert_eq!(df.height(), 5);
    assert_eq!(df.width(), 7);
    let names: Vec<&str> = df.get_column_names().into_iter().map(|n| n.as_str()).collect();
    assert_eq!(
        names,
        ["sequence", "start", "end", "motif", "strand", "matched", "score"]
    );
}

#[test]
fn test_display_record() {
    let matches = matches();
    let line = matches[2].to_string();
    let fields: Vec<&str> = line.split('\t').collect();
    assert_eq!(fields[..5], ["seq1", "3", "6", "ACGA_like", "ACGA"]);
    assert!((fields[5].parse::<f64>().unwrap() - 1.0).abs() < 1e-9);
}

#[test]
fn test_write_matches() {
    let matches = matches();

    let path = "tests/data/report_out.tsv";
    write_matches(&matches, path).unwrap();
    let text = fs::read_to_string(path).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("sequence\tstart\tend\tmotif\tstrand\tmatched\tscore")
    );
    assert_eq!(lines.count(), 5);
    fs::remove_file(path).unwrap();

    let path = "tests/data/report_out.csv";
    write_matches(&matches, path).unwrap();
    let text = fs::read_to_string(path).unwrap();
    assert!(text.starts_with("sequence,start,end,motif,strand,matched,score"));
    fs::remove_file(path).unwrap();

    let path = "tests/data/report_out.parquet";
    write_matches(&matches, path).unwrap();
    assert!(fs::metadata(path).unwrap().len() > 0);
    fs::remove_file(path).unwrap();

    let result = write_matches(&matches, "tests/data/report_out.bed");
    assert!(matches!(result, Err(MotifError::InvalidParameter { .. })));
}
