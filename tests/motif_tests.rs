use statrs::prec::almost_eq;
use tfbs_affinity::motif::{self, Motif, DEFAULT_IC_THRESHOLD};
use tfbs_affinity::MotifError;

const TOL: f64 = 1e-9;

fn acga() -> Motif {
    Motif::new(
        "ACGA_like",
        [
            vec![2.0, 0.0, 0.0, 2.0],
            vec![0.0, 2.0, 0.0, 0.0],
            vec![0.0, 0.0, 2.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0],
        ],
    )
    .unwrap()
}

#[test]
fn test_read_motifs() {
    let motifs = motif::read_motifs("tests/data/motifs.pfm").unwrap();
    let names: Vec<&str> = motifs.iter().map(|m| m.name()).collect();
    assert_eq!(names, ["ACGA_like", "Matrix2", "MA0004.1 Arnt"]);
    let lengths: Vec<usize> = motifs.iter().map(|m| m.len()).collect();
    assert_eq!(lengths, [4, 5, 6]);

    // unlabelled rows are read in A, C, G, T order
    assert_eq!(motifs[2].consensus(), "CACGTG");
    assert_eq!(motifs[0], acga());

    let result = motif::read_motifs("tests/data/nonexistent.pfm");
    assert!(matches!(result, Err(MotifError::Io(_))));
}

#[test]
fn test_default_names_count_records() {
    let text = "A 1 0\nC 0 1\nG 0 0\nT 0 0\n>\n1 0\n0 1\n0 0\n0 0\n>named\nA 1\nC 0\nG 0\nT 0\n";
    let motifs = motif::parse_motifs(text).unwrap();
    let names: Vec<&str> = motifs.iter().map(|m| m.name()).collect();
    assert_eq!(names, ["Matrix1", "Matrix2", "named"]);
}

#[test]
fn test_row_layouts() {
    let bracketed = Motif::from_pfm("m", "A [1 2]\nC [3 4]\nG [5 6]\nT [7 8]").unwrap();
    let colon = Motif::from_pfm("m", "a: 1 2\nc: 3 4\ng: 5 6\nt: 7 8").unwrap();
    let shuffled = Motif::from_pfm("m", "T 7 8\nG 5 6\nC 3 4\nA 1 2").unwrap();
    let plain = Motif::from_pfm("m", "1 2\n3 4\n5 6\n7 8").unwrap();
    assert_eq!(bracketed, colon);
    assert_eq!(bracketed, shuffled);
    assert_eq!(bracketed, plain);
    assert_eq!(bracketed.frequencies()[[3, 1]], 8.0);
}

#[test]
fn test_malformed_matrices() {
    let unequal = Motif::from_pfm("m", "A 1 2\nC 3 4\nG 5\nT 7 8");
    assert!(matches!(unequal, Err(MotifError::MalformedMatrix(_))));

    let unequal = Motif::new("m", [vec![1.0], vec![1.0, 2.0], vec![1.0], vec![1.0]]);
    assert!(matches!(unequal, Err(MotifError::MalformedMatrix(_))));

    let three_rows = Motif::from_pfm("m", "A 1 2\nC 3 4\nG 5 6");
    assert!(matches!(three_rows, Err(MotifError::MalformedMatrix(_))));

    let duplicate = Motif::from_pfm("m", "A 1\nA 1\nG 1\nT 1");
    assert!(matches!(duplicate, Err(MotifError::MalformedMatrix(_))));

    let mixed = Motif::from_pfm("m", "A 1\n1\nG 1\nT 1");
    assert!(matches!(mixed, Err(MotifError::MalformedMatrix(_))));

    let empty = Motif::new("m", [vec![], vec![], vec![], vec![]]);
    assert!(matches!(empty, Err(MotifError::MalformedMatrix(_))));

    let negative = Motif::from_pfm("m", "A 1\nC -1\nG 1\nT 1");
    assert!(matches!(negative, Err(MotifError::MalformedMatrix(_))));

    match Motif::from_pfm("m", "A [1 2]\nC [3 x]\nG [5 6]\nT [7 8]") {
        Err(MotifError::MalformedMatrix(message)) => {
            assert!(message.contains("line 2"), "{}", message);
            assert!(message.contains("\"x\""), "{}", message);
        }
        other => panic!("expected a malformed matrix, got {:?}", other),
    }

    let unclosed = Motif::from_pfm("m", "A [1 2\nC 3 4\nG 5 6\nT 7 8");
    assert!(matches!(unclosed, Err(MotifError::MalformedMatrix(_))));

    let bad_label = Motif::from_pfm("m", "A 1\nC 1\nN 1\nT 1");
    assert!(matches!(bad_label, Err(MotifError::MalformedMatrix(_))));

    let truncated = motif::parse_motifs(">one\nA 1\nC 1\n>two\nA 1\nC 1\nG 1\nT 1");
    assert!(matches!(truncated, Err(MotifError::MalformedMatrix(_))));

    let nothing = motif::parse_motifs("\n\n");
    assert!(matches!(nothing, Err(MotifError::InvalidFileFormat(_))));
}

#[test]
fn test_weights_and_bounds() {
    let motif = acga();
    // (2 + 0.1) / (2 + 0.4) / 0.25
    assert!(almost_eq(motif.weights()[[0, 0]], 3.5f64.ln(), TOL));
    // (0 + 0.1) / (2 + 0.4) / 0.25
    let low = (0.1f64 / 2.4 / 0.25).ln();
    assert!(almost_eq(motif.weights()[[3, 2]], low, TOL));

    assert!(almost_eq(motif.max_bind(), 4.0 * 3.5f64.ln(), TOL));
    assert!(almost_eq(motif.min_bind(), 4.0 * low, TOL));
}

#[test]
fn test_information_content() {
    let motif = acga();
    let f_hi = 2.1f64 / 2.4;
    let f_lo = 0.1f64 / 2.4;
    let expected = 2.0 + f_hi * f_hi.log2() + 3.0 * f_lo * f_lo.log2();
    for position in 1..=4 {
        assert!(almost_eq(motif.column_information(position).unwrap(), expected, TOL));
    }
    assert!(almost_eq(motif.total_information(), 4.0 * expected, TOL));

    // ~1.26 bits per column
    assert!(!motif.information_content(1, DEFAULT_IC_THRESHOLD).unwrap());
    assert!(motif.information_content(1, 1.0).unwrap());

    let arnt = Motif::from_pfm("Arnt", "4 19 0 0 0 0\n16 0 20 0 0 0\n0 1 0 20 0 20\n0 0 0 0 20 0")
        .unwrap();
    assert!(arnt.information_content(4, DEFAULT_IC_THRESHOLD).unwrap());

    assert!(matches!(
        motif.information_content(0, 1.5),
        Err(MotifError::OutOfRange { position: 0, length: 4 })
    ));
    assert!(matches!(
        motif.information_content(5, 1.5),
        Err(MotifError::OutOfRange { position: 5, length: 4 })
    ));
    assert!(matches!(
        motif.information_content(1, 2.5),
        Err(MotifError::InvalidThreshold(_))
    ));
    assert!(matches!(
        motif.information_content(1, -0.1),
        Err(MotifError::InvalidThreshold(_))
    ));
    assert!(motif.information_content(1, 0.0).unwrap());
}

#[test]
fn test_consensus_extremes() {
    let motifs = motif::read_motifs("tests/data/motifs.pfm").unwrap();
    for motif in &motifs {
        let best = motif.consensus();
        let worst = motif.anti_consensus();
        assert!(almost_eq(motif.relative_affinity(&best, false).unwrap(), 1.0, TOL));
        assert!(almost_eq(motif.relative_affinity(&worst, false).unwrap(), 0.0, TOL));
        assert!(almost_eq(motif.relative_affinity(&best, true).unwrap(), 1.0, TOL));
        assert!(almost_eq(motif.relative_affinity(&worst, true).unwrap(), 0.0, TOL));
    }
    assert_eq!(acga().consensus(), "ACGA");
    assert_eq!(acga().anti_consensus(), "CAAC");
}

#[test]
fn test_relative_affinity_ignores_case_and_padding() {
    let motif = acga();
    let upper = motif.relative_affinity("ACGT", false).unwrap();
    assert_eq!(motif.relative_affinity("acgt", false).unwrap(), upper);
    assert_eq!(motif.relative_affinity("  AcGt\n", false).unwrap(), upper);
}

#[test]
fn test_relative_affinity_rejects_bad_windows() {
    let motif = acga();
    assert!(matches!(
        motif.relative_affinity("ACG", false),
        Err(MotifError::LengthMismatch { expected: 4, found: 3 })
    ));
    assert!(matches!(
        motif.relative_affinity("ACGAA", true),
        Err(MotifError::LengthMismatch { expected: 4, found: 5 })
    ));
    assert!(matches!(
        motif.relative_affinity("ACNA", false),
        Err(MotifError::InvalidSequence { position: 3, symbol: 'N' })
    ));
    // symbols are checked before the length
    assert!(matches!(
        motif.relative_affinity("AC-", false),
        Err(MotifError::InvalidSequence { position: 3, symbol: '-' })
    ));
}

#[test]
fn test_linear_matches_exponentiated_log_odds() {
    let motif = acga();
    let log_odds = motif.log_odds("ACGA").unwrap();
    let expected = (log_odds.exp() - motif.min_bind().exp())
        / (motif.max_bind().exp() - motif.min_bind().exp());
    assert!(almost_eq(motif.relative_affinity("ACGA", true).unwrap(), expected, TOL));

    let log_odds = motif.log_odds("ACTA").unwrap();
    let expected = (log_odds.exp() - motif.min_bind().exp())
        / (motif.max_bind().exp() - motif.min_bind().exp());
    let linear = motif.relative_affinity("ACTA", true).unwrap();
    assert!(almost_eq(linear, expected, TOL));
    assert!(linear < motif.relative_affinity("ACTA", false).unwrap());
}

#[test]
fn test_scores_are_monotonic_in_log_odds() {
    let motif = acga();
    let windows = ["CAAC", "AAAC", "ACAC", "ACGC", "ACGA"];
    let mut previous: Option<(f64, f64, f64)> = None;
    for window in windows {
        let raw = motif.log_odds(window).unwrap();
        let log = motif.relative_affinity(window, false).unwrap();
        let linear = motif.relative_affinity(window, true).unwrap();
        if let Some((p_raw, p_log, p_linear)) = previous {
            assert!(raw > p_raw, "{}", window);
            assert!(log > p_log, "{}", window);
            assert!(linear > p_linear, "{}", window);
        }
        previous = Some((raw, log, linear));
    }
}

#[test]
fn test_long_motif_linear_scale_is_finite() {
    let columns = 600;
    let motif = Motif::new(
        "long",
        [
            vec![10.0; columns],
            vec![0.0; columns],
            vec![0.0; columns],
            vec![0.0; columns],
        ],
    )
    .unwrap();
    let best = "A".repeat(columns);
    let score = motif.relative_affinity(&best, true).unwrap();
    assert!(almost_eq(score, 1.0, TOL));
}

#[test]
fn test_uniform_motif_scores_one() {
    let motif = Motif::new("flat", [vec![1.0; 3], vec![1.0; 3], vec![1.0; 3], vec![1.0; 3]]).unwrap();
    assert_eq!(motif.relative_affinity("ACG", false).unwrap(), 1.0);
    assert_eq!(motif.relative_affinity("TTT", true).unwrap(), 1.0);
    assert!(almost_eq(motif.total_information(), 0.0, TOL));
}

#[test]
fn test_reverse_complement() {
    let motif = acga();
    let rc = motif.reverse_complement();
    assert_eq!(rc.name(), "ACGA_like_rc");
    assert_eq!(rc.len(), motif.len());
    assert_eq!(rc.consensus(), "TCGT");
    // last column A=2 becomes first column T=2
    assert_eq!(rc.frequencies()[[3, 0]], 2.0);
    assert_eq!(rc.frequencies(), motif.reverse_complement_frequencies());
    assert!(almost_eq(rc.max_bind(), motif.max_bind(), TOL));
    assert!(almost_eq(rc.min_bind(), motif.min_bind(), TOL));

    let twice = rc.reverse_complement();
    assert_eq!(twice.frequencies(), motif.frequencies());
    assert_eq!(twice.weights(), motif.weights());

    let motifs = motif::read_motifs("tests/data/motifs.pfm").unwrap();
    for m in &motifs {
        assert_eq!(m.reverse_complement().reverse_complement().frequencies(), m.frequencies());
    }
}

#[test]
fn test_threshold_metadata() {
    let motif = acga();
    assert_eq!(motif.threshold(), None);
    let motif = motif.with_threshold(0.8);
    assert_eq!(motif.threshold(), Some(0.8));
    assert_eq!(motif.reverse_complement().threshold(), Some(0.8));
    // metadata only; scoring is unchanged
    assert!(almost_eq(motif.relative_affinity("ACGA", false).unwrap(), 1.0, TOL));
}
