//! End-to-end behavior of the harmonization pipeline.

use std::io::Write;

use sumstats_harmonizer::harmonize::options::HarmonizeOptions;
use sumstats_harmonizer::harmonize::pipeline::harmonize;
use sumstats_harmonizer::output::format::OutputFormat;
use sumstats_harmonizer::output::writer::{write_harmonized, WriteOptions};
use sumstats_harmonizer::parsing::schema::{normalize_table, ColumnOverrides, InputFormat};
use sumstats_harmonizer::parsing::table::{parse_table_text, read_table};
use sumstats_harmonizer::reference::panel::{ReferencePanel, ReferencePanelEntry};
use sumstats_harmonizer::{HarmonizationOutcome, VariantRecord};

fn close(a: Option<f64>, b: f64) -> bool {
    a.is_some_and(|a| (a - b).abs() < 1e-9)
}

fn panel() -> ReferencePanel {
    ReferencePanel::from_entries(vec![
        ReferencePanelEntry::new("1", 100_000, "A", "G").with_freq(0.3),
        ReferencePanelEntry::new("1", 200_000, "C", "T").with_freq(0.4),
        ReferencePanelEntry::new("1", 300_000, "A", "T").with_freq(0.01),
        ReferencePanelEntry::new("2", 400_000, "G", "C").with_freq(0.5),
    ])
}

#[test]
fn test_forward_record_unchanged() {
    let record = VariantRecord::new("1", 100_000, "G", "A")
        .with_eaf(0.2)
        .with_beta(0.05);
    let (out, _) = harmonize(vec![record.clone()], &panel(), None, &HarmonizeOptions::default()).unwrap();

    assert_eq!(out[0].outcome, HarmonizationOutcome::MatchedForward);
    assert_eq!(out[0].record, record);
}

#[test]
fn test_ref_alt_swap() {
    let record = VariantRecord::new("1", 100_000, "A", "G")
        .with_eaf(0.2)
        .with_beta(0.05);
    let (out, _) = harmonize(vec![record], &panel(), None, &HarmonizeOptions::default()).unwrap();

    let h = &out[0];
    assert_eq!(h.outcome, HarmonizationOutcome::MatchedFlippedRefAlt);
    assert_eq!(h.record.ea, "G");
    assert_eq!(h.record.nea, "A");
    assert!(close(h.record.eaf, 0.8));
    assert!(close(h.record.beta, -0.05));
}

#[test]
fn test_flip_round_trip() {
    let original = VariantRecord::new("1", 200_000, "T", "C")
        .with_eaf(0.35)
        .with_beta(0.12);

    let mut flipped = original.clone();
    flipped.swap_alleles();
    let (out, _) = harmonize(vec![flipped], &panel(), None, &HarmonizeOptions::default()).unwrap();

    let back = &out[0].record;
    assert_eq!(out[0].outcome, HarmonizationOutcome::MatchedFlippedRefAlt);
    assert_eq!(back.ea, original.ea);
    assert_eq!(back.nea, original.nea);
    assert!(close(back.eaf, 0.35));
    assert!(close(back.beta, 0.12));
}

#[test]
fn test_strand_flip_keeps_effect() {
    // G/A on the minus strand is C/T
    let record = VariantRecord::new("1", 200_000, "A", "G").with_beta(0.3);
    let (out, _) = harmonize(vec![record], &panel(), None, &HarmonizeOptions::default()).unwrap();

    assert_eq!(out[0].outcome, HarmonizationOutcome::MatchedFlippedStrand);
    assert_eq!(out[0].record.ea, "T");
    assert_eq!(out[0].record.nea, "C");
    assert!(close(out[0].record.beta, 0.3));
}

#[test]
fn test_idempotent() {
    let input = vec![
        VariantRecord::new("1", 100_000, "A", "G").with_eaf(0.2).with_beta(0.05),
        VariantRecord::new("1", 200_000, "G", "A").with_beta(-0.2),
        VariantRecord::new("1", 300_000, "A", "T").with_eaf(0.995).with_beta(0.1),
    ];
    let options = HarmonizeOptions::default();
    let (first, _) = harmonize(input, &panel(), None, &options).unwrap();
    let records: Vec<VariantRecord> = first.iter().map(|h| h.record.clone()).collect();

    let (second, report) = harmonize(records.clone(), &panel(), None, &options).unwrap();
    let again: Vec<VariantRecord> = second.iter().map(|h| h.record.clone()).collect();
    assert_eq!(again, records);
    assert_eq!(report.outcomes.matched_forward, 2);
    assert_eq!(
        second[2].outcome,
        HarmonizationOutcome::PalindromicResolvedByFreq { flipped: false }
    );
}

#[test]
fn test_palindromic_boundaries() {
    let options = HarmonizeOptions::default();
    let run = |eaf: f64| {
        let record = VariantRecord::new("1", 300_000, "A", "T").with_eaf(eaf).with_beta(0.1);
        harmonize(vec![record], &panel(), None, &options).unwrap().0.remove(0)
    };

    let resolved = run(0.995);
    assert_eq!(
        resolved.outcome,
        HarmonizationOutcome::PalindromicResolvedByFreq { flipped: true }
    );
    assert_eq!(resolved.record.ea, "T");
    assert!(close(resolved.record.beta, -0.1));
    assert!(close(resolved.record.eaf, 0.005));

    assert_eq!(run(0.5).outcome, HarmonizationOutcome::PalindromicAmbiguous);
    assert_eq!(
        run(0.99).outcome,
        HarmonizationOutcome::PalindromicResolvedByFreq { flipped: true }
    );

    // Reference frequency at 0.5 can never be confident
    let record = VariantRecord::new("2", 400_000, "C", "G").with_eaf(0.999);
    let (out, _) = harmonize(vec![record], &panel(), None, &options).unwrap();
    assert_eq!(out[0].outcome, HarmonizationOutcome::PalindromicAmbiguous);
}

#[test]
fn test_missing_site_policy() {
    let record = VariantRecord::new("3", 1, "A", "G").with_beta(0.4);

    let (kept, report) =
        harmonize(vec![record.clone()], &panel(), None, &HarmonizeOptions::default()).unwrap();
    assert_eq!(kept[0].outcome, HarmonizationOutcome::NotFoundInReference);
    assert_eq!(kept[0].record, record);
    assert_eq!(report.outcomes.not_found_in_reference, 1);

    let options = HarmonizeOptions {
        remove: true,
        ..HarmonizeOptions::default()
    };
    let (removed, report) = harmonize(vec![record], &panel(), None, &options).unwrap();
    assert!(removed.is_empty());
    assert_eq!(report.dropped_by_policy, 1);
}

#[test]
fn test_dedup_keeps_first_of_each_group() {
    let mut input = Vec::new();
    for (line, beta) in [0.1, 0.2, 0.3].into_iter().enumerate() {
        input.push(VariantRecord::new("1", 100_000, "G", "A").with_beta(beta).with_line(line));
    }
    for (line, beta) in [0.4, 0.5].into_iter().enumerate() {
        input.push(VariantRecord::new("1", 200_000, "T", "C").with_beta(beta).with_line(10 + line));
    }

    let (out, report) = harmonize(input, &panel(), None, &HarmonizeOptions::default()).unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(report.qc.duplicates_removed, 3);
    assert!(close(out[0].record.beta, 0.1));
    assert_eq!(out[0].record.line, 0);
    assert!(close(out[1].record.beta, 0.4));
    assert_eq!(out[1].record.line, 10);
}

#[test]
fn test_table_to_file() {
    let text = "\
CHR\tPOS\tSNP\tEA\tNEA\tEAF\tBETA\tSE\tP\tN
chr1\t100000\trs1\tA\tG\t0.2\t0.05\t0.01\t1e-5\t1000
1\t200000\trs2\tT\tC\t0.4\t-0.1\t0.02\t0.3\t1000
1\t0\trs3\tA\tC\t0.4\t-0.1\t0.02\t0.3\t1000
";
    let table = parse_table_text(text).unwrap();
    let records = normalize_table(&table, InputFormat::Auto, &ColumnOverrides::default()).unwrap();
    assert_eq!(records.len(), 3);

    let (out, report) = harmonize(records, &panel(), None, &HarmonizeOptions::default()).unwrap();
    assert_eq!(report.qc.invalid, 1);
    assert_eq!(out.len(), 2);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("harmonized.tsv");
    let options = WriteOptions {
        format: OutputFormat::Standard,
        ..WriteOptions::default()
    };
    let summary = write_harmonized(&out, &path, &options).unwrap();
    assert_eq!(summary.rows_written, 2);

    // The written table reads back into the same records
    let reread = normalize_table(
        &read_table(&path).unwrap(),
        InputFormat::Auto,
        &ColumnOverrides::default(),
    )
    .unwrap();
    assert_eq!(reread.len(), 2);
    assert_eq!(reread[0].ea, "G");
    assert_eq!(reread[0].nea, "A");
    assert!(close(reread[0].beta, -0.05));
    assert!(close(reread[0].eaf, 0.8));
}

#[test]
fn test_gzip_panel_from_file() {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("panel.vcf.gz");
    let file = std::fs::File::create(&path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    writeln!(encoder, "##fileformat=VCFv4.2").unwrap();
    writeln!(encoder, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO").unwrap();
    writeln!(encoder, "chr1\t100000\trs1\tA\tG\t.\tPASS\tAF=0.3").unwrap();
    encoder.finish().unwrap();

    let panel = ReferencePanel::load(&path, "AF").unwrap();
    let record = VariantRecord::new("1", 100_000, "A", "G");
    let (out, _) = harmonize(vec![record], &panel, None, &HarmonizeOptions::default()).unwrap();
    assert_eq!(out[0].outcome, HarmonizationOutcome::MatchedFlippedRefAlt);
    assert_eq!(out[0].record.rsid.as_deref(), Some("rs1"));
}
