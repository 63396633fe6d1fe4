use ndarray::prelude::*;
use rustyrbm::prelude::*;
use std::fmt::Write as _;
use std::fs;
use tempfile::tempdir;

/// Builds an MNIST-style table: header, then `label,pixel...` rows
fn create_table(rows: &[(u8, Vec<u32>)]) -> String {
    let n_pixels = rows.first().map(|(_, p)| p.len()).unwrap_or(0);
    let mut table = String::from("label");
    for i in 0..n_pixels {
        write!(table, ",pixel{}", i).unwrap();
    }
    table.push('\n');

    for (label, pixels) in rows {
        write!(table, "{}", label).unwrap();
        for p in pixels {
            write!(table, ",{}", p).unwrap();
        }
        table.push('\n');
    }
    table
}

#[test]
fn test_ingested_table_trains_a_model() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("train.csv");

    let rows: Vec<(u8, Vec<u32>)> = (0..30)
        .map(|i| (i % 10, vec![255, 200, 3, 0, 130, 127]))
        .collect();
    fs::write(&path, create_table(&rows)).unwrap();

    let training_set = load_binarized_csv(&path, 6, DEFAULT_BINARIZE_THRESHOLD).unwrap();
    assert_eq!(training_set.dim(), (30, 6));
    assert_eq!(training_set.row(0), array![true, true, false, false, true, false]);

    let mut model = Rbm::new(6, 4).unwrap();
    let mut trainer = ContrastiveDivergence::new(0.1, 1, 10, Some(8)).unwrap();
    let reports = trainer.fit(&mut model, &training_set, 20).unwrap();
    assert_eq!(reports.len(), 20);
}

#[test]
fn test_table_narrower_than_the_model_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("train.csv");
    fs::write(&path, create_table(&[(1, vec![0, 255]), (2, vec![255, 0])])).unwrap();

    let err = load_binarized_csv(&path, 3, DEFAULT_BINARIZE_THRESHOLD).unwrap_err();
    match err {
        RbmError::Ingestion { line, .. } => assert_eq!(line, 2),
        other => panic!("Expected an ingestion error, got {:?}", other),
    }
}

#[test]
fn test_streaming_reader_keeps_rows_before_an_error() {
    let table = "label,a,b\n1,0,255\n2,x,0\n3,255,255\n";
    let rows: Vec<_> = BinarizedCsvReader::new(table.as_bytes(), 2, DEFAULT_BINARIZE_THRESHOLD).collect();

    assert_eq!(rows.len(), 3);
    assert!(rows[0].is_ok());
    assert!(matches!(rows[1], Err(RbmError::Ingestion { line: 3, .. })));
    assert!(rows[2].is_ok());
}
