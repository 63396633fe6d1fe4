use super::*;
use crate::dataset::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn read_all(table: &str, n_features: usize) -> Vec<Result<Array1<bool>, RbmError>> {
    BinarizedCsvReader::new(table.as_bytes(), n_features, DEFAULT_BINARIZE_THRESHOLD).collect()
}

#[test]
fn test_threshold_boundary() {
    let rows = read_all("label,a,b,c,d\n5,127,128,0,255\n", 4);

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].as_ref().unwrap(), &array![false, true, false, true]);
}

#[test]
fn test_custom_threshold() {
    let rows: Vec<_> = BinarizedCsvReader::new("h\n1,10,20,30\n".as_bytes(), 3, 20)
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(rows, vec![array![false, true, true]]);
}

#[test]
fn test_header_and_label_are_skipped() {
    // A numeric header is still a header, and the label is never part of the features
    let rows = read_all("255,255,255\n255,0,0\n0,255,255\n", 2);

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].as_ref().unwrap(), &array![false, false]);
    assert_eq!(rows[1].as_ref().unwrap(), &array![true, true]);
}

#[test]
fn test_extra_fields_are_ignored() {
    let rows = read_all("h\n3,200,200,oops,more\n", 2);
    assert_eq!(rows[0].as_ref().unwrap(), &array![true, true]);
}

#[test]
fn test_blank_lines_are_skipped() {
    let rows = read_all("h\n\n1,0,200\n   \n2,200,0\n", 2);

    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.is_ok()));
}

#[test]
fn test_short_row_is_reported_after_valid_rows() {
    let rows = read_all("h\n1,0,200,0\n2,200,0\n3,0,0,0\n", 3);

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].as_ref().unwrap(), &array![false, true, false]);
    match &rows[1] {
        Err(RbmError::Ingestion { line, reason }) => {
            assert_eq!(*line, 3);
            assert!(reason.contains("found 2"), "{}", reason);
        }
        other => panic!("Expected an ingestion error, got {:?}", other),
    }
    assert!(rows[2].is_ok());
}

#[test]
fn test_non_numeric_field() {
    let rows = read_all("h\n1,12,abc\n", 2);

    match &rows[0] {
        Err(RbmError::Ingestion { line, reason }) => {
            assert_eq!(*line, 2);
            assert!(reason.contains("abc"), "{}", reason);
        }
        other => panic!("Expected an ingestion error, got {:?}", other),
    }

    // Negative intensities are not valid either
    let rows = read_all("h\n1,-5,0\n", 2);
    assert!(matches!(rows[0], Err(RbmError::Ingestion { .. })));
}

#[test]
fn test_fractional_intensity_is_rejected() {
    let rows = read_all("h\n1,12.0,200\n2,0,200\n", 2);

    match &rows[0] {
        Err(RbmError::Ingestion { line, reason }) => {
            assert_eq!(*line, 2);
            assert!(reason.contains("12.0"), "{}", reason);
        }
        other => panic!("Expected an ingestion error, got {:?}", other),
    }
    assert_eq!(rows[1].as_ref().unwrap(), &array![false, true]);
}

#[test]
fn test_surrounding_whitespace_is_tolerated() {
    let rows = read_all("h\n1, 130 ,4\r\n", 2);
    assert_eq!(rows[0].as_ref().unwrap(), &array![true, false]);
}

#[test]
fn test_load_binarized_csv() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "label,p0,p1,p2\n7,0,200,128\n3,255,10,0\n9,1,2,3\n").unwrap();

    let training_set = load_binarized_csv(file.path(), 3, DEFAULT_BINARIZE_THRESHOLD).unwrap();

    assert_eq!(training_set.dim(), (3, 3));
    assert_eq!(
        training_set,
        array![[false, true, true], [true, false, false], [false, false, false]]
    );
}

#[test]
fn test_load_binarized_csv_is_all_or_nothing() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "h\n1,200,200\n2,200\n").unwrap();

    let err = load_binarized_csv(file.path(), 2, DEFAULT_BINARIZE_THRESHOLD).unwrap_err();
    assert!(matches!(err, RbmError::Ingestion { line: 3, .. }));
    assert!(err.is_fatal_input());
}

#[test]
fn test_load_binarized_csv_without_rows() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "label,p0\n").unwrap();

    assert!(matches!(
        load_binarized_csv(file.path(), 1, DEFAULT_BINARIZE_THRESHOLD),
        Err(RbmError::InvalidInput(_))
    ));
}

#[test]
fn test_load_binarized_csv_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_binarized_csv(dir.path().join("missing.csv"), 4, 128).unwrap_err();

    assert!(matches!(err, RbmError::Io(_)));
    assert!(!err.is_fatal_input());
}
