//! Integration test: cleaning through feature extraction end-to-end

use polars::prelude::*;
use tender_ml::data::{clean, engineer};
use tender_ml::feature_engineering::{FeatureExtractor, KeyTermScorer, KEY_TERMS};
use tender_ml::preprocessing::UNKNOWN_CODE;

fn raw_export() -> DataFrame {
    df!(
        "title" => [
            Some("Provision of software support services"),
            Some("Road resurfacing and drainage works"),
            Some("   "),
            Some("Managed computer systems maintenance"),
        ],
        "ca" => [
            Some("Health Service Executive"),
            Some("Dublin City Council"),
            Some("Council C"),
            None,
        ],
        "procedure" => [Some("Open"), Some("Open"), None, Some("Restricted")],
        "pdf_url" => [Some("http://a.pdf"), Some("http://b.pdf"), None, None],
        "pdf_text" => [
            Some("technical support for hospital software systems"),
            Some("carriageway repair schedule"),
            None,
            None,
        ],
        "detected_codes" => [Some("72000000;72250000"), Some("45233000"), None, None],
        "bid" => [Some(1.0f64), Some(0.0), None, None],
    )
    .unwrap()
}

#[test]
fn test_raw_export_to_feature_matrix() {
    let cleaned = clean(&raw_export(), false).unwrap();
    assert_eq!(cleaned.height(), 3, "the blank-title row is dropped");

    let prepared = engineer(&cleaned).unwrap();

    let mut extractor = FeatureExtractor::new(KeyTermScorer::new(KEY_TERMS).unwrap());
    let x = extractor.fit_transform(&prepared).unwrap();

    assert_eq!(x.nrows(), 3);
    assert_eq!(x.ncols(), extractor.n_features());

    let names = extractor.feature_names();
    assert_eq!(names.len(), x.ncols());
    assert_eq!(names[0], "codes_count");
    assert_eq!(names[4], "ca_encoded");
    assert_eq!(names[5], "tf_software");
    assert_eq!(names[14], "tf_technical");

    // Row 0: two detected codes, software vocabulary in both title and text
    assert_eq!(x[[0, 0]], 2.0);
    assert_eq!(x[[0, 1]], 1.0);
    assert!(x[[0, 5]] > 0.0, "tf_software fires on row 0");

    // Row 2 (after the drop): no codes, null ca filled to ""
    assert_eq!(x[[2, 0]], 0.0);
    assert_eq!(x[[2, 1]], 0.0);
}

#[test]
fn test_unseen_authority_scores_without_error() {
    let cleaned = clean(&raw_export(), false).unwrap();
    let mut extractor = FeatureExtractor::new(KeyTermScorer::new(KEY_TERMS).unwrap());
    extractor.fit(&cleaned).unwrap();

    let fresh = df!(
        "title" => &["Completely new tender"],
        "ca" => &["An Authority Nobody Trained On"],
    )
    .unwrap();

    let x = extractor.transform(&fresh).unwrap();
    assert_eq!(
        x[[0, 4]],
        UNKNOWN_CODE,
        "unseen authority maps to the fallback code"
    );
}

#[test]
fn test_term_scores_stay_capped() {
    let df = df!(
        "title" => &["software software software software"],
        "ca" => &["Council"],
        "pdf_text" => &["software software software software software"],
    )
    .unwrap();

    let mut extractor = FeatureExtractor::new(KeyTermScorer::new(KEY_TERMS).unwrap());
    let x = extractor.fit_transform(&df).unwrap();

    for k in 0..KEY_TERMS.len() {
        assert!(
            x[[0, 5 + k]] <= 1.0,
            "term score {} exceeds the cap: {}",
            k,
            x[[0, 5 + k]]
        );
    }
    assert!(x[[0, 5]] > 0.9, "a term-saturated document scores near the cap");
}

#[test]
fn test_transform_is_deterministic() {
    let cleaned = clean(&raw_export(), false).unwrap();
    let mut extractor = FeatureExtractor::new(KeyTermScorer::new(KEY_TERMS).unwrap());
    extractor.fit(&cleaned).unwrap();

    let a = extractor.transform(&cleaned).unwrap();
    let b = extractor.transform(&cleaned).unwrap();
    assert_eq!(a, b);
}
