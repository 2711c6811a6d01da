//! Integration test: train, predict, and artifact round-trip

use polars::prelude::*;
use tender_ml::data::clean;
use tender_ml::error::TenderError;
use tender_ml::inference::{BidPredictor, PredictorConfig};

const SOFTWARE_TEXT: &str = "managed software provision with ongoing technical support for \
                             computer systems and services across all regional sites";
const ROADS_TEXT: &str = "surface dressing and carriageway repair programme across the county \
                          road network including drainage and verge maintenance";

/// Raw export frame: 24 bid-worthy IT tenders, 24 road tenders, and two
/// unlabelled rows that cleaning must drop before training.
fn raw_labelled_export() -> DataFrame {
    let n = 48;
    let half = n / 2;
    let mut titles: Vec<Option<String>> = (0..n)
        .map(|i| {
            Some(if i < half {
                format!("Provision of software support services lot {}", i)
            } else {
                format!("Road resurfacing and drainage works phase {}", i)
            })
        })
        .collect();
    let mut cas: Vec<Option<&str>> = (0..n)
        .map(|i| {
            Some(match i % 4 {
                0 => "Health Service Executive",
                1 => "Dublin City Council",
                2 => "Department of Education",
                _ => "Cork County Council",
            })
        })
        .collect();
    let mut texts: Vec<Option<&str>> = (0..n)
        .map(|i| Some(if i < half { SOFTWARE_TEXT } else { ROADS_TEXT }))
        .collect();
    let mut codes: Vec<Option<i64>> = (0..n).map(|i| Some(if i < half { 3 } else { 0 })).collect();
    let mut bids: Vec<Option<bool>> = (0..n).map(|i| Some(i < half)).collect();

    titles.push(Some("Unlabelled software tender".to_string()));
    titles.push(Some("Unlabelled roads tender".to_string()));
    cas.push(None);
    cas.push(Some("Dublin City Council"));
    texts.push(Some(SOFTWARE_TEXT));
    texts.push(None);
    codes.push(None);
    codes.push(Some(1));
    bids.push(None);
    bids.push(None);

    df!(
        "title" => titles,
        "ca" => cas,
        "pdf_text" => texts,
        "codes_count" => codes,
        "bid" => bids,
    )
    .unwrap()
}

fn seeded_config(threshold: f64) -> PredictorConfig {
    PredictorConfig::new()
        .with_threshold(threshold)
        .with_random_state(42)
}

#[test]
fn test_train_and_predict_end_to_end() {
    let training = clean(&raw_labelled_export(), true).unwrap();
    assert_eq!(training.height(), 48, "unlabelled rows are dropped");

    let mut predictor = BidPredictor::new(PredictorConfig::default()).unwrap();
    let metrics = predictor.train(&training).unwrap();

    assert_eq!(metrics.total_samples, 48);
    assert!((metrics.bid_rate - 0.5).abs() < 1e-12);
    assert!(metrics.auc > 0.9, "separable data should score well: {}", metrics.auc);
    assert!(metrics.recall > 0.9, "recall = {}", metrics.recall);

    // Confusion counts cover exactly the hold-out slice: 20% of each class
    let val_total = metrics.true_positives
        + metrics.false_positives
        + metrics.true_negatives
        + metrics.false_negatives;
    assert_eq!(val_total, 8, "24 rows per class hold out 4 each");

    let fresh = df!(
        "title" => &["Software support services renewal", "Carriageway repair contract"],
        "ca" => &["Health Service Executive", "Cork County Council"],
        "pdf_text" => &[SOFTWARE_TEXT, ROADS_TEXT],
        "codes_count" => &[3i64, 0],
    )
    .unwrap();

    let predictions = predictor.predict(&fresh).unwrap();
    assert_eq!(predictions.len(), 2);
    assert!(predictions[0].bid, "the IT tender should be flagged");
    assert!(
        predictions[0].probability > predictions[1].probability,
        "IT tender should outscore the roads tender"
    );
    for p in &predictions {
        assert!(p.confidence >= 0.0 && p.confidence <= 1.0);
    }
}

#[test]
fn test_predict_before_train_is_an_error() {
    let predictor = BidPredictor::new(PredictorConfig::default()).unwrap();
    let df = df!(
        "title" => &["Anything"],
        "ca" => &["Council"],
    )
    .unwrap();

    assert!(matches!(
        predictor.predict(&df),
        Err(TenderError::ModelNotFitted)
    ));
    assert!(matches!(
        predictor.predict_proba(&df),
        Err(TenderError::ModelNotFitted)
    ));
}

#[test]
fn test_raising_the_threshold_only_demotes() {
    let training = clean(&raw_labelled_export(), true).unwrap();

    let mut sensitive = BidPredictor::new(seeded_config(0.05)).unwrap();
    sensitive.train(&training).unwrap();

    let mut strict = BidPredictor::new(seeded_config(0.5)).unwrap();
    strict.train(&training).unwrap();

    let scores_sensitive = sensitive.predict_proba(&training).unwrap();
    let scores_strict = strict.predict_proba(&training).unwrap();
    assert_eq!(
        scores_sensitive, scores_strict,
        "same seed and data give the same scores"
    );

    let low = sensitive.predict(&training).unwrap();
    let high = strict.predict(&training).unwrap();
    for (a, b) in low.iter().zip(&high) {
        assert!(
            a.bid || !b.bid,
            "a record flagged at 0.5 must also be flagged at 0.05 (p = {})",
            b.probability
        );
    }

    let flagged_low = low.iter().filter(|p| p.bid).count();
    let flagged_high = high.iter().filter(|p| p.bid).count();
    assert!(flagged_high <= flagged_low);
}

#[test]
fn test_artifact_round_trip_reproduces_predictions() {
    let training = clean(&raw_labelled_export(), true).unwrap();
    let mut predictor = BidPredictor::new(seeded_config(0.05)).unwrap();
    predictor.train(&training).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bid_model.json");
    predictor.save(&path).unwrap();
    assert!(path.exists());

    let restored = BidPredictor::load(&path).unwrap();
    assert!(restored.is_trained());
    assert_eq!(restored.feature_names(), predictor.feature_names());
    assert_eq!(
        restored.config().prediction_threshold,
        predictor.config().prediction_threshold
    );
    assert_eq!(restored.trained_at(), predictor.trained_at());

    let before = predictor.predict_proba(&training).unwrap();
    let after = restored.predict_proba(&training).unwrap();
    assert_eq!(before, after, "a reloaded artifact scores identically");

    let metrics_before = predictor.metrics().unwrap();
    let metrics_after = restored.metrics().unwrap();
    assert_eq!(metrics_before.auc, metrics_after.auc);
    assert_eq!(metrics_before.false_negatives, metrics_after.false_negatives);
}

#[test]
fn test_save_untrained_is_an_error() {
    let predictor = BidPredictor::new(PredictorConfig::default()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bid_model.json");

    assert!(matches!(
        predictor.save(&path),
        Err(TenderError::ModelNotFitted)
    ));
    assert!(!path.exists(), "a failed save leaves nothing behind");
}

#[test]
fn test_prediction_works_without_label_column() {
    let training = clean(&raw_labelled_export(), true).unwrap();
    let mut predictor = BidPredictor::new(PredictorConfig::default()).unwrap();
    predictor.train(&training).unwrap();

    let unlabelled = df!(
        "title" => &["Computer systems management tender"],
        "ca" => &["Health Service Executive"],
        "pdf_text" => &[SOFTWARE_TEXT],
        "codes_count" => &[2i64],
    )
    .unwrap();

    let predictions = predictor.predict(&unlabelled).unwrap();
    assert_eq!(predictions.len(), 1);
}

#[test]
fn test_feature_importance_is_sorted_and_complete() {
    let training = clean(&raw_labelled_export(), true).unwrap();
    let mut predictor = BidPredictor::new(PredictorConfig::default()).unwrap();
    predictor.train(&training).unwrap();

    let importance = predictor.feature_importance().unwrap();
    assert_eq!(importance.len(), 15);
    for pair in importance.windows(2) {
        assert!(
            pair[0].1 >= pair[1].1,
            "importances are reported largest first"
        );
    }
    let total: f64 = importance.iter().map(|(_, v)| v).sum();
    assert!((total - 1.0).abs() < 1e-6, "importances sum to 1: {}", total);
}
