//! Text-only baseline pipelines.
//!
//! Cheap reference classifiers scored with cross-validation. They operate on the
//! raw title and PDF text plus one-hot contracting-authority and procedure
//! columns, with no hand-built feature matrix, and exist to sanity-check the
//! feature-based model: if it cannot beat these, the features are not earning
//! their keep.

use ndarray::{concatenate, Array1, Array2, Axis};
use polars::prelude::*;
use tracing::info;

use crate::data::prepare::{optional_string_rows, string_rows};
use crate::error::{Result, TenderError};
use crate::feature_engineering::{HashingVectorizer, TfidfVectorizer};
use crate::training::cross_validation::{CVResults, CVStrategy, CrossValidator};
use crate::training::linear_models::{LinearSvc, LogisticRegression};
use crate::training::metrics::f1_score;
use crate::training::random_forest::ClassWeight;

/// Number of stratified folds used for every baseline.
pub const BASELINE_N_SPLITS: usize = 5;

/// Seed for the fold shuffle so repeated runs score the same splits.
pub const BASELINE_SEED: u64 = 42;

/// Output width of the hashing vectorizer pipeline.
pub const HASHING_FEATURES: usize = 4096;

#[derive(Debug, Clone, Copy)]
enum TextStage {
    Tfidf,
    Hashing,
}

#[derive(Debug, Clone, Copy)]
enum ModelStage {
    Logistic,
    Svm,
}

/// Cross-validated score for one baseline pipeline.
#[derive(Debug, Clone)]
pub struct BaselineScore {
    pub name: String,
    pub results: CVResults,
    pub n_samples: usize,
}

impl BaselineScore {
    /// One-line summary in the report format used by the CLI.
    pub fn report_line(&self) -> String {
        format!(
            "{:<25}  F1 = {:.3} ± {:.3}  (n={})",
            self.name, self.results.mean_score, self.results.std_score, self.n_samples
        )
    }
}

/// Score the three reference pipelines on a labelled frame.
///
/// Each pipeline is evaluated with the same stratified folds. Vectorizer
/// vocabularies and one-hot categories are learned from the training fold
/// only, so the reported F1 reflects genuinely held-out rows.
pub fn run_baselines(df: &DataFrame) -> Result<Vec<BaselineScore>> {
    let documents = combined_documents(df)?;
    let categorical = vec![
        optional_string_rows(df, "ca")?,
        optional_string_rows(df, "procedure")?,
    ];
    let y = bid_labels(df)?;

    let n_samples = documents.len();
    let positives = y.iter().filter(|&&v| v == 1.0).count();
    if positives == 0 || positives == n_samples {
        return Err(TenderError::ValidationError(
            "baselines need both bid outcomes in the labelled data".to_string(),
        ));
    }

    let splits = CrossValidator::new(CVStrategy::StratifiedKFold {
        n_splits: BASELINE_N_SPLITS,
        shuffle: true,
    })
    .with_random_state(BASELINE_SEED)
    .split(n_samples, Some(&y))?;

    let pipelines = [
        ("tfidf + logreg", TextStage::Tfidf, ModelStage::Logistic),
        ("tfidf + linear svm", TextStage::Tfidf, ModelStage::Svm),
        ("hashing + logreg", TextStage::Hashing, ModelStage::Logistic),
    ];

    let mut scored = Vec::with_capacity(pipelines.len());
    for (name, text, model) in pipelines {
        let mut fold_scores = Vec::with_capacity(splits.len());
        for split in &splits {
            let train_docs = gather(&documents, &split.train_indices);
            let test_docs = gather(&documents, &split.test_indices);
            let (text_train, text_test) = vectorize(text, &train_docs, &test_docs)?;

            let vocabularies = fold_vocabularies(&categorical, &split.train_indices);
            let cat_train = one_hot_block(&categorical, &vocabularies, &split.train_indices);
            let cat_test = one_hot_block(&categorical, &vocabularies, &split.test_indices);

            let x_train = concatenate(Axis(1), &[text_train.view(), cat_train.view()])?;
            let x_test = concatenate(Axis(1), &[text_test.view(), cat_test.view()])?;
            let y_train: Array1<f64> = split.train_indices.iter().map(|&i| y[i]).collect();
            let y_test: Array1<f64> = split.test_indices.iter().map(|&i| y[i]).collect();

            let y_pred = fit_predict(model, &x_train, &y_train, &x_test)?;
            fold_scores.push(f1_score(&y_test, &y_pred));
        }

        let results = CVResults::from_scores(fold_scores);
        info!(
            baseline = name,
            mean_f1 = results.mean_score,
            std_f1 = results.std_score,
            "baseline cross-validation complete"
        );
        scored.push(BaselineScore {
            name: name.to_string(),
            results,
            n_samples,
        });
    }

    Ok(scored)
}

/// Title and PDF text joined into one document per row.
fn combined_documents(df: &DataFrame) -> Result<Vec<String>> {
    let titles = string_rows(df, "title")?;
    let texts = optional_string_rows(df, "pdf_text")?;
    Ok(titles
        .iter()
        .zip(&texts)
        .map(|(title, text)| format!("{} {}", title, text).trim().to_string())
        .collect())
}

fn bid_labels(df: &DataFrame) -> Result<Array1<f64>> {
    let column = df
        .column("bid")
        .map_err(|_| TenderError::ColumnNotFound("bid".to_string()))?;
    let series = column.as_materialized_series();
    if series.null_count() > 0 {
        return Err(TenderError::ValidationError(
            "bid column contains nulls; baselines need fully labelled rows".to_string(),
        ));
    }
    let values = series.cast(&DataType::Float64)?;
    Ok(values.f64()?.into_iter().flatten().collect())
}

fn gather(documents: &[String], indices: &[usize]) -> Vec<String> {
    indices.iter().map(|&i| documents[i].clone()).collect()
}

fn vectorize(
    stage: TextStage,
    train_docs: &[String],
    test_docs: &[String],
) -> Result<(Array2<f64>, Array2<f64>)> {
    match stage {
        TextStage::Tfidf => {
            let mut vectorizer = TfidfVectorizer::new().with_min_df(3).with_ngram_range(1, 2);
            let train = vectorizer.fit_transform(train_docs)?;
            let test = vectorizer.transform(test_docs)?;
            Ok((train, test))
        }
        TextStage::Hashing => {
            let vectorizer = HashingVectorizer::new(HASHING_FEATURES);
            Ok((vectorizer.transform(train_docs), vectorizer.transform(test_docs)))
        }
    }
}

/// Sorted distinct values of each categorical column within the training fold.
fn fold_vocabularies(columns: &[Vec<String>], train_indices: &[usize]) -> Vec<Vec<String>> {
    columns
        .iter()
        .map(|values| {
            let mut vocab: Vec<String> =
                train_indices.iter().map(|&i| values[i].clone()).collect();
            vocab.sort();
            vocab.dedup();
            vocab
        })
        .collect()
}

/// Binary membership block for the given rows. Values outside the training
/// vocabulary leave their row segment at zero.
fn one_hot_block(
    columns: &[Vec<String>],
    vocabularies: &[Vec<String>],
    rows: &[usize],
) -> Array2<f64> {
    let width: usize = vocabularies.iter().map(|v| v.len()).sum();
    let mut block = Array2::zeros((rows.len(), width));
    for (i, &row) in rows.iter().enumerate() {
        let mut offset = 0;
        for (values, vocab) in columns.iter().zip(vocabularies) {
            if let Ok(pos) = vocab.binary_search(&values[row]) {
                block[[i, offset + pos]] = 1.0;
            }
            offset += vocab.len();
        }
    }
    block
}

fn fit_predict(
    stage: ModelStage,
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
) -> Result<Array1<f64>> {
    match stage {
        ModelStage::Logistic => {
            let mut model = LogisticRegression::new().with_class_weight(ClassWeight::Balanced);
            model.fit(x_train, y_train)?;
            model.predict(x_test)
        }
        ModelStage::Svm => {
            let mut model = LinearSvc::new().with_class_weight(ClassWeight::Balanced);
            model.fit(x_train, y_train)?;
            model.predict(x_test)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable_frame(rows: usize) -> DataFrame {
        let half = rows / 2;
        let titles: Vec<String> = (0..rows)
            .map(|i| {
                if i < half {
                    "bespoke software development services".to_string()
                } else {
                    "road construction works maintenance".to_string()
                }
            })
            .collect();
        let texts: Vec<String> = (0..rows)
            .map(|i| {
                if i < half {
                    "software platform support services for computer systems".to_string()
                } else {
                    "asphalt resurfacing works for the regional road network".to_string()
                }
            })
            .collect();
        let cas: Vec<String> = (0..rows)
            .map(|i| {
                if i < half {
                    "Department of Digital Services".to_string()
                } else {
                    "Highways Agency".to_string()
                }
            })
            .collect();
        let procedures: Vec<String> = (0..rows).map(|_| "Open Procedure".to_string()).collect();
        let bids: Vec<i64> = (0..rows).map(|i| if i < half { 1 } else { 0 }).collect();

        df! {
            "title" => titles,
            "pdf_text" => texts,
            "ca" => cas,
            "procedure" => procedures,
            "bid" => bids,
        }
        .unwrap()
    }

    #[test]
    fn test_baselines_score_separable_data() {
        let df = separable_frame(30);
        let scores = run_baselines(&df).unwrap();

        assert_eq!(scores.len(), 3);
        for score in &scores {
            assert_eq!(score.n_samples, 30);
            assert_eq!(score.results.n_folds, BASELINE_N_SPLITS);
            assert!(score.results.mean_score >= 0.0 && score.results.mean_score <= 1.0);
        }
        let tfidf_logreg = &scores[0];
        assert_eq!(tfidf_logreg.name, "tfidf + logreg");
        assert!(
            tfidf_logreg.results.mean_score > 0.6,
            "tfidf + logreg should separate disjoint vocabularies, got {}",
            tfidf_logreg.results.mean_score
        );
    }

    #[test]
    fn test_baselines_reject_single_class() {
        let df = df! {
            "title" => ["software services", "software platform", "software support"],
            "pdf_text" => ["software", "software", "software"],
            "ca" => ["A", "A", "B"],
            "procedure" => ["Open", "Open", "Open"],
            "bid" => [1i64, 1, 1],
        }
        .unwrap();

        let err = run_baselines(&df).unwrap_err();
        assert!(matches!(err, TenderError::ValidationError(_)));
    }

    #[test]
    fn test_baselines_reject_null_labels() {
        let df = df! {
            "title" => ["a", "b"],
            "pdf_text" => ["x", "y"],
            "ca" => ["A", "B"],
            "procedure" => ["Open", "Open"],
            "bid" => [Some(1i64), None],
        }
        .unwrap();

        let err = run_baselines(&df).unwrap_err();
        assert!(matches!(err, TenderError::ValidationError(_)));
    }

    #[test]
    fn test_report_line_format() {
        let score = BaselineScore {
            name: "tfidf + logreg".to_string(),
            results: CVResults::from_scores(vec![0.6, 0.6, 0.6]),
            n_samples: 42,
        };
        let line = score.report_line();
        assert_eq!(&line[..25], "tfidf + logreg           ");
        assert!(line.contains("F1 = 0.600 ± 0.000"));
        assert!(line.ends_with("(n=42)"));
    }

    #[test]
    fn test_one_hot_block_zeroes_unseen_values() {
        let columns = vec![vec![
            "alpha".to_string(),
            "beta".to_string(),
            "gamma".to_string(),
        ]];
        let vocabularies = fold_vocabularies(&columns, &[0, 1]);
        assert_eq!(vocabularies[0], vec!["alpha", "beta"]);

        let train = one_hot_block(&columns, &vocabularies, &[0, 1]);
        assert_eq!(train.shape(), &[2, 2]);
        assert_eq!(train[[0, 0]], 1.0);
        assert_eq!(train[[1, 1]], 1.0);

        let test = one_hot_block(&columns, &vocabularies, &[2]);
        assert_eq!(test.shape(), &[1, 2]);
        assert!(test.row(0).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_combined_documents_joins_title_and_text() {
        let df = df! {
            "title" => ["Software tender", "Road works"],
            "pdf_text" => ["full specification text", ""],
        }
        .unwrap();

        let docs = combined_documents(&df).unwrap();
        assert_eq!(docs[0], "Software tender full specification text");
        assert_eq!(docs[1], "Road works");
    }
}
