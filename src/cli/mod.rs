//! Tender ML CLI Module
//!
//! Command-line interface for training, prediction, routing and data
//! preparation.

use clap::{Parser, Subcommand};
use colored::*;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::data::{
    clean, code_statistics, engineer, filter_modeling_rows, load_dataframe, validate_contract,
    write_dataframe,
};
use crate::data::prepare::string_rows;
use crate::inference::{BidPredictor, PredictorConfig, ReviewCategory};
use crate::training::run_baselines;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString {
    s.truecolor(100, 100, 100)
}
fn accent(s: &str) -> ColoredString {
    s.truecolor(120, 170, 255)
}
fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}
fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "tender-ml")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Recall-first tender bid prediction and review routing")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train the bid predictor on labelled data
    Train {
        /// Input data file (CSV, JSON, or Parquet)
        #[arg(short, long)]
        data: PathBuf,

        /// Output model artifact
        #[arg(short, long, default_value = "bid_model.json")]
        output: PathBuf,

        /// Decision threshold for flagging a bid
        #[arg(long, default_value = "0.05")]
        threshold: f64,

        /// Number of trees in the forest
        #[arg(long, default_value = "50")]
        n_estimators: usize,

        /// Maximum tree depth
        #[arg(long, default_value = "8")]
        max_depth: usize,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Score tenders with a trained model
    Predict {
        /// Trained model artifact
        #[arg(short, long)]
        model: PathBuf,

        /// Input data file
        #[arg(short, long)]
        data: PathBuf,

        /// Output predictions file (CSV or Parquet)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Route tenders into review buckets
    Route {
        /// Trained model artifact
        #[arg(short, long)]
        model: PathBuf,

        /// Input data file
        #[arg(short, long)]
        data: PathBuf,

        /// Output decisions file (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Cross-validate the text-only baseline pipelines
    Baselines {
        /// Input data file with bid labels
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Clean a raw extract and engineer analysis columns
    Prepare {
        /// Input data file
        #[arg(short, long)]
        data: PathBuf,

        /// Output file (CSV or Parquet)
        #[arg(short, long)]
        output: PathBuf,

        /// Keep only rows with a bid label
        #[arg(long)]
        labelled_only: bool,

        /// Keep only rows that pass the modeling filters
        #[arg(long)]
        modeling_only: bool,

        /// Minimum PDF text length for the modeling subset
        #[arg(long, default_value = "10")]
        min_text_chars: usize,

        /// Minimum detected codes for the modeling subset
        #[arg(long, default_value = "0")]
        min_codes: i64,
    },

    /// Inspect a data file or a trained model artifact
    Info {
        /// Input data file
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Trained model artifact
        #[arg(short, long)]
        model: Option<PathBuf>,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(
    data_path: &PathBuf,
    output: &PathBuf,
    threshold: f64,
    n_estimators: usize,
    max_depth: usize,
    seed: u64,
) -> anyhow::Result<()> {
    section("Train");

    step_run("Loading data");
    let start = Instant::now();
    let df = load_dataframe(data_path)?;
    step_done(&format!(
        "{} rows × {} cols in {:?}",
        df.height(),
        df.width(),
        start.elapsed()
    ));

    step_run("Cleaning");
    let df = clean(&df, true)?;
    step_done(&format!("{} labelled rows", df.height()));

    let config = PredictorConfig::new()
        .with_threshold(threshold)
        .with_n_estimators(n_estimators)
        .with_max_depth(max_depth)
        .with_random_state(seed);
    let mut predictor = BidPredictor::new(config)?;

    step_run("Training random forest");
    let start = Instant::now();
    let metrics = predictor.train(&df)?;
    step_done(&format!("{:?}", start.elapsed()));

    println!();
    println!(
        "  {:<16} {}",
        muted("AUC"),
        format!("{:.3}", metrics.auc).white().bold()
    );
    println!(
        "  {:<16} {}",
        muted("Recall"),
        format!("{:.1}%", metrics.recall * 100.0).white()
    );
    println!(
        "  {:<16} {}",
        muted("Precision"),
        format!("{:.1}%", metrics.precision * 100.0).white()
    );
    println!("  {:<16} {}", muted("F1"), format!("{:.3}", metrics.f1).white());
    println!(
        "  {:<16} {}",
        muted("Missed bids"),
        metrics.false_negatives.to_string().white()
    );
    println!(
        "  {:<16} {}",
        muted("Bid rate"),
        format!("{:.1}%", metrics.bid_rate * 100.0).white()
    );
    println!(
        "  {:<16} {}",
        muted("Threshold"),
        format!("{:.3}", metrics.threshold).white()
    );

    section("Feature importance");
    for (name, importance) in metrics.feature_importance.iter().take(10) {
        println!("  {:<20} {:>8.4}", name, importance);
    }

    println!();
    step_run(&format!("Saving → {}", output.display()));
    predictor.save(output)?;
    step_done("artifact written");
    println!();

    Ok(())
}

pub fn cmd_predict(
    model_path: &PathBuf,
    data_path: &PathBuf,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    section("Predict");

    step_run("Loading model");
    let predictor = BidPredictor::load(model_path)?;
    let trained = predictor
        .trained_at()
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string());
    step_done(&format!("trained {}", trained));

    step_run("Loading data");
    let df = load_dataframe(data_path)?;
    step_done(&format!("{} rows", df.height()));

    let df = clean(&df, false)?;
    let predictions = predictor.predict(&df)?;

    let flagged = predictions.iter().filter(|p| p.bid).count();
    let mean_probability = if predictions.is_empty() {
        0.0
    } else {
        predictions.iter().map(|p| p.probability).sum::<f64>() / predictions.len() as f64
    };

    println!();
    println!(
        "  {:<16} {}",
        muted("Records"),
        predictions.len().to_string().white()
    );
    println!(
        "  {:<16} {}",
        muted("Flagged bids"),
        flagged.to_string().white().bold()
    );
    println!(
        "  {:<16} {}",
        muted("Mean p(bid)"),
        format!("{:.3}", mean_probability).white()
    );
    println!();

    if let Some(path) = output {
        let titles = string_rows(&df, "title")?;
        let mut out = df! {
            "title" => titles,
            "probability" => predictions.iter().map(|p| p.probability).collect::<Vec<f64>>(),
            "bid" => predictions.iter().map(|p| p.bid).collect::<Vec<bool>>(),
            "confidence" => predictions.iter().map(|p| p.confidence).collect::<Vec<f64>>(),
        }?;
        write_dataframe(&mut out, path)?;
        step_ok(&format!("predictions written to {}", path.display()));
        println!();
    }

    Ok(())
}

pub fn cmd_route(
    model_path: &PathBuf,
    data_path: &PathBuf,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    section("Route");

    step_run("Loading model");
    let predictor = BidPredictor::load(model_path)?;
    step_done("artifact loaded");

    step_run("Loading data");
    let df = load_dataframe(data_path)?;
    step_done(&format!("{} rows", df.height()));

    let df = clean(&df, false)?;
    let decisions = predictor.triage(&df)?;

    let manual = decisions
        .iter()
        .filter(|d| d.category == ReviewCategory::NoPdfData)
        .count();
    let urgent = decisions
        .iter()
        .filter(|d| d.category == ReviewCategory::PredictedBid)
        .count();
    let low = decisions
        .iter()
        .filter(|d| d.category == ReviewCategory::PredictedNoBid)
        .count();

    println!();
    println!(
        "  {:<16} {}",
        muted("Manual review"),
        manual.to_string().white()
    );
    println!(
        "  {:<16} {}",
        muted("Urgent bids"),
        urgent.to_string().white().bold()
    );
    println!("  {:<16} {}", muted("Low priority"), low.to_string().white());

    section("Notifications");
    for decision in decisions.iter().take(5) {
        println!("  {}", decision.message);
    }
    if decisions.len() > 5 {
        println!("  {}", dim(&format!("… {} more", decisions.len() - 5)));
    }
    println!();

    if let Some(path) = output {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, &decisions)?;
        step_ok(&format!("decisions written to {}", path.display()));
        println!();
    }

    Ok(())
}

pub fn cmd_baselines(data_path: &PathBuf) -> anyhow::Result<()> {
    section("Baselines");

    step_run("Loading data");
    let df = load_dataframe(data_path)?;
    step_done(&format!("{} rows", df.height()));

    step_run("Cleaning");
    let df = clean(&df, true)?;
    step_done(&format!("{} labelled rows", df.height()));

    step_run("Cross-validating 3 pipelines");
    let start = Instant::now();
    let scores = run_baselines(&df)?;
    step_done(&format!("{:?}", start.elapsed()));

    println!();
    for score in &scores {
        println!("  {}", score.report_line());
    }
    println!();

    Ok(())
}

pub fn cmd_prepare(
    data_path: &PathBuf,
    output: &PathBuf,
    labelled_only: bool,
    modeling_only: bool,
    min_text_chars: usize,
    min_codes: i64,
) -> anyhow::Result<()> {
    section("Prepare");

    step_run("Loading data");
    let raw = load_dataframe(data_path)?;
    step_done(&format!("{} rows × {} cols", raw.height(), raw.width()));

    step_run("Cleaning");
    let cleaned = clean(&raw, labelled_only)?;
    step_done(&format!("{} rows", cleaned.height()));

    step_run("Engineering columns");
    let mut df = engineer(&cleaned)?;
    step_done(&format!("{} cols", df.width()));

    if modeling_only {
        df = filter_modeling_rows(&df, min_text_chars, min_codes)?;
        step_ok(&format!("{} rows pass the modeling filters", df.height()));
    }

    if df.column("detected_codes").is_ok() {
        let stats = code_statistics(&df)?;
        if stats.height() > 0 {
            section("Top detected codes");
            let codes = stats.column("code")?.as_materialized_series().str()?.clone();
            let freqs = stats
                .column("frequency")?
                .as_materialized_series()
                .u32()?
                .clone();
            let pcts = stats
                .column("percentage")?
                .as_materialized_series()
                .f64()?
                .clone();
            for i in 0..stats.height().min(10) {
                println!(
                    "  {:<16} {:>8} {:>8.1}%",
                    codes.get(i).unwrap_or(""),
                    freqs.get(i).unwrap_or(0),
                    pcts.get(i).unwrap_or(0.0)
                );
            }
        }
    }

    println!();
    step_run(&format!("Saving → {}", output.display()));
    write_dataframe(&mut df, output)?;
    step_done(&format!("{} rows × {} cols", df.height(), df.width()));
    println!();

    Ok(())
}

pub fn cmd_info(data_path: Option<&PathBuf>, model_path: Option<&PathBuf>) -> anyhow::Result<()> {
    if data_path.is_none() && model_path.is_none() {
        anyhow::bail!("provide --data and/or --model to inspect");
    }

    if let Some(data_path) = data_path {
        section("Data Info");

        let df = load_dataframe(data_path)?;

        println!("  {:<12} {}", muted("File"), data_path.display());
        println!("  {:<12} {}", muted("Rows"), df.height());
        println!("  {:<12} {}", muted("Columns"), df.width());
        println!(
            "  {:<12} {:.2} MB",
            muted("Memory"),
            df.estimated_size() as f64 / 1024.0 / 1024.0
        );
        println!();

        match validate_contract(&df, false) {
            Ok(_) => step_ok("contract columns present"),
            Err(e) => println!("  {} {}", "✗".red(), e),
        }
        match validate_contract(&df, true) {
            Ok(_) => step_ok("pdf enrichment columns present"),
            Err(_) => println!("  {}", "pdf enrichment columns missing".yellow()),
        }
        println!();

        println!(
            "  {:<20} {:<12} {:>6} {:>8}",
            muted("Column"),
            muted("Type"),
            muted("Nulls"),
            muted("Unique")
        );
        println!("  {}", dim(&"─".repeat(50)));

        for col in df.get_columns() {
            println!(
                "  {:<20} {:<12} {:>6} {:>8}",
                col.name(),
                format!("{:?}", col.dtype()).truecolor(140, 140, 140),
                col.null_count(),
                col.n_unique().unwrap_or(0)
            );
        }

        println!();
    }

    if let Some(model_path) = model_path {
        section("Model Info");

        let predictor = BidPredictor::load(model_path)?;
        let config = predictor.config();

        println!("  {:<12} {}", muted("File"), model_path.display());
        match predictor.trained_at() {
            Some(at) => println!(
                "  {:<12} {}",
                muted("Trained"),
                at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            None => println!("  {:<12} {}", muted("Trained"), "never".yellow()),
        }
        println!(
            "  {:<12} {}",
            muted("Threshold"),
            format!("{:.3}", config.prediction_threshold)
        );
        println!("  {:<12} {}", muted("Trees"), config.n_estimators);
        println!(
            "  {:<12} {}",
            muted("Max depth"),
            config
                .max_depth
                .map_or("unlimited".to_string(), |d| d.to_string())
        );
        println!(
            "  {:<12} {}",
            muted("Seed"),
            config
                .random_state
                .map_or("entropy".to_string(), |s| s.to_string())
        );
        println!(
            "  {:<12} {}",
            muted("Features"),
            predictor.feature_names().len()
        );

        if let Some(metrics) = predictor.metrics() {
            println!();
            println!(
                "  {:<16} {}",
                muted("AUC"),
                format!("{:.3}", metrics.auc).white().bold()
            );
            println!(
                "  {:<16} {}",
                muted("Recall"),
                format!("{:.1}%", metrics.recall * 100.0).white()
            );
            println!(
                "  {:<16} {}",
                muted("Precision"),
                format!("{:.1}%", metrics.precision * 100.0).white()
            );
            println!(
                "  {:<16} {}",
                muted("F1"),
                format!("{:.3}", metrics.f1).white()
            );
            println!(
                "  {:<16} {}",
                muted("Missed bids"),
                metrics.false_negatives.to_string().white()
            );
            println!(
                "  {:<16} {}",
                muted("Samples"),
                metrics.total_samples.to_string().white()
            );
        }

        if let Some(importance) = predictor.feature_importance() {
            section("Feature importance");
            for (name, value) in importance.iter().take(10) {
                println!("  {:<20} {:>8.4}", name, value);
            }
        }

        println!();
    }

    Ok(())
}
