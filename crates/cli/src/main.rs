//! # bike-demand
//!
//! Command-line pipeline for the bike-sharing demand model: clean and encode
//! raw rental data, train and evaluate regressors, and run batch predictions.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use data_cleaner::{prepare, FeatureScaler, PrepareOptions, ScalerKind, Table};
use demand_model::{
    compare_models, train_test_split, Dataset, ModelArtifact, ModelComparison, ModelKind,
    PredictionEngine, RegressionMetrics, TrainedModel,
};
use feature_encoder::{RawRecord, Schema};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bike-demand")]
#[command(about = "Bike-sharing demand pipeline", long_about = None)]
struct Cli {
    /// Log filter (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean and encode a raw rental CSV
    Prepare {
        /// Raw CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Processed CSV (encoded features followed by targets)
        #[arg(short, long)]
        output: PathBuf,

        /// Schema JSON to write
        #[arg(short, long)]
        schema: PathBuf,

        /// Scaler JSON to write
        #[arg(long)]
        scaler: Option<PathBuf>,

        /// Drop IQR outliers in the environmental columns
        #[arg(long)]
        drop_outliers: bool,

        /// Standardize instead of min-max scaling
        #[arg(long, conflicts_with = "no_scale")]
        standardize: bool,

        /// Leave environmental columns unscaled
        #[arg(long)]
        no_scale: bool,
    },

    /// Train a regressor on a processed CSV
    Train {
        /// Processed CSV
        #[arg(short, long)]
        data: PathBuf,

        /// Model artifact to write
        #[arg(short, long)]
        model: PathBuf,

        /// Model type (random-forest, decision-tree, gradient-boosting)
        #[arg(short, long, default_value = "random-forest")]
        algorithm: ModelKind,

        /// Fraction of rows held out for evaluation
        #[arg(long, default_value = "0.2")]
        test_size: f64,

        /// Seed for the split and the model
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Target column
        #[arg(short, long, default_value = "cnt")]
        target: String,
    },

    /// Train every model type on one split and compare held-out scores
    Compare {
        /// Processed CSV
        #[arg(short, long)]
        data: PathBuf,

        /// Fraction of rows held out for evaluation
        #[arg(long, default_value = "0.2")]
        test_size: f64,

        /// Seed for the split and the models
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Target column
        #[arg(short, long, default_value = "cnt")]
        target: String,
    },

    /// Evaluate a trained model on a processed CSV
    Evaluate {
        /// Processed CSV
        #[arg(short, long)]
        data: PathBuf,

        /// Model artifact
        #[arg(short, long)]
        model: PathBuf,
    },

    /// Predict one value per row of a feature CSV
    Predict {
        /// Model artifact
        #[arg(short, long)]
        model: PathBuf,

        /// CSV with the model's feature columns
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Encode a single raw record as a feature vector
    Encode {
        /// Schema (JSON array or processed CSV)
        #[arg(short, long)]
        schema: PathBuf,

        /// Record as a JSON object
        #[arg(short, long)]
        record: String,

        /// Scaler JSON to apply after encoding
        #[arg(long)]
        scaler: Option<PathBuf>,
    },
}

/// Features logged after training
const TOP_FEATURES: usize = 5;

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run_prepare(
    input: &Path,
    output: &Path,
    schema_path: &Path,
    scaler_path: Option<&Path>,
    options: &PrepareOptions,
) -> Result<()> {
    let raw = Table::load_csv(input).with_context(|| format!("reading {}", input.display()))?;
    let prepared = prepare(&raw, options)?;

    prepared.table.save_csv(output)?;
    prepared.schema.save_json(schema_path)?;
    match (&prepared.scaler, scaler_path) {
        (Some(scaler), Some(path)) => scaler.save(path)?,
        (None, Some(path)) => warn!("Scaling disabled; not writing {}", path.display()),
        _ => {}
    }

    info!(
        "Prepared {} of {} rows ({} columns) into {}",
        prepared.report.rows_out,
        prepared.report.rows_in,
        prepared.schema.len(),
        output.display()
    );
    println!("{}", serde_json::to_string_pretty(&prepared.report)?);
    Ok(())
}

fn run_train(
    data: &Path,
    model_path: &Path,
    kind: ModelKind,
    test_size: f64,
    seed: u64,
    target: &str,
) -> Result<RegressionMetrics> {
    let (dataset, schema) = Dataset::load_csv(data, target)?;
    let (train, test) = train_test_split(&dataset, test_size, seed)?;

    let model = TrainedModel::fit(kind, &train, seed)?;
    let metrics = RegressionMetrics::evaluate(&model, &test);
    info!("Held-out evaluation on {} rows", test.len());

    let artifact = ModelArtifact::new(model, schema, target).with_metrics(metrics);
    for (rank, (column, importance)) in artifact.ranked_features(TOP_FEATURES).iter().enumerate() {
        info!("Feature #{}: {} ({:.4})", rank + 1, column, importance);
    }
    artifact.save(model_path)?;
    println!("{metrics}");
    Ok(metrics)
}

fn comparison_table(results: &[ModelComparison]) -> String {
    let mut table = format!("{:<20} {:>12} {:>12} {:>8}\n", "Model", "MAE", "RMSE", "R2");
    for r in results {
        table.push_str(&format!(
            "{:<20} {:>12.4} {:>12.4} {:>8.4}\n",
            r.kind.as_str(),
            r.metrics.mae,
            r.metrics.rmse,
            r.metrics.r2
        ));
    }
    table
}

fn run_compare(data: &Path, test_size: f64, seed: u64, target: &str) -> Result<Vec<ModelComparison>> {
    let (dataset, _) = Dataset::load_csv(data, target)?;
    let results = compare_models(&dataset, test_size, seed)?;
    print!("{}", comparison_table(&results));
    Ok(results)
}

fn run_evaluate(data: &Path, model_path: &Path) -> Result<RegressionMetrics> {
    let artifact = ModelArtifact::load(model_path)?;
    let (dataset, schema) = Dataset::load_csv(data, &artifact.target)?;
    if schema != artifact.schema {
        warn!(
            "Data columns differ from the training schema ({} vs {})",
            schema.len(),
            artifact.schema.len()
        );
    }
    let metrics = RegressionMetrics::evaluate(&artifact.model, &dataset);
    println!("{metrics}");
    Ok(metrics)
}

/// Reorder each row to the model schema by header name; absent columns read as 0
fn feature_rows(table: &Table, schema: &Schema) -> Result<Vec<Vec<f64>>> {
    let positions: Vec<Option<usize>> = schema
        .columns()
        .iter()
        .map(|c| table.column_index(c))
        .collect();
    if positions.iter().all(Option::is_none) {
        bail!("input has none of the {} model columns", schema.len());
    }
    let missing = positions.iter().filter(|p| p.is_none()).count();
    if missing > 0 {
        warn!("{} model columns absent from input; filling with 0", missing);
    }

    Ok(table
        .rows()
        .iter()
        .map(|row| {
            positions
                .iter()
                .map(|p| {
                    p.and_then(|i| row.get(i))
                        .and_then(|cell| data_cleaner::to_numeric(cell))
                        .unwrap_or(0.0)
                })
                .collect()
        })
        .collect())
}

fn run_predict(model_path: &Path, input: &Path) -> Result<Vec<f64>> {
    let engine = PredictionEngine::from_artifact(ModelArtifact::load(model_path)?, None);
    let table = Table::load_csv(input)?;
    let rows = feature_rows(&table, engine.schema())?;

    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["prediction"])?;
    let mut predictions = Vec::with_capacity(rows.len());
    for row in &rows {
        let p = engine.predict_features(row)?;
        writer.write_record([format!("{:.4}", p.value)])?;
        predictions.push(p.value);
    }
    writer.flush()?;
    info!("Predicted {} rows", predictions.len());
    Ok(predictions)
}

fn run_encode(schema_path: &Path, record: &str, scaler_path: Option<&Path>) -> Result<Vec<f64>> {
    let schema = Schema::load(schema_path)?;
    let record: RawRecord = serde_json::from_str(record).context("record must be a JSON object")?;
    let mut vector = feature_encoder::encode_record(&record, &schema);
    if let Some(path) = scaler_path {
        FeatureScaler::load(path)?.apply(&schema, &mut vector.values);
    }
    println!("{}", serde_json::to_string(&vector.values)?);
    Ok(vector.values)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Prepare {
            input,
            output,
            schema,
            scaler,
            drop_outliers,
            standardize,
            no_scale,
        } => {
            let options = PrepareOptions {
                drop_outliers,
                scaler: match (no_scale, standardize) {
                    (true, _) => None,
                    (false, true) => Some(ScalerKind::Standard),
                    (false, false) => Some(ScalerKind::MinMax),
                },
                ..Default::default()
            };
            run_prepare(&input, &output, &schema, scaler.as_deref(), &options)
        }
        Commands::Train {
            data,
            model,
            algorithm,
            test_size,
            seed,
            target,
        } => run_train(&data, &model, algorithm, test_size, seed, &target).map(|_| ()),
        Commands::Compare {
            data,
            test_size,
            seed,
            target,
        } => run_compare(&data, test_size, seed, &target).map(|_| ()),
        Commands::Evaluate { data, model } => run_evaluate(&data, &model).map(|_| ()),
        Commands::Predict { model, input } => run_predict(&model, &input).map(|_| ()),
        Commands::Encode {
            schema,
            record,
            scaler,
        } => run_encode(&schema, &record, scaler.as_deref()).map(|_| ()),
    }
}
