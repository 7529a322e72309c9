//! CLI entry point for the earnings-extremum pipeline
//!
//! Provides commands to prepare the enriched target table, train the
//! gradient-boosted models, and evaluate their predictions.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use earnings_gbm::config::Config;
use earnings_gbm::data::DataLoader;
use earnings_gbm::evaluation::{evaluate_table, print_report, save_reports, PredictionTable};
use earnings_gbm::features::FeatureEngineer;
use earnings_gbm::models::TargetModelSet;
use earnings_gbm::targets::{enrich_all_tickers, OutlierFilter, TargetGenerator};

#[derive(Parser)]
#[command(name = "earnings_gbm")]
#[command(about = "Inter-earnings price extremum prediction pipeline", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    InitConfig,

    /// Generate the enriched target table from market and earnings data
    Prepare,

    /// Train the models on the prepared table and save predictions
    Train,

    /// Evaluate a saved predictions file
    Evaluate,

    /// Run prepare, train, and evaluate in sequence
    Pipeline,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("earnings_gbm=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::InitConfig => {
            Config::create_default(&cli.config)?;
            info!("Wrote default configuration to {}", cli.config);
            Ok(())
        }
        Commands::Prepare => {
            let config = Config::load(&cli.config)?;
            prepare(&config)
        }
        Commands::Train => {
            let config = Config::load(&cli.config)?;
            train(&config)
        }
        Commands::Evaluate => {
            let config = Config::load(&cli.config)?;
            evaluate(&config)
        }
        Commands::Pipeline => {
            let config = Config::load(&cli.config)?;
            prepare(&config)?;
            train(&config)?;
            evaluate(&config)
        }
    }
}

/// Load raw data, generate extremum targets, drop outliers, save
fn prepare(config: &Config) -> Result<()> {
    let mut prices = DataLoader::load_market(&config.data.market_file)?;
    prices.retain(|p| p.date >= config.data.start_date && p.date <= config.data.end_date);

    if let Some(path) = &config.data.selected_tickers_file {
        let selected = DataLoader::load_selected_tickers(path)?;
        prices = DataLoader::filter_by_tickers(prices, &selected);
    }

    let events = DataLoader::load_earnings_dir(&config.data.eps_dir)?;

    let enriched = enrich_all_tickers(&prices, &events, &TargetGenerator::new());

    let (lower, upper) = config.targets.outlier_threshold;
    let filter = OutlierFilter::new(config.targets.columns.clone(), lower, upper);
    let clean = filter.apply(enriched);

    DataLoader::save_enriched(&clean, &config.data.processed_file)?;
    Ok(())
}

/// Build features from the prepared table, train per-target models, and
/// save predictions for both the train and test periods
fn train(config: &Config) -> Result<()> {
    let mut prices = DataLoader::load_market(&config.data.market_file)?;
    prices.retain(|p| p.date >= config.data.start_date && p.date <= config.data.end_date);

    let enriched = DataLoader::load_enriched(&config.data.processed_file)?;

    let engineer = FeatureEngineer::with_config(config.features.clone());
    let dataset = engineer.build_dataset(&prices, &enriched, &config.targets.columns);

    let (train_set, test_set) = dataset.split_at_date(config.data.cutoff_date);
    info!(
        "Using {} as the cutoff date: {} train samples, {} test samples",
        config.data.cutoff_date,
        train_set.len(),
        test_set.len()
    );

    let mut models = TargetModelSet::new(config.model.clone());
    models.fit(&train_set)?;

    for (name, slice) in [("Train", &train_set), ("Test", &test_set)] {
        println!("{}:", name);
        for (target, metrics) in models.evaluate(slice)? {
            println!(
                "  {}: RMSE {:.4}, MAE {:.4}",
                target,
                metrics.rmse.unwrap_or(f64::NAN),
                metrics.mae.unwrap_or(f64::NAN)
            );
        }
    }

    // Predictions for the full dataset, split again at evaluation time
    let predictions = models.predict(&dataset)?;
    let table = PredictionTable::from_predictions(&dataset, &predictions);
    table.save_csv(&config.data.predictions_file)?;

    Ok(())
}

/// Report metrics, sign accuracy, and threshold analysis on a saved
/// predictions file
fn evaluate(config: &Config) -> Result<()> {
    let table = PredictionTable::load_csv(&config.data.predictions_file)?;
    let (train_table, test_table) = table.split_at_date(config.data.cutoff_date);

    let reports = vec![
        evaluate_table(&train_table, "Train"),
        evaluate_table(&test_table, "Test"),
    ];
    for report in &reports {
        print_report(report);
    }

    if let Some(path) = &config.data.report_file {
        save_reports(&reports, path)?;
    }

    Ok(())
}
