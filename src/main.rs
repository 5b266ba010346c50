use anyhow::{Context, Result};
use clap::Parser;
use hietaniemi_gym::{config::AppConfig, pipeline};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "hietaniemi-gym")]
#[command(about = "Hietaniemi gym usage analysis - charts or model evaluation")]
struct Args {
    /// Deployment stage; selects the `.env.<stage>` file
    #[arg(long, default_value = "dev")]
    stage: String,

    /// Run the prediction pipeline instead of the analysis charts
    #[arg(long)]
    predict: bool,
}

fn log_filter(directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
        .parse_lossy(directives)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = AppConfig::load(&args.stage).context("Failed to load configuration")?;

    // Initialize logging: stderr plus one file per run
    let directives = std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.filter.clone());
    let log_file_name = chrono::Local::now()
        .format("log_%Y-%m-%d_%H-%M-%S.log")
        .to_string();
    std::fs::create_dir_all(&config.logging.log_dir).with_context(|| {
        format!(
            "Failed to create log directory {}",
            config.logging.log_dir.display()
        )
    })?;
    let file_appender = tracing_appender::rolling::never(&config.logging.log_dir, &log_file_name);
    let (file_writer, _file_guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(log_filter(&directives)),
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer)
                .with_filter(log_filter(&directives)),
        )
        .init();

    tracing::info!(
        "Starting Hietaniemi gym ({} stage), logging to {}",
        args.stage,
        config.logging.log_dir.join(&log_file_name).display()
    );

    let result = run(&args, &config);
    if let Err(e) = &result {
        tracing::error!("Run failed: {:#}", e);
    }
    result
}

fn run(args: &Args, config: &AppConfig) -> Result<()> {
    let data = &config.data;
    if args.predict {
        let report = pipeline::predict_pipeline(
            &data.gym_data_path,
            &data.weather_data_path,
            &data.model_path,
            config,
        )?;
        tracing::info!(
            "Scored {} hourly predictions: RMSE {:.3}, R^2 {:.3}",
            report.predictions.len(),
            report.metrics.rmse,
            report.metrics.r2
        );
    } else {
        let enriched =
            pipeline::data_analysis_pipeline(&data.gym_data_path, &data.weather_data_path, config)?;
        tracing::info!("Analysed {} hourly rows", enriched.len());
    }

    Ok(())
}
