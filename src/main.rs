use bitso_capture::cli::{Cli, Commands};
use bitso_capture::config::Config;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        toml::from_str(include_str!("../config.toml.example")).expect("Invalid default config")
    });

    // Initialize telemetry
    let _guard = bitso_capture::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Capture(args) => {
            tracing::info!("Starting spread capture");
            args.execute(&config).await?;
        }
        Commands::Status(args) => {
            args.execute(&config)?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  API: {}", config.api.base_url);
            println!("  Books: {}", config.capture.books.join(", "));
            println!(
                "  Run shape: {} requests/partition x {} cycles, tick {}ms",
                config.capture.requests_per_partition,
                config.capture.progress_cycles,
                config.capture.tick_interval_ms
            );
            println!(
                "  Start: minute {} with {}s stagger",
                config.capture.align_minute, config.capture.stagger_secs
            );
            println!("  Lake root: {}", config.data.lake_root.display());
            match config.telemetry.metrics_port {
                Some(port) => println!("  Metrics: port {port}"),
                None => println!("  Metrics: disabled"),
            }
        }
    }

    Ok(())
}
