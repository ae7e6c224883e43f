//! interp-bench - Application Entry Point

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use interp_bench::{benchmark, config::Config, constants::DEFAULT_RUST_LOG};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Logs go to stderr so stdout only carries the report.
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_new(&config.logging.rust_log)
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_RUST_LOG)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!(
        iterations = config.benchmark.iterations,
        timeout = ?config.benchmark.timeout,
        log_file = %config.benchmark.log_file.display(),
        "Starting interp-bench"
    );

    let aggregates = benchmark::run(&config).await?;

    tracing::info!(reported = aggregates.len(), "Benchmark complete");
    Ok(())
}
