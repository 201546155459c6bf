//! suiterun CLI entry point

fn main() {
    // Diagnostics only: user-facing output goes through the harness log sinks on stdout
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();

    suiterun::cli::run();
}
