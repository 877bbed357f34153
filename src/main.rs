//! Testsuite driver CLI entry point

fn main() {
    // Initialize structured logging with env-based filter, defaulting to info
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter())),
        )
        .with_target(false)
        .try_init();

    regtest_driver::cli::run();
}

/// `-v`/`--verbose` also raises the default log level so launched command lines are visible.
fn default_filter() -> &'static str {
    if std::env::args().any(|a| a == "-v" || a == "--verbose") {
        "debug"
    } else {
        "info"
    }
}
