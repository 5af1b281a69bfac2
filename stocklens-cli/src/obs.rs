//! Logging setup.

/// Install the global subscriber. `STOCKLENS_LOG` overrides `log_level`.
/// Logs go to stderr so `--json` output on stdout stays clean.
pub fn init_tracing(log_level: &str, log_format: &str) -> Result<(), String> {
    let filter = std::env::var("STOCKLENS_LOG").unwrap_or_else(|_| log_level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|err| format!("invalid log filter: {err}"))?;

    let format = log_format.trim().to_lowercase();
    match format.as_str() {
        "json" => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .json()
            .init(),
        "text" => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init(),
        other => return Err(format!("unknown log format '{other}' (expected text or json)")),
    }
    Ok(())
}
