use chrono::NaiveDate;
use stowage_core::constants::CLI_DATE_FORMAT;

/// Parse a `DD/MM/YYYY` date as given on the command line.
pub fn parse_cli_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), CLI_DATE_FORMAT)
        .map_err(|e| format!("expected DD/MM/YYYY, got {:?}: {}", value, e))
}

/// Initialize tracing for CLI binaries.
///
/// `LOG_FORMAT=json` switches to JSON lines for log shipping.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
