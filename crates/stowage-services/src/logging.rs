use stowage_core::{AppError, LogLevel};

/// Log `error` at the level it declares for itself.
pub fn log_app_error(error: &AppError, message: &str) {
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_code = error.error_code(), "{}", message)
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_code = error.error_code(), "{}", message)
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_code = error.error_code(), "{}", message)
        }
    }
}
