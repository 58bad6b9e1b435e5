//! This module provides observability hooks for the superimposition engine
//! and the codec capability advisor.
//!
//! The engine makes several silent decisions per column (fast path, merge
//! strategy, whether a sanitization rewrite is needed). This module provides
//! structured logging to make those decisions transparent and debuggable.
//! The `log_metric!` macro is the primary tool.
//!
//! The macro routes through `log::debug!`, so it costs nothing unless a
//! logger with debug level enabled is installed.

/// Logs a structured key-value metric string at debug level.
///
/// # Example
/// ```
/// use stratum_core::log_metric;
/// let rewrites = 4;
/// log_metric!("event" = "sanitize_offsets", "rewrites" = &rewrites);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        if log::log_enabled!(log::Level::Debug) {
            // Collect each pair as a JSON string fragment
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+

            log::debug!("STRATUM_METRIC: {{ {} }}", parts.join(", "));
        }
    };
}
