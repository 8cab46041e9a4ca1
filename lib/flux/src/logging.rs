//! Terminal logging setup built on `slog`/`sloggers`.

pub use slog::{self, debug, error, info, o, trace, warn, Logger};

use sloggers::types::Severity;
use sloggers::{Build, Config, LoggerConfig};

/// Builds a root logger writing to stderr at the given severity level.
///
/// `level` accepts the same strings `sloggers` accepts: "trace", "debug",
/// "info", "warning", "error", "critical".
pub fn init(level: &str) -> Logger {
    let toml = format!(
        r#"
type = "terminal"
level = "{}"
destination = "stderr"
"#,
        level
    );

    let config: LoggerConfig = serdeconv::from_toml_str(&toml).expect("invalid logging config");
    config.build_logger().expect("failed to build logger")
}

/// Builds a root logger at the default "info" severity.
pub fn init_default() -> Logger {
    init("info")
}

/// Parses a severity string the same way `init` does, for validating CLI input early.
pub fn parse_severity(level: &str) -> Result<Severity, String> {
    level.parse().map_err(|_| format!("unknown log level: {}", level))
}
