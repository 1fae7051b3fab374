//! Layered configuration shared by the `taels` dispatcher and its hosts.
//!
//! Values are resolved with [`ortho_config`] in increasing precedence:
//! built-in defaults, a `.taels.toml` file (or the file named by
//! `TAELS_CONFIG_PATH`), `TAELS_*` environment variables and finally
//! command-line flags.

mod defaults;
mod logging;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_VIEW_PREFIX, default_log_filter, default_log_filter_string,
    default_log_format, default_view_prefix, default_view_prefix_string,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Runtime configuration for the publishing dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "TAELS")]
pub struct Config {
    /// Renders verbose diagnostics (with the error source chain) when error
    /// handling itself fails.
    pub debug: bool,
    /// `tracing` filter expression, e.g. `info` or `taels=debug`.
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Output format for structured logs.
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
    /// Path prefix mapped onto the view namespace (`/doc/@@edit`).
    #[ortho_config(default = defaults::default_view_prefix_string())]
    pub view_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            view_prefix: default_view_prefix_string(),
        }
    }
}

impl Config {
    /// Whether verbose error diagnostics are enabled.
    #[must_use]
    pub const fn debug(&self) -> bool {
        self.debug
    }

    /// The configured `tracing` filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// The configured log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// The prefix tagging a path segment with the view namespace.
    #[must_use]
    pub fn view_prefix(&self) -> &str {
        self.view_prefix.as_str()
    }
}
