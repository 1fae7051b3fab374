/// Default log filter expression used by the dispatcher.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default path prefix that tags a segment with the view namespace.
pub const DEFAULT_VIEW_PREFIX: &str = "@@";

/// Default log filter expression used by the dispatcher.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Default view-namespace prefix.
pub fn default_view_prefix() -> &'static str {
    DEFAULT_VIEW_PREFIX
}

/// Owned view-namespace prefix used where allocation is required.
pub fn default_view_prefix_string() -> String {
    DEFAULT_VIEW_PREFIX.to_owned()
}
