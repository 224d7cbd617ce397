use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Terraform reads plugin logs from stderr and sets the verbosity via TF_LOG
pub const TF_LOG: &str = "TF_LOG";

/// Maps a TF_LOG value to an `EnvFilter` directive. Unset or unrecognised
/// values log at info.
pub fn filter_directive(tf_log: Option<&str>) -> &'static str {
    match tf_log.map(|v| v.trim().to_ascii_uppercase()).as_deref() {
        Some("TRACE") | Some("JSON") => "trace",
        Some("DEBUG") => "debug",
        Some("WARN") => "warn",
        Some("ERROR") => "error",
        Some("OFF") => "off",
        _ => "info",
    }
}

/// Installs the global subscriber. Calling it again is a no-op.
pub fn init_logging() {
    let tf_log = std::env::var(TF_LOG).ok();
    let filter = EnvFilter::new(filter_directive(tf_log.as_deref()));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(true)
                .compact(),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tf_log_levels_map_to_directives() {
        assert_eq!(filter_directive(Some("DEBUG")), "debug");
        assert_eq!(filter_directive(Some("trace")), "trace");
        assert_eq!(filter_directive(Some("JSON")), "trace");
        assert_eq!(filter_directive(Some("off")), "off");
        assert_eq!(filter_directive(Some("verbose")), "info");
        assert_eq!(filter_directive(None), "info");
    }

    #[test]
    fn init_is_idempotent() {
        init_logging();
        init_logging();
        tracing::info!("logging initialised twice without panicking");
    }
}
