use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub enum TelemetryError {
    EnvFilter { value: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, .. } => {
                write!(f, "invalid log level/filter '{value}'")
            }
            TelemetryError::Subscriber(err) => write!(f, "unable to install subscriber: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::EnvFilter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Logs go to stderr; stdout carries the status texts printed by the CLI.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(&config.log_level)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

/// The HTTP stack traces every connection; it stays at `warn` unless the
/// configured filter names it.
const TRANSPORT_TARGETS: [&str; 4] = ["hyper", "hyper_util", "reqwest", "rustls"];

fn build_filter(level: &str) -> Result<EnvFilter, TelemetryError> {
    let invalid = |source: ParseError| TelemetryError::EnvFilter {
        value: level.to_string(),
        source,
    };

    let mut filter = EnvFilter::try_new(level).map_err(invalid)?;
    for target in TRANSPORT_TARGETS {
        if !names_target(level, target) {
            let directive: Directive = format!("{target}=warn").parse().map_err(invalid)?;
            filter = filter.add_directive(directive);
        }
    }
    Ok(filter)
}

fn names_target(filter: &str, target: &str) -> bool {
    filter.split(',').any(|directive| {
        let name = directive.split(['=', '[']).next().unwrap_or_default().trim();
        name == target || name.starts_with(&format!("{target}::"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_directive_style_levels() {
        assert!(build_filter("info").is_ok());
        assert!(build_filter("scrutin_bot=debug,reqwest=warn").is_ok());
    }

    #[test]
    fn rejects_garbage_levels() {
        let err = build_filter("scrutin_bot=loud").expect_err("unknown level");
        assert!(err.to_string().contains("scrutin_bot=loud"));
    }

    #[test]
    fn transport_crates_are_quieted_by_default() {
        let filter = build_filter("debug").expect("filter builds").to_string();
        let filter = filter.to_ascii_lowercase();
        for target in TRANSPORT_TARGETS {
            assert!(filter.contains(&format!("{target}=warn")), "{filter}");
        }
    }

    #[test]
    fn configured_transport_levels_win() {
        assert!(names_target("info,reqwest=trace", "reqwest"));
        assert!(names_target("hyper::proto=debug", "hyper"));
        assert!(!names_target("info,hyper_util=debug", "hyper"));
        assert!(!names_target("scrutin_bot=debug", "reqwest"));

        let filter = build_filter("info,reqwest=trace")
            .expect("filter builds")
            .to_string()
            .to_ascii_lowercase();
        assert!(filter.contains("reqwest=trace"), "{filter}");
        assert!(!filter.contains("reqwest=warn"), "{filter}");
    }
}
