use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output shape. `LANCER_LOG_FORMAT` wins; otherwise production
/// (`LANCER_ENV=production`) logs JSON and everything else logs text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        Self::resolve(
            std::env::var("LANCER_LOG_FORMAT").ok().as_deref(),
            std::env::var("LANCER_ENV").ok().as_deref(),
        )
    }

    fn resolve(format: Option<&str>, env: Option<&str>) -> Self {
        match format.map(str::to_ascii_lowercase).as_deref() {
            Some("json") => return LogFormat::Json,
            Some("pretty" | "text") => return LogFormat::Pretty,
            _ => {}
        }
        if env == Some("production") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

pub fn init_tracing(service_name: &str) {
    let crate_target = service_name.replace('-', "_");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "info,{crate_target}=debug,lancer_shared=debug,tower_http=debug,diesel=warn"
        ))
    });

    let format = LogFormat::from_env();
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .init(),
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init(),
    }

    tracing::info!(service = service_name, ?format, "tracing initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_format_overrides_environment() {
        assert_eq!(LogFormat::resolve(Some("JSON"), None), LogFormat::Json);
        assert_eq!(LogFormat::resolve(Some("text"), Some("production")), LogFormat::Pretty);
    }

    #[test]
    fn production_defaults_to_json() {
        assert_eq!(LogFormat::resolve(None, Some("production")), LogFormat::Json);
        assert_eq!(LogFormat::resolve(None, Some("development")), LogFormat::Pretty);
        assert_eq!(LogFormat::resolve(Some("xml"), None), LogFormat::Pretty);
    }
}
