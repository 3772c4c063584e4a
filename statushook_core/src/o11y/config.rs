use crate::{Error, Result};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    #[tracing::instrument(level = "debug")]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" | "text" | "human" => Some(Self::Pretty),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is unset.
    pub default_filter: String,
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            default_filter: "info".to_string(),
            with_target: true,
        }
    }
}

impl LogConfig {
    #[tracing::instrument(level = "debug")]
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = Self::default();

        if let Some(v) = get("STATUSHOOK_LOG_FORMAT").filter(|v| !v.trim().is_empty()) {
            cfg.format = LogFormat::parse(&v).ok_or_else(|| {
                Error::InvalidInput(format!("invalid STATUSHOOK_LOG_FORMAT: {v}"))
            })?;
        }

        if let Some(v) = get("STATUSHOOK_LOG_LEVEL").filter(|v| !v.trim().is_empty()) {
            cfg.default_filter = v.trim().to_string();
        }

        if let Some(v) = get("STATUSHOOK_LOG_TARGET") {
            cfg.with_target = !matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "n"
            );
        }

        Ok(cfg)
    }
}
