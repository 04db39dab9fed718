use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Runtime settings, read once at startup and shared through [`crate::AppState`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// Items per page on every list endpoint.
    pub page_size: u64,
    pub media_root: PathBuf,
    /// URL prefix of stored media, without a trailing slash.
    pub media_url: String,
    /// Serve files under `media_root` at `media_url`.
    pub debug: bool,
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            db_path: PathBuf::from("classifieds.db"),
            page_size: 10,
            media_root: PathBuf::from("./media"),
            media_url: "/media".into(),
            debug: false,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let page_size: u64 = parse_or(&lookup, "CLASSIFIEDS_PAGE_SIZE", defaults.page_size)?;
        if page_size == 0 {
            bail!("CLASSIFIEDS_PAGE_SIZE must be at least 1");
        }

        let media_url = match lookup("CLASSIFIEDS_MEDIA_URL") {
            Some(raw) => normalize_media_url(&raw)?,
            None => defaults.media_url,
        };

        let debug = match lookup("CLASSIFIEDS_DEBUG") {
            Some(raw) => parse_flag(&raw)
                .with_context(|| format!("CLASSIFIEDS_DEBUG has invalid value '{}'", raw))?,
            None => defaults.debug,
        };

        Ok(Self {
            host: lookup("CLASSIFIEDS_HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "CLASSIFIEDS_PORT", defaults.port)?,
            db_path: lookup("CLASSIFIEDS_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            page_size,
            media_root: lookup("CLASSIFIEDS_MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.media_root),
            media_url,
            debug,
            max_upload_bytes: parse_or(
                &lookup,
                "CLASSIFIEDS_MAX_UPLOAD_BYTES",
                defaults.max_upload_bytes,
            )?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has invalid value '{}'", key, raw)),
        None => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got '{}'", other),
    }
}

fn normalize_media_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !trimmed.starts_with('/') {
        bail!("CLASSIFIEDS_MEDIA_URL must be an absolute path below the root, got '{}'", raw);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.page_size, 10);
        assert_eq!(cfg.media_url, "/media");
        assert!(!cfg.debug);
    }

    #[test]
    fn values_are_parsed_and_normalized() {
        let cfg = config(&[
            ("CLASSIFIEDS_PORT", "9000"),
            ("CLASSIFIEDS_PAGE_SIZE", "25"),
            ("CLASSIFIEDS_MEDIA_URL", "/uploads/"),
            ("CLASSIFIEDS_DEBUG", "TRUE"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.page_size, 25);
        assert_eq!(cfg.media_url, "/uploads");
        assert!(cfg.debug);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(config(&[("CLASSIFIEDS_PORT", "http")]).is_err());
        assert!(config(&[("CLASSIFIEDS_PAGE_SIZE", "0")]).is_err());
        assert!(config(&[("CLASSIFIEDS_MEDIA_URL", "/")]).is_err());
        assert!(config(&[("CLASSIFIEDS_MEDIA_URL", "media")]).is_err());
        assert!(config(&[("CLASSIFIEDS_DEBUG", "maybe")]).is_err());
    }
}
