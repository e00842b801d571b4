//! Config loader (strict YAML, every field defaulted).

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, StatsError};
use crate::sampler::SampleRate;
use crate::units;

/// Environment variable naming the YAML config file.
pub const CONFIG_ENV: &str = "PAGE_LOAD_STATS_CONFIG";

/// File name of the sampled metrics log inside `content_dir`.
pub const LOG_FILE_NAME: &str = "load_stats.log";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Redis URL for history storage. Unset keeps history in process memory.
    #[serde(default)]
    pub redis_url: Option<String>,

    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Percent of page views whose history is persisted and logged.
    #[serde(default)]
    pub sample_rate: SampleRate,

    /// Expiry of stored history; 0 keeps it forever.
    #[serde(default = "default_history_ttl_secs")]
    pub history_ttl_secs: u64,

    /// Newest observations kept per context; 0 is unbounded.
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Directory holding `load_stats.log`.
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,

    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Memory ceiling the usage percentile is computed against, e.g. `"256M"`.
    #[serde(default = "default_memory_limit")]
    pub memory_limit: String,

    /// Token granting administrator view. Unset treats everyone as admin.
    #[serde(default)]
    pub admin_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            redis_url: None,
            key_prefix: default_key_prefix(),
            sample_rate: SampleRate::default(),
            history_ttl_secs: default_history_ttl_secs(),
            max_history: default_max_history(),
            content_dir: default_content_dir(),
            static_dir: default_static_dir(),
            memory_limit: default_memory_limit(),
            admin_token: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.listen.trim().is_empty() {
            return Err(StatsError::Config("listen must not be empty".into()));
        }
        if self.memory_limit_bytes() == 0 {
            return Err(StatsError::Config(format!(
                "memory_limit {:?} does not parse to a positive size",
                self.memory_limit
            )));
        }
        if matches!(&self.admin_token, Some(t) if t.is_empty()) {
            return Err(StatsError::Config("admin_token must not be empty".into()));
        }
        Ok(())
    }

    pub fn memory_limit_bytes(&self) -> u64 {
        units::parse_size(&self.memory_limit)
    }

    pub fn history_ttl(&self) -> Option<Duration> {
        (self.history_ttl_secs > 0).then(|| Duration::from_secs(self.history_ttl_secs))
    }

    pub fn log_path(&self) -> PathBuf {
        self.content_dir.join(LOG_FILE_NAME)
    }
}

pub fn load_from_file(path: &str) -> Result<Config> {
    let s = fs::read_to_string(path)
        .map_err(|e| StatsError::Config(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<Config> {
    let cfg: Config =
        serde_yaml::from_str(s).map_err(|e| StatsError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

fn default_listen() -> String {
    "0.0.0.0:3000".into()
}
fn default_key_prefix() -> String {
    "page_load_stats:".into()
}
fn default_history_ttl_secs() -> u64 {
    24 * 60 * 60
}
fn default_max_history() -> usize {
    1000
}
fn default_content_dir() -> PathBuf {
    PathBuf::from("content")
}
fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}
fn default_memory_limit() -> String {
    "256M".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = load_from_str("{}").unwrap();
        assert_eq!(cfg.listen, "0.0.0.0:3000");
        assert_eq!(cfg.sample_rate.percent(), 10);
        assert_eq!(cfg.history_ttl(), Some(Duration::from_secs(86_400)));
        assert_eq!(cfg.memory_limit_bytes(), 256 * 1024 * 1024);
        assert_eq!(cfg.log_path(), PathBuf::from("content/load_stats.log"));
    }

    #[test]
    fn zero_ttl_is_permanent() {
        let cfg = load_from_str("history_ttl_secs: 0").unwrap();
        assert_eq!(cfg.history_ttl(), None);
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(load_from_str("sample_percent: 5").is_err());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(load_from_str("sample_rate: 101").is_err());
        assert!(load_from_str("memory_limit: lots").is_err());
        assert!(load_from_str("admin_token: ''").is_err());
    }

    #[test]
    fn full_document() {
        let cfg = load_from_str(
            r#"
listen: "127.0.0.1:8080"
redis_url: "redis://127.0.0.1:6379/"
sample_rate: 100
max_history: 50
memory_limit: 1G
admin_token: secret
"#,
        )
        .unwrap();
        assert_eq!(cfg.sample_rate, SampleRate::ALWAYS);
        assert_eq!(cfg.max_history, 50);
        assert_eq!(cfg.memory_limit_bytes(), 1 << 30);
        assert_eq!(cfg.admin_token.as_deref(), Some("secret"));
    }
}
