use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::assoc::DEFAULT_SUBSAMPLES;
use crate::series::Window;
use crate::trend::DEFAULT_TOP_N;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub drift: DriftConfig,
    #[serde(default)]
    pub association: AssociationConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_events_path")]
    pub events_path: String,
    #[serde(default = "default_audit_path")]
    pub audit_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftConfig {
    #[serde(default = "default_window")]
    pub window: String,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociationConfig {
    #[serde(default = "default_subsamples")]
    pub subsamples: u32,
    #[serde(default)]
    pub max_lag: Option<u32>,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub events_path: Option<PathBuf>,
    pub audit_path: Option<PathBuf>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/drift-signal/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(events_path) = overrides.events_path {
            self.paths.events_path = events_path.to_string_lossy().into_owned();
        }
        if let Some(audit_path) = overrides.audit_path {
            self.paths.audit_path = audit_path.to_string_lossy().into_owned();
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn resolved_events_path(&self) -> PathBuf {
        expand_tilde(&self.paths.events_path)
    }

    pub fn resolved_audit_path(&self) -> PathBuf {
        expand_tilde(&self.paths.audit_path)
    }

    pub fn default_window(&self) -> Window {
        Window::from_label(&self.drift.window)
    }

    pub fn default_template() -> String {
        let template = r#"[paths]
events_path = ".drift/events.jsonl"
audit_path = ".drift/audit.jsonl"

[drift]
window = "7d"
top_n = 5

[association]
subsamples = 200
# max_lag = 7
# seed = 42

[server]
host = "127.0.0.1"
port = 3002
"#;
        template.to_string()
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            events_path: default_events_path(),
            audit_path: default_audit_path(),
        }
    }
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            top_n: default_top_n(),
        }
    }
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self {
            subsamples: default_subsamples(),
            max_lag: None,
            seed: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_events_path() -> String {
    ".drift/events.jsonl".to_string()
}

fn default_audit_path() -> String {
    ".drift/audit.jsonl".to_string()
}

fn default_window() -> String {
    Window::Days7.as_label().to_string()
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_subsamples() -> u32 {
    DEFAULT_SUBSAMPLES
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3002
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::{Config, ConfigOverrides};
    use crate::series::Window;

    #[test]
    fn template_parses_to_defaults() {
        let parsed: Config = toml::from_str(&Config::default_template()).expect("valid template");
        assert_eq!(parsed.paths.events_path, ".drift/events.jsonl");
        assert_eq!(parsed.drift.top_n, 5);
        assert_eq!(parsed.association.subsamples, 200);
        assert_eq!(parsed.association.seed, None);
        assert_eq!(parsed.server.port, 3002);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[drift]\nwindow = \"30d\"\n").expect("write config");
        let config = Config::load(Some(&path)).expect("load");
        assert_eq!(config.default_window(), Window::Days30);
        assert_eq!(config.drift.top_n, 5);
        assert_eq!(config.paths.audit_path, ".drift/audit.jsonl");
    }

    #[test]
    fn missing_file_is_default_and_overrides_apply() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = Config::load(Some(&dir.path().join("none.toml"))).expect("load");
        config.apply_overrides(ConfigOverrides {
            events_path: Some(PathBuf::from("/tmp/events.jsonl")),
            audit_path: None,
        });
        assert_eq!(config.resolved_events_path(), PathBuf::from("/tmp/events.jsonl"));
        assert_eq!(config.resolved_audit_path(), PathBuf::from(".drift/audit.jsonl"));
    }
}
