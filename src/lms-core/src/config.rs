use crate::paths::AppDirs;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_config_version")]
    pub config_version: u32,
    #[serde(default)]
    pub lms: LmsSection,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            lms: LmsSection::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Raw `[lms]` table as written by the user. Turned into a [`ServerConfig`]
/// by [`ServerConfig::from_section`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LmsSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port", deserialize_with = "deserialize_port")]
    pub port: u16,
    #[serde(default)]
    pub secure: bool,
    #[serde(default = "default_library_root")]
    pub library_root: String,
    #[serde(default = "default_listener_method")]
    pub listener_method: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LmsSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            secure: false,
            library_root: default_library_root(),
            listener_method: default_listener_method(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Which import events trigger a rescan, and how much of the library is rescanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListenerMethod {
    /// Every completed import rescans the whole library.
    #[default]
    Full,
    /// Every imported album rescans only its own directory.
    Path,
}

impl ListenerMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListenerMethod::Full => "full",
            ListenerMethod::Path => "path",
        }
    }
}

impl fmt::Display for ListenerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListenerMethod {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "full" => Ok(ListenerMethod::Full),
            "path" => Ok(ListenerMethod::Path),
            other => Err(ValidationError::UnknownListenerMethod {
                value: other.to_string(),
            }),
        }
    }
}

/// Validated connection settings for one LMS instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub library_root: String,
    pub listener_method: ListenerMethod,
    pub timeout: Duration,
}

impl ServerConfig {
    pub fn from_section(section: &LmsSection) -> Result<Self, ValidationError> {
        let host = section.host.trim();
        if host.is_empty() {
            return Err(ValidationError::EmptyHost);
        }
        if section.port == 0 {
            return Err(ValidationError::InvalidPort {
                value: section.port.to_string(),
            });
        }
        let listener_method = section.listener_method.parse()?;

        Ok(Self {
            host: host.to_string(),
            port: section.port,
            secure: section.secure,
            library_root: section.library_root.clone(),
            listener_method,
            timeout: Duration::from_secs(section.timeout_secs.max(1)),
        })
    }

    pub fn scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    /// JSON-RPC endpoint of the server.
    pub fn server_url(&self) -> String {
        format!("{}://{}:{}/jsonrpc.js", self.scheme(), self.host, self.port)
    }

    /// `file://` URI for a path below `library_root`. Plain concatenation:
    /// duplicate slashes are kept as-is.
    pub fn file_uri(&self, relative: &str) -> String {
        format!("file://{}{}", self.library_root, relative)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
    #[serde(default = "default_max_log_files")]
    pub max_log_files: usize,
    #[serde(default = "default_stdout_enabled")]
    pub stdout: bool,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_log_files: default_max_log_files(),
            stdout: default_stdout_enabled(),
            file_name: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("config validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("failed to prepare configuration directories: {0}")]
    Directories(#[from] crate::paths::DirsError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unsupported config_version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("unknown listener_method '{value}', expected 'full' or 'path'")]
    UnknownListenerMethod { value: String },
    #[error("invalid LMS port '{value}'")]
    InvalidPort { value: String },
    #[error("LMS host must not be empty")]
    EmptyHost,
}

impl Config {
    pub fn load_or_default(dirs: &AppDirs) -> Result<Self, ConfigError> {
        dirs.ensure_exists()?;
        let path = Self::config_path(dirs);
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn config_path(dirs: &AppDirs) -> PathBuf {
        dirs.config_dir().join("config.toml")
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.config_version != CURRENT_CONFIG_VERSION {
            return Err(ValidationError::UnsupportedVersion {
                found: self.config_version,
                expected: CURRENT_CONFIG_VERSION,
            });
        }
        ServerConfig::from_section(&self.lms)?;
        Ok(())
    }

    pub fn server(&self) -> Result<ServerConfig, ValidationError> {
        ServerConfig::from_section(&self.lms)
    }
}

/// Accepts `port = 9000` as well as `port = "9000"`.
fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPort {
        Number(u64),
        Text(String),
    }

    let invalid = |value: String| -> D::Error {
        serde::de::Error::custom(ValidationError::InvalidPort { value })
    };
    match RawPort::deserialize(deserializer)? {
        RawPort::Number(n) => u16::try_from(n).map_err(|_| invalid(n.to_string())),
        RawPort::Text(text) => text.trim().parse::<u16>().map_err(|_| invalid(text)),
    }
}

fn default_config_version() -> u32 {
    CURRENT_CONFIG_VERSION
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    9000
}

fn default_library_root() -> String {
    "/music/".to_string()
}

fn default_listener_method() -> String {
    ListenerMethod::Full.as_str().to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

fn default_max_log_files() -> usize {
    7
}

fn default_stdout_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(host: &str, port: u16, secure: bool) -> LmsSection {
        LmsSection {
            host: host.into(),
            port,
            secure,
            ..LmsSection::default()
        }
    }

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.logging.max_log_files, 7);
        assert!(config.logging.stdout);
        assert_eq!(config.logging.level, LogLevel::Info);

        let server = config.server().expect("default server config");
        assert_eq!(server.host, "localhost");
        assert_eq!(server.port, 9000);
        assert!(!server.secure);
        assert_eq!(server.library_root, "/music/");
        assert_eq!(server.listener_method, ListenerMethod::Full);
        assert_eq!(server.timeout, Duration::from_secs(5));
    }

    #[test]
    fn invalid_version_rejected() {
        let mut config = Config::default();
        config.config_version = CURRENT_CONFIG_VERSION + 1;
        let result = config.validate();
        assert!(matches!(
            result,
            Err(ValidationError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn server_url_uses_http_when_not_secure() {
        let server = ServerConfig::from_section(&section("lms.lan", 9000, false)).unwrap();
        assert_eq!(server.server_url(), "http://lms.lan:9000/jsonrpc.js");
    }

    #[test]
    fn server_url_uses_https_when_secure() {
        let server = ServerConfig::from_section(&section("nas.local", 9090, true)).unwrap();
        assert_eq!(server.server_url(), "https://nas.local:9090/jsonrpc.js");
    }

    #[test]
    fn listener_method_parses_known_values() {
        assert_eq!("full".parse::<ListenerMethod>(), Ok(ListenerMethod::Full));
        assert_eq!(" path ".parse::<ListenerMethod>(), Ok(ListenerMethod::Path));
    }

    #[test]
    fn unknown_listener_method_is_a_validation_error() {
        let mut config = Config::default();
        config.lms.listener_method = "album".into();
        assert_eq!(
            config.validate(),
            Err(ValidationError::UnknownListenerMethod {
                value: "album".into()
            })
        );
    }

    #[test]
    fn empty_host_rejected() {
        let result = ServerConfig::from_section(&section("  ", 9000, false));
        assert_eq!(result, Err(ValidationError::EmptyHost));
    }

    #[test]
    fn file_uri_is_plain_concatenation() {
        let mut lms = LmsSection::default();
        lms.library_root = "/music/".into();
        let server = ServerConfig::from_section(&lms).unwrap();
        assert_eq!(server.file_uri("Artist/Album"), "file:///music/Artist/Album");
        assert_eq!(server.file_uri("/Artist"), "file:///music//Artist");
        assert_eq!(
            server.file_uri("The Beatles/Abbey Road"),
            "file:///music/The Beatles/Abbey Road"
        );
    }

    #[test]
    fn parses_toml_with_string_port() {
        let config: Config = toml::from_str(
            r#"
            [lms]
            host = "nas.local"
            port = "9090"
            secure = true
            library_root = "/mnt/music/"
            listener_method = "path"
            "#,
        )
        .expect("config should parse");
        let server = config.server().expect("valid server config");
        assert_eq!(server.port, 9090);
        assert_eq!(server.listener_method, ListenerMethod::Path);
        assert_eq!(server.library_root, "/mnt/music/");
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn rejects_non_numeric_port() {
        let result = toml::from_str::<Config>("[lms]\nport = \"http\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn load_from_reports_bad_listener_method() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[lms]\nlistener_method = \"sometimes\"\n").unwrap();

        let err = Config::load_from(&path).expect_err("invalid listener method");
        assert!(matches!(
            err,
            ConfigError::Validation(ValidationError::UnknownListenerMethod { .. })
        ));
    }
}
