use std::path::PathBuf;

use trellis_core::config::{ConfigError, ConfigValue, FromConfigValue, TrellisConfig};

/// Server settings for [`PlatformAxum`](crate::PlatformAxum).
///
/// | Key                         | Default        |
/// |-----------------------------|----------------|
/// | `server.address`            | `0.0.0.0:8083` |
/// | `server.strict`             | `false`        |
/// | `server.body.limit`         | `1048576`      |
/// | `server.statics`            | none           |
/// | `server.multipart.filesize` | `10485760`     |
/// | `server.multipart.files`    | `16`           |
#[derive(Debug, Clone)]
pub struct AxumSettings {
    pub address: String,
    /// When `false`, `/users/` is served by the `/users` route.
    pub strict: bool,
    /// Maximum accepted request body, in bytes.
    pub body_limit: usize,
    pub statics: Vec<StaticsOptions>,
    pub multipart: MultipartSettings,
}

impl Default for AxumSettings {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:8083".to_string(),
            strict: false,
            body_limit: 1024 * 1024,
            statics: Vec::new(),
            multipart: MultipartSettings::default(),
        }
    }
}

impl AxumSettings {
    pub fn from_config(config: &TrellisConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            address: config.get_or("server.address", defaults.address)?,
            strict: config.get_or("server.strict", defaults.strict)?,
            body_limit: config.get_or("server.body.limit", defaults.body_limit)?,
            statics: config.get_or("server.statics", defaults.statics)?,
            multipart: MultipartSettings {
                max_file_size: config
                    .get_or("server.multipart.filesize", defaults.multipart.max_file_size)?,
                max_files: config.get_or("server.multipart.files", defaults.multipart.max_files)?,
            },
        })
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn with_statics(mut self, statics: StaticsOptions) -> Self {
        self.statics.push(statics);
        self
    }

    pub fn multipart(mut self, multipart: MultipartSettings) -> Self {
        self.multipart = multipart;
        self
    }
}

/// A directory served under `endpoint`.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticsOptions {
    pub endpoint: String,
    pub root: PathBuf,
    /// Serve `index.html` for directory requests.
    pub index: bool,
}

impl StaticsOptions {
    pub fn new(endpoint: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            endpoint: endpoint.into(),
            root: root.into(),
            index: true,
        }
    }

    pub fn index(mut self, index: bool) -> Self {
        self.index = index;
        self
    }
}

impl FromConfigValue for StaticsOptions {
    fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError> {
        let ConfigValue::Map(_) = value else {
            return Err(ConfigError::TypeMismatch {
                key: key.to_string(),
                expected: "map with `endpoint` and `root`",
            });
        };
        let field = |name: &str| {
            value
                .field(name)
                .ok_or_else(|| ConfigError::NotFound(format!("{key}.{name}")))
        };
        let endpoint = String::from_config_value(field("endpoint")?, &format!("{key}.endpoint"))?;
        let root = String::from_config_value(field("root")?, &format!("{key}.root"))?;
        let index = match value.field("index") {
            Some(v) => bool::from_config_value(v, &format!("{key}.index"))?,
            None => true,
        };
        Ok(Self {
            endpoint,
            root: PathBuf::from(root),
            index,
        })
    }
}

/// Limits applied by the [`MultipartForm`](crate::MultipartForm) extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultipartSettings {
    pub max_file_size: usize,
    pub max_files: usize,
}

impl Default for MultipartSettings {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            max_files: 16,
        }
    }
}
