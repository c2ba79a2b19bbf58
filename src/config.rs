use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Startup failures. Any of these stops the process before it binds.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("There is no {key} configuration in {path}")]
    MissingKey { key: &'static str, path: PathBuf },

    #[error("{0} does not exist")]
    NotFound(PathBuf),

    #[error("Failed to stat {path}: {source}")]
    Metadata {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{0} is not a dir")]
    NotADirectory(PathBuf),

    #[error("Failed to create upload directory {path}: {source}")]
    CreateUploadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid listen address {0}")]
    InvalidAddress(String),
}

/// Keys as they appear in the config file. Required keys are optional here
/// so a missing one can be reported by name.
#[derive(Debug, Deserialize)]
struct RawConfig {
    basedir: Option<PathBuf>,
    uploaddir: Option<PathBuf>,
    port: Option<u16>,
    #[serde(default = "default_bind")]
    bind: String,
    #[serde(default = "default_max_upload_size")]
    max_upload_size: u64,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_max_upload_size() -> u64 {
    100 * 1024 * 1024 // 100 MB
}

/// Server configuration, validated once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Root of the browsable tree
    pub base_dir: PathBuf,
    /// Where uploads are written
    pub upload_dir: PathBuf,
    /// Port to listen on
    pub port: u16,
    /// Address to bind to
    pub bind: String,
    /// Maximum request body size accepted on the upload route (in bytes)
    pub max_upload_size: u64,
}

impl ServerConfig {
    /// Load and validate config from a TOML file.
    ///
    /// The upload directory is created when it does not exist yet.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content, path)
    }

    /// Parse and validate config text; `origin` is only used in messages.
    pub fn from_toml(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;

        let missing = |key| ConfigError::MissingKey {
            key,
            path: origin.to_path_buf(),
        };
        let base_dir = raw.basedir.ok_or_else(|| missing("basedir"))?;
        let upload_dir = raw.uploaddir.ok_or_else(|| missing("uploaddir"))?;
        let port = raw.port.ok_or_else(|| missing("port"))?;

        check_dir(&base_dir)?;

        if !upload_dir.exists() {
            std::fs::create_dir_all(&upload_dir).map_err(|source| {
                ConfigError::CreateUploadDir {
                    path: upload_dir.clone(),
                    source,
                }
            })?;
        }
        check_dir(&upload_dir)?;

        Ok(Self {
            base_dir,
            upload_dir,
            port,
            bind: raw.bind,
            max_upload_size: raw.max_upload_size,
        })
    }

    /// Socket address built from `bind` and `port`.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.bind, self.port);
        addr.parse().map_err(|_| ConfigError::InvalidAddress(addr))
    }
}

fn check_dir(path: &Path) -> Result<(), ConfigError> {
    let metadata = std::fs::metadata(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
        _ => ConfigError::Metadata {
            path: path.to_path_buf(),
            source,
        },
    })?;
    if !metadata.is_dir() {
        return Err(ConfigError::NotADirectory(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn origin() -> PathBuf {
        PathBuf::from("server.toml")
    }

    #[test]
    fn test_load_valid_config() {
        let base = TempDir::new().unwrap();
        let uploads = TempDir::new().unwrap();
        let content = format!(
            "basedir = {:?}\nuploaddir = {:?}\nport = 9090\n",
            base.path(),
            uploads.path()
        );

        let config = ServerConfig::from_toml(&content, &origin()).unwrap();
        assert_eq!(config.base_dir, base.path());
        assert_eq!(config.upload_dir, uploads.path());
        assert_eq!(config.port, 9090);
        assert_eq!(config.bind, "0.0.0.0");
        assert_eq!(config.max_upload_size, 100 * 1024 * 1024);
        assert_eq!(
            config.listen_addr().unwrap(),
            "0.0.0.0:9090".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_missing_keys_are_named() {
        let base = TempDir::new().unwrap();

        let err = ServerConfig::from_toml("uploaddir = \"/tmp\"\nport = 1", &origin()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { key: "basedir", .. }));

        let content = format!("basedir = {:?}\nport = 1", base.path());
        let err = ServerConfig::from_toml(&content, &origin()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { key: "uploaddir", .. }));
        assert_eq!(
            err.to_string(),
            "There is no uploaddir configuration in server.toml"
        );

        let content = format!(
            "basedir = {:?}\nuploaddir = {:?}",
            base.path(),
            base.path()
        );
        let err = ServerConfig::from_toml(&content, &origin()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { key: "port", .. }));
    }

    #[test]
    fn test_malformed_config() {
        let err = ServerConfig::from_toml("basedir = ", &origin()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_basedir_must_be_directory() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();

        let content = format!(
            "basedir = {:?}\nuploaddir = {:?}\nport = 9090",
            file,
            temp.path()
        );
        let err = ServerConfig::from_toml(&content, &origin()).unwrap_err();
        assert!(matches!(err, ConfigError::NotADirectory(_)));

        let content = format!(
            "basedir = {:?}\nuploaddir = {:?}\nport = 9090",
            temp.path().join("missing"),
            temp.path()
        );
        let err = ServerConfig::from_toml(&content, &origin()).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_unreadable_basedir_keeps_io_error() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();

        // Stat through a regular file fails with ENOTDIR, not ENOENT
        let content = format!(
            "basedir = {:?}\nuploaddir = {:?}\nport = 9090",
            file.join("sub"),
            temp.path()
        );
        let err = ServerConfig::from_toml(&content, &origin()).unwrap_err();
        assert!(matches!(err, ConfigError::Metadata { .. }), "got {:?}", err);
        assert!(err.to_string().starts_with("Failed to stat"));
    }

    #[test]
    fn test_upload_dir_is_created() {
        let temp = TempDir::new().unwrap();
        let uploads = temp.path().join("incoming/nested");
        let content = format!(
            "basedir = {:?}\nuploaddir = {:?}\nport = 9090",
            temp.path(),
            uploads
        );

        let config = ServerConfig::from_toml(&content, &origin()).unwrap();
        assert!(uploads.is_dir());
        assert_eq!(config.upload_dir, uploads);
    }

    #[test]
    fn test_upload_dir_must_not_be_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("uploads");
        std::fs::write(&file, "x").unwrap();
        let content = format!(
            "basedir = {:?}\nuploaddir = {:?}\nport = 9090",
            temp.path(),
            file
        );

        let err = ServerConfig::from_toml(&content, &origin()).unwrap_err();
        assert!(matches!(err, ConfigError::NotADirectory(_)));
    }

    #[test]
    fn test_optional_keys() {
        let temp = TempDir::new().unwrap();
        let content = format!(
            "basedir = {:?}\nuploaddir = {:?}\nport = 8080\nbind = \"127.0.0.1\"\nmax_upload_size = 1024",
            temp.path(),
            temp.path()
        );

        let config = ServerConfig::from_toml(&content, &origin()).unwrap();
        assert_eq!(config.bind, "127.0.0.1");
        assert_eq!(config.max_upload_size, 1024);
    }

    #[test]
    fn test_read_missing_file() {
        let err = ServerConfig::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
