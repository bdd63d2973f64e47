//! CLI argument definitions for the Snapvault binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use snapvault_core::config::StorageBackend;

/// Snapvault: stores image captures and serves them as JSON and an HTML gallery.
#[derive(Parser, Debug)]
#[command(name = "snapvault", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Storage backend: memory, redis, or sqlite.
    #[arg(short = 'b', long = "backend")]
    pub backend: Option<StorageBackend>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > SNAPVAULT_CONFIG env var > ~/.snapvault/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("SNAPVAULT_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > SNAPVAULT_PORT env var > config file value.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("SNAPVAULT_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        config_port
    }

    /// Resolve the storage backend.
    ///
    /// Priority: --backend flag > SNAPVAULT_BACKEND env var > config file value.
    pub fn resolve_backend(&self, config_backend: StorageBackend) -> StorageBackend {
        if let Some(b) = self.backend {
            return b;
        }
        if let Ok(val) = std::env::var("SNAPVAULT_BACKEND") {
            if let Ok(b) = val.parse::<StorageBackend>() {
                return b;
            }
        }
        config_backend
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    match home_dir() {
        Some(home) => home.join(".snapvault").join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}

pub(crate) fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let var = "USERPROFILE";
    #[cfg(not(target_os = "windows"))]
    let var = "HOME";
    std::env::var(var).ok().map(PathBuf::from)
}

/// Expand a leading `~/` against the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")), home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = CliArgs::parse_from(["snapvault", "-p", "8080", "--backend", "sqlite"]);
        assert_eq!(args.port, Some(8080));
        assert_eq!(args.backend, Some(StorageBackend::Sqlite));
        assert_eq!(args.resolve_port(3030), 8080);
        assert_eq!(
            args.resolve_backend(StorageBackend::Memory),
            StorageBackend::Sqlite
        );
    }

    #[test]
    fn test_invalid_backend_rejected() {
        assert!(CliArgs::try_parse_from(["snapvault", "--backend", "kv"]).is_err());
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let args = CliArgs::parse_from(["snapvault", "-c", "/etc/snapvault.toml"]);
        assert_eq!(
            args.resolve_config_path(),
            PathBuf::from("/etc/snapvault.toml")
        );
    }

    #[test]
    fn test_expand_home_leaves_absolute_paths() {
        assert_eq!(
            expand_home("/var/lib/snapvault.db"),
            PathBuf::from("/var/lib/snapvault.db")
        );
    }
}
