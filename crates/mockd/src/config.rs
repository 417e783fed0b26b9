//! mockd.toml configuration and CLI settings resolution.
//!
//! Precedence: command-line flag or env var, then the config file, then the
//! built-in default.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use mockdata_store::{Compression, LoadOptions};
use serde::{Deserialize, Serialize};

pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_DATAFILE: &str = "data.json.zst";

/// Flags for `mockd serve`.
#[derive(Debug, Clone, Default, Args)]
pub struct ServeArgs {
    /// Optional mockd.toml with defaults for the flags below.
    #[arg(long, env = "MOCKD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on, e.g. `0.0.0.0:8000` or `:8000`.
    #[arg(long, env = "MOCKD_HTTP_ADDR")]
    pub http_addr: Option<String>,

    /// Bootstrap JSON document, optionally zstd-compressed.
    #[arg(long, env = "MOCKD_DATAFILE")]
    pub datafile: Option<PathBuf>,

    /// Bootstrap framing: auto, zstd, or none.
    #[arg(long, env = "MOCKD_COMPRESSION")]
    pub compression: Option<Compression>,

    /// Log every top-level document key as a lookup path after loading.
    #[arg(long, env = "MOCKD_DEBUG")]
    pub debug: bool,

    /// Emit logs as JSON lines.
    #[arg(long, env = "MOCKD_LOG_JSON")]
    pub log_json: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MockdConfig {
    pub server: Option<ServerConfig>,
    pub data: Option<DataConfig>,
    pub log: Option<LogConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub http_addr: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    pub file: Option<PathBuf>,
    pub compression: Option<Compression>,
    pub debug: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    pub json: Option<bool>,
}

impl MockdConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Fully resolved daemon settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub http_addr: SocketAddr,
    pub datafile: PathBuf,
    pub load: LoadOptions,
    pub log_json: bool,
}

impl Settings {
    /// Resolve settings from CLI args, reading `--config` if given.
    pub fn resolve(args: &ServeArgs) -> anyhow::Result<Self> {
        let file = args
            .config
            .as_deref()
            .map(MockdConfig::from_file)
            .transpose()?
            .unwrap_or_default();
        Self::merge(args, &file)
    }

    /// Merge CLI args over an already-parsed config file.
    pub fn merge(args: &ServeArgs, file: &MockdConfig) -> anyhow::Result<Self> {
        let server = file.server.clone().unwrap_or_default();
        let data = file.data.clone().unwrap_or_default();
        let log = file.log.clone().unwrap_or_default();

        let addr = args
            .http_addr
            .clone()
            .or(server.http_addr)
            .unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());

        Ok(Self {
            http_addr: parse_addr(&addr)?,
            datafile: args
                .datafile
                .clone()
                .or(data.file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATAFILE)),
            load: LoadOptions {
                compression: args.compression.or(data.compression).unwrap_or_default(),
                debug_keys: args.debug || data.debug.unwrap_or(false),
            },
            log_json: args.log_json || log.json.unwrap_or(false),
        })
    }
}

/// Parse a listen address; a bare `:port` binds all interfaces.
fn parse_addr(addr: &str) -> anyhow::Result<SocketAddr> {
    let full = if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    };
    full.parse()
        .with_context(|| format!("invalid listen address '{addr}'"))
}
