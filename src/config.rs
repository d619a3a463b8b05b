//! Service configuration, read once at startup from flags or the environment

use crate::document::PageSizing;
use crate::workdir::WorkDir;
use crate::EngineConfig;
use clap::Parser;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "tweetpress", version, about = "Render posts to PNG cards and a PDF over HTTP")]
pub struct ServiceConfig {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Shared secret expected in the `x-api-key` header; unset disables the check
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Chrome/Chromium binary; searched on PATH when unset
    #[arg(long, env = "CHROME_PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Keep Chrome's sandbox enabled
    #[arg(long, env = "CHROME_SANDBOX", default_value_t = false)]
    pub chrome_sandbox: bool,

    /// Bound for navigation and CDP calls, in milliseconds
    #[arg(long, env = "NAVIGATION_TIMEOUT_MS", default_value_t = 30_000)]
    pub navigation_timeout_ms: u64,

    /// Bound for avatars, fonts and embeds to settle, in milliseconds
    #[arg(long, env = "SETTLE_TIMEOUT_MS", default_value_t = 10_000)]
    pub settle_timeout_ms: u64,

    /// Directory for transient per-request files
    #[arg(long, env = "WORK_DIR", default_value = "public/temp")]
    pub work_dir: PathBuf,

    /// Directory served as static files
    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    pub public_dir: PathBuf,

    /// PDF page size: `image`, `letter`, `a4` or `<width>x<height>` points
    #[arg(long, env = "PAGE_SIZE", default_value = "image")]
    pub page_size: PageSizing,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            port: 3000,
            api_key: None,
            chrome_path: engine.chrome_path,
            chrome_sandbox: engine.sandbox,
            navigation_timeout_ms: engine.navigation_timeout_ms,
            settle_timeout_ms: engine.settle_timeout_ms,
            work_dir: PathBuf::from("public/temp"),
            public_dir: PathBuf::from("public"),
            page_size: PageSizing::MatchImage,
        }
    }
}

impl ServiceConfig {
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            chrome_path: self.chrome_path.clone(),
            sandbox: self.chrome_sandbox,
            navigation_timeout_ms: self.navigation_timeout_ms,
            settle_timeout_ms: self.settle_timeout_ms,
        }
    }

    pub fn work_dir(&self) -> WorkDir {
        WorkDir::new(&self.work_dir)
    }

    /// The configured key, treating an empty value as unset
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}
