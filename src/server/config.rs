use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::ValueEnum;

use crate::application::AggregateOptions;

/// Deployment environment. Development switches the IP allow-list off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Environment {
    #[default]
    Production,
    Development,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Development => "development",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything the HTTP server needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub environment: Environment,
    /// Client addresses allowed to use the upload routes.
    pub allowed_ips: Vec<IpAddr>,
    /// Take the client address from `X-Forwarded-For` when a proxy sits in front.
    pub trust_forwarded_for: bool,
    pub max_upload_bytes: usize,
    pub aggregate: AggregateOptions,
}

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_UPLOAD_MB: usize = 25;

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            environment: Environment::default(),
            allowed_ips: Vec::new(),
            trust_forwarded_for: false,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            aggregate: AggregateOptions::default(),
        }
    }
}
