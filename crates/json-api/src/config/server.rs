//! Listener and request lifetime settings.

use std::net::IpAddr;

use clap::Args;
use jiff::SignedDuration;

use crate::config::parse_duration;

#[derive(Debug, Args)]
pub struct ServerRuntimeConfig {
    #[arg(short = 'H', long = "host", env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    #[arg(short, long, env = "SERVER_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Requests still running after this are answered with 503
    #[arg(long, env = "REQUEST_TIMEOUT", default_value = "30s", value_parser = parse_duration)]
    pub request_timeout: SignedDuration,

    /// Drain window for in-flight requests once SIGINT or SIGTERM arrives
    #[arg(long, env = "SHUTDOWN_GRACE_PERIOD", default_value = "30s", value_parser = parse_duration)]
    pub shutdown_grace_period: SignedDuration,
}

impl ServerRuntimeConfig {
    /// `host:port`, bracketing IPv6 hosts.
    #[must_use]
    pub fn socket_addr(&self) -> String {
        match self.host {
            IpAddr::V4(host) => format!("{host}:{}", self.port),
            IpAddr::V6(host) => format!("[{host}]:{}", self.port),
        }
    }
}
