use clap::Parser;
use huddle_core::utils::{
    DEFAULT_HEARTBEAT_INTERVAL_SECS, DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_MAX_ROOM_SIZE,
    DEFAULT_PORT,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Hub settings, read from flags or the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "huddle-server", version, about = "Room-based signaling relay for peer-to-peer audio")]
pub struct ServerConfig {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Members allowed per room.
    #[arg(long, env = "MAX_ROOM_SIZE", default_value_t = DEFAULT_MAX_ROOM_SIZE, value_parser = parse_room_size)]
    pub max_room_size: usize,

    #[arg(
        long,
        env = "HEARTBEAT_INTERVAL_SECS",
        default_value_t = DEFAULT_HEARTBEAT_INTERVAL_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub heartbeat_interval_secs: u64,

    /// Close connections silent for this long. 0 disables.
    #[arg(long, env = "IDLE_TIMEOUT_SECS", default_value_t = DEFAULT_IDLE_TIMEOUT_SECS)]
    pub idle_timeout_secs: u64,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            max_room_size: DEFAULT_MAX_ROOM_SIZE,
            heartbeat_interval_secs: DEFAULT_HEARTBEAT_INTERVAL_SECS,
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
        }
    }
}

fn parse_room_size(raw: &str) -> Result<usize, String> {
    let size: usize = raw
        .parse()
        .map_err(|e| format!("not a number: {}", e))?;
    if size == 0 {
        return Err("room size must be at least 1".to_owned());
    }
    Ok(size)
}
