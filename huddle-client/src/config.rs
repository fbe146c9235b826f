use huddle_core::utils::{DEFAULT_PORT, DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2};

/// Where the hub lives and which ICE servers the audio transports use.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket url of the hub, e.g. `ws://localhost:3000/ws`.
    pub url: String,
    pub ice_servers: Vec<String>,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_ice_servers(mut self, ice_servers: Vec<String>) -> Self {
        self.ice_servers = ice_servers;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: format!("ws://127.0.0.1:{}/ws", DEFAULT_PORT),
            ice_servers: vec![DEFAULT_STUN_ADDR.to_owned(), DEFAULT_STUN_ADDR_2.to_owned()],
        }
    }
}
