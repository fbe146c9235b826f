pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_ROOM_SIZE: usize = 2;
pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 20;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60;

pub const MAX_ROOM_ID_LEN: usize = 64;
