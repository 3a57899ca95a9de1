pub const HEADER_SIZE: usize = 12;
pub const MAX_PAYLOAD: usize = 500;
pub const MAX_PACKET: usize = 512;

pub const RING_SIZE: u32 = 32;
pub const WINDOW_SIZE: u32 = 10;

// Packet kinds on the wire
pub const KIND_SACK: u32 = 0;
pub const KIND_DATA: u32 = 1;
pub const KIND_EOT: u32 = 2;

// Defaults for local runs against the link emulator
pub const DEFAULT_REMOTE_HOST: &str = "127.0.0.1";
pub const DEFAULT_REMOTE_PORT: u16 = 23241;
pub const DEFAULT_LOCAL_PORT: u16 = 37898;
pub const DEFAULT_OUTPUT_FILE: &str = "fileReceived.txt";
pub const DEFAULT_ARRIVAL_LOG: &str = "arrival.log";

pub const EOT_MARKER: &str = "EOT";
