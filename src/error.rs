#[derive(thiserror::Error, Debug)]
pub enum RdtError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Truncated packet: {len} bytes")]
    Truncated { len: usize },

    #[error("Unknown packet kind {0}")]
    UnknownKind(u32),

    #[error("Sequence number {0} outside the ring")]
    SeqOutOfRing(u32),

    #[error("Payload length {0} exceeds maximum")]
    Oversized(usize),

    #[error("Cannot resolve address {0}")]
    AddrResolve(String),

    #[error("Worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, RdtError>;
