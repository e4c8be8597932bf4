use thiserror::Error;

/// A frame that cannot be parsed at all. Never fatal: the engine rejects
/// the frame locally and carries on.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The frame is shorter than the fixed 22-byte header.
    #[error("frame too short for a header: {len} bytes")]
    Truncated { len: usize },
    /// The type tag is not HELLO, ACK or DATA.
    #[error("unknown packet type tag {0}")]
    UnknownType(u8),
}

/// Although this is an error enum, these are warnings: non-fatal events
/// the host may want to observe. Drain [`crate::engine::Engine::warnings`]
/// regularly.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineWarning {
    /// The pending queue was full, so an unroutable packet was dropped.
    #[error("pending queue full, dropped packet origin={origin_id} seq={sequence}")]
    QueueOverflow { origin_id: u32, sequence: u32 },
    /// A DATA frame arrived with no TTL left to forward it.
    #[error("ttl exhausted, dropped packet origin={origin_id} seq={sequence}")]
    TtlExpired { origin_id: u32, sequence: u32 },
}
