use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `wolfcall`.
///
/// Only configuration and transport problems ever reach `main`. The turn
/// engine recovers from everything else locally (sentinels, random fallback,
/// no-op handlers), so [`ProtocolError`] and [`LlmError`] mostly show up in
/// logs. Internal code continues to use `anyhow::Result` for context chains.
#[derive(Debug, Error)]
pub enum WolfError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── LLM / Provider ──────────────────────────────────────────────────
    #[error("llm: {0}")]
    Llm(#[from] LlmError),

    // ── Transport ───────────────────────────────────────────────────────
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    // ── Protocol ────────────────────────────────────────────────────────
    #[error("protocol: {0}")]
    Protocol(#[from] ProtocolError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── LLM / Provider errors ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("provider {provider} request failed: {message}")]
    Request { provider: String, message: String },

    #[error("provider {provider} returned no text")]
    EmptyResponse { provider: String },

    #[error("unknown provider {0}")]
    UnknownProvider(String),

    #[error("call exceeded {deadline_ms}ms deadline")]
    Deadline { deadline_ms: u64 },
}

// ─── Transport errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection to {addr} failed: {message}")]
    Connection { addr: String, message: String },

    #[error("connection closed by game server")]
    Closed,

    #[error("no data from game server for {secs}s")]
    ReadTimeout { secs: u64 },

    #[error("send failed: {0}")]
    Send(String),
}

// ─── Protocol errors ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame buffer exceeded {limit} bytes without a complete message")]
    FrameTooLarge { limit: usize },

    #[error("undecodable packet: {0}")]
    Decode(String),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, WolfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_displays_correctly() {
        let err = WolfError::Config(ConfigError::Validation("attempts must be >= 1".into()));
        assert!(err.to_string().contains("validation failed"));
    }

    #[test]
    fn frame_too_large_mentions_limit() {
        let err = WolfError::Protocol(ProtocolError::FrameTooLarge { limit: 1024 });
        assert!(err.to_string().contains("1024"));
    }

    #[test]
    fn anyhow_interop() {
        let anyhow_err = anyhow::anyhow!("something went wrong");
        let wolf_err: WolfError = anyhow_err.into();
        assert!(wolf_err.to_string().contains("something went wrong"));
    }

    #[test]
    fn transport_closed_is_downcastable_from_anyhow() {
        let err: anyhow::Error = TransportError::Closed.into();
        assert!(matches!(
            err.downcast_ref::<TransportError>(),
            Some(TransportError::Closed)
        ));
    }
}
