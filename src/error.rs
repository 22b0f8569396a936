use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by ring and key-value operations.
///
/// Timeouts are reported separately from other transport failures but must
/// be treated identically by callers; neither is ever retried below the
/// periodic self-healing of the stabilizer.
#[derive(Debug, Error)]
pub enum Error {
	#[error("transport: {0}")]
	Transport(#[from] std::io::Error),

	#[error("transport: remote call timed out")]
	Timeout,

	#[error("codec: {0}")]
	Codec(#[from] serde_json::Error),

	#[error("key not found")]
	NotFound,

	#[error("node has no predecessor")]
	NoPredecessor,

	#[error("remote error: {0}")]
	Remote(String),
}
