use std::fmt;

use serde::{Serialize, Deserialize};

use crate::ring_id;

/// A point-in-time snapshot of a ring member: its id and the endpoint it
/// serves on. Holding a Peer implies nothing about the member's current
/// state; all live interaction goes through the rpc module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
	pub id: u32,
	pub host: String,
	pub port: u16,
}

impl Peer {
	/// Identity is derived from the endpoint, so the same host and port
	/// always map to the same ring position.
	pub fn new(host: impl Into<String>, port: u16) -> Self {
		let host = host.into();
		let id = ring_id::hash(format!("{}:{}", host, port).as_bytes());
		Peer { id, host, port }
	}

	pub fn endpoint(&self) -> String {
		format!("{}:{}", self.host, self.port)
	}
}

impl fmt::Display for Peer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{} (id {})", self.host, self.port, self.id)
	}
}
