use serde::{Serialize, Deserialize};

use crate::peer::Peer;

pub mod codec;
pub mod client;
pub mod server;

pub use client::{find_successor, get_predecessor, notify, get, put, delete, CALL_TIMEOUT};

/// Requests a ring member accepts, from peers and thin clients alike.
#[derive(Debug, Serialize, Deserialize)]
pub enum Request {
	FindSuccessor { id: u32 },
	GetPredecessor,
	Notify { candidate: Peer },
	Get { key: String },
	Put { key: String, value: String },
	Delete { key: String },
}

/// Answers to the requests above. A stored-but-empty value travels as
/// Some(""), so it stays distinguishable from an absent key.
#[derive(Debug, Serialize, Deserialize)]
pub enum Response {
	Successor { peer: Peer },
	Predecessor { peer: Option<Peer> },
	Notified,
	Value { value: Option<String> },
	Stored,
	Deleted { existed: bool },
	Error { message: String },
}
