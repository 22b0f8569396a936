use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::{Error, Result};
use crate::peer::Peer;

use super::{Request, Response, codec::JsonStream};

/// Upper bound on any single remote call, connection setup included. A call
/// that runs past it is reported exactly like a refused connection.
pub const CALL_TIMEOUT: Duration = Duration::from_secs(1);

/// One request/response exchange with the node at `peer`. No retry at this
/// layer; self-healing is the stabilizer's job.
pub async fn call(peer: &Peer, request: Request) -> Result<Response> {
	let exchange = async {
		let stream = TcpStream::connect(peer.endpoint()).await?;
		let mut stream = JsonStream::new(stream);
		stream.write(&request).await?;
		stream.read::<Response>().await
	};
	match timeout(CALL_TIMEOUT, exchange).await {
		Ok(result) => result,
		Err(_) => Err(Error::Timeout),
	}
}

/// Ask `peer` to resolve the owner of `id`, possibly recursing across the
/// ring on its side.
pub async fn find_successor(peer: &Peer, id: u32) -> Result<Peer> {
	match call(peer, Request::FindSuccessor { id }).await? {
		Response::Successor { peer } => Ok(peer),
		other => Err(unexpected(other)),
	}
}

pub async fn get_predecessor(peer: &Peer) -> Result<Peer> {
	match call(peer, Request::GetPredecessor).await? {
		Response::Predecessor { peer: Some(peer) } => Ok(peer),
		Response::Predecessor { peer: None } => Err(Error::NoPredecessor),
		other => Err(unexpected(other)),
	}
}

/// Tell `peer` that `candidate` believes itself to be its predecessor.
pub async fn notify(peer: &Peer, candidate: &Peer) -> Result<()> {
	match call(peer, Request::Notify { candidate: candidate.clone() }).await? {
		Response::Notified => Ok(()),
		other => Err(unexpected(other)),
	}
}

pub async fn get(peer: &Peer, key: &str) -> Result<String> {
	match call(peer, Request::Get { key: key.to_string() }).await? {
		Response::Value { value: Some(value) } => Ok(value),
		Response::Value { value: None } => Err(Error::NotFound),
		other => Err(unexpected(other)),
	}
}

pub async fn put(peer: &Peer, key: &str, value: &str) -> Result<()> {
	let request = Request::Put {
		key: key.to_string(),
		value: value.to_string(),
	};
	match call(peer, request).await? {
		Response::Stored => Ok(()),
		other => Err(unexpected(other)),
	}
}

/// Returns whether the key existed before the deletion.
pub async fn delete(peer: &Peer, key: &str) -> Result<bool> {
	match call(peer, Request::Delete { key: key.to_string() }).await? {
		Response::Deleted { existed } => Ok(existed),
		other => Err(unexpected(other)),
	}
}

fn unexpected(response: Response) -> Error {
	match response {
		Response::Error { message } => Error::Remote(message),
		other => Error::Remote(format!("unexpected response: {:?}", other)),
	}
}
