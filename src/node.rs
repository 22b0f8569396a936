use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::peer::Peer;
use crate::ring_id::{self, RING_BITS};
use crate::rpc::{self, Request, Response};

/// Ring pointers of one member. Guarded as a unit, so a notify arriving in
/// the middle of a stabilization round can never observe a torn update.
struct Ring {
	successor: Peer,
	predecessor: Option<Peer>,
	fingers: Vec<Option<Peer>>,
}

/// One ring member. Clones share the same state, so a Node can be handed to
/// the listener, the maintenance loop, and any number of request handlers at
/// once. Ring pointers and the key-value map are separate lock groups, and
/// neither lock is ever held across a remote call; remote results are
/// re-applied under a fresh acquisition.
#[derive(Clone)]
pub struct Node {
	inner: Arc<Inner>,
}

struct Inner {
	me: Peer,
	ring: Mutex<Ring>,
	store: Mutex<HashMap<String, String>>,
}

impl Node {
	/// A fresh node is a ring of one: its own successor, with no
	/// predecessor and an empty finger table.
	pub fn new(host: impl Into<String>, port: u16) -> Self {
		let me = Peer::new(host, port);
		let ring = Ring {
			successor: me.clone(),
			predecessor: None,
			fingers: vec![None; RING_BITS as usize],
		};
		Node {
			inner: Arc::new(Inner {
				me,
				ring: Mutex::new(ring),
				store: Mutex::new(HashMap::new()),
			}),
		}
	}

	pub fn me(&self) -> &Peer {
		&self.inner.me
	}

	pub async fn successor(&self) -> Peer {
		self.inner.ring.lock().await.successor.clone()
	}

	pub async fn predecessor(&self) -> Option<Peer> {
		self.inner.ring.lock().await.predecessor.clone()
	}

	pub async fn fingers(&self) -> Vec<Option<Peer>> {
		self.inner.ring.lock().await.fingers.clone()
	}

	/// One-shot bootstrap: obtain an initial successor from an existing
	/// member, or host a new ring when no bootstrap peer is given. Ring
	/// convergence after a join is entirely the stabilizer's job; all a
	/// join needs is the successor pointer and a seeded finger table.
	pub async fn join(&self, bootstrap: Option<&Peer>) -> Result<()> {
		let Some(bootstrap) = bootstrap else {
			info!("hosting a new ring as {}", self.inner.me);
			return Ok(());
		};
		let successor = rpc::find_successor(bootstrap, self.inner.me.id).await?;
		info!("joined via {}, successor is {}", bootstrap, successor);
		{
			let mut ring = self.inner.ring.lock().await;
			ring.successor = successor;
			// discovered through the successor's next stabilization round
			ring.predecessor = None;
		}
		// seed the finger table now instead of waiting a full period
		self.fix_fingers().await;
		Ok(())
	}

	/// Resolve the ring member responsible for `id`. At most one remote hop
	/// is issued from here; the next node recurses the same way on its side.
	pub async fn find_successor(&self, id: u32) -> Result<Peer> {
		let successor = self.successor().await;
		// our own successor already covers the arc (me, successor]
		if ring_id::between_right_incl(id, self.inner.me.id, successor.id) {
			return Ok(successor);
		}
		let next = self.closest_preceding_node(id).await;
		if next.id == self.inner.me.id {
			// no finger makes progress toward id, answer with self
			return Ok(self.inner.me.clone());
		}
		rpc::find_successor(&next, id).await
	}

	/// Best known node strictly preceding `id`: scan the finger table from
	/// the top down and take the first entry inside (me, id).
	async fn closest_preceding_node(&self, id: u32) -> Peer {
		let ring = self.inner.ring.lock().await;
		for finger in ring.fingers.iter().rev().flatten() {
			if ring_id::between(finger.id, self.inner.me.id, id) {
				return finger.clone();
			}
		}
		self.inner.me.clone()
	}

	/// One stabilization round: adopt a closer successor if our current
	/// successor knows of one, then notify the successor about us. A remote
	/// failure abandons the round; the next period retries.
	pub async fn stabilize(&self) {
		let successor = self.successor().await;

		// ask the successor for its predecessor; in a ring of one that is a
		// local read rather than a loopback call
		let candidate = if successor.id == self.inner.me.id {
			self.predecessor().await
		} else {
			match rpc::get_predecessor(&successor).await {
				Ok(peer) => Some(peer),
				Err(Error::NoPredecessor) => None,
				Err(e) => {
					debug!("stabilize round abandoned: {}", e);
					return;
				},
			}
		};

		let successor = {
			let mut ring = self.inner.ring.lock().await;
			if let Some(candidate) = candidate {
				// a node that joined between us and our old successor
				if ring_id::between(candidate.id, self.inner.me.id, ring.successor.id) {
					info!("adopting closer successor {}", candidate);
					ring.successor = candidate;
				}
			}
			ring.successor.clone()
		};

		if successor.id != self.inner.me.id {
			if let Err(e) = rpc::notify(&successor, &self.inner.me).await {
				debug!("notify failed, will retry next round: {}", e);
			}
		}
	}

	/// Inbound claim from a peer that believes it is our predecessor.
	/// Accepted only if we have none, or the candidate is closer than the
	/// one we have. This is the only path that updates the predecessor.
	pub async fn notify(&self, candidate: Peer) {
		if candidate.id == self.inner.me.id {
			return;
		}
		let mut ring = self.inner.ring.lock().await;
		let accept = match &ring.predecessor {
			None => true,
			Some(current) => ring_id::between(candidate.id, current.id, self.inner.me.id),
		};
		if accept {
			debug!("predecessor is now {}", candidate);
			ring.predecessor = Some(candidate);
		}
	}

	/// Refresh every finger entry through the normal lookup path. The first
	/// failure abandons the round and leaves the remaining entries for the
	/// next period; stale entries only cost extra hops.
	pub async fn fix_fingers(&self) {
		for index in 0..RING_BITS {
			let target = ring_id::finger_target(self.inner.me.id, index);
			match self.find_successor(target).await {
				Ok(peer) => {
					let mut ring = self.inner.ring.lock().await;
					ring.fingers[index as usize] = Some(peer);
				},
				Err(e) => {
					debug!("fix_fingers abandoned at index {}: {}", index, e);
					return;
				},
			}
		}
	}

	/// Store a key/value pair on its owning node, forwarding at most once.
	/// An existing value is overwritten.
	pub async fn put(&self, key: String, value: String) -> Result<()> {
		let owner = self.find_successor(ring_id::hash(key.as_bytes())).await?;
		if owner.id == self.inner.me.id {
			self.inner.store.lock().await.insert(key, value);
			Ok(())
		} else {
			rpc::put(&owner, &key, &value).await
		}
	}

	/// Fetch the value stored under `key` from its owning node. An absent
	/// key is a normal NotFound outcome, distinct from an empty value.
	pub async fn get(&self, key: &str) -> Result<String> {
		let owner = self.find_successor(ring_id::hash(key.as_bytes())).await?;
		if owner.id == self.inner.me.id {
			self.inner.store.lock().await.get(key).cloned().ok_or(Error::NotFound)
		} else {
			rpc::get(&owner, key).await
		}
	}

	/// Remove `key` at its owning node, reporting whether it existed. The
	/// lookup routes once and the deletion happens exactly once.
	pub async fn delete(&self, key: &str) -> Result<bool> {
		let owner = self.find_successor(ring_id::hash(key.as_bytes())).await?;
		if owner.id == self.inner.me.id {
			Ok(self.inner.store.lock().await.remove(key).is_some())
		} else {
			rpc::delete(&owner, key).await
		}
	}

	/// Map one inbound request onto the engines above. Failures are
	/// answered to the requesting peer only; they never tear this node down.
	pub async fn handle(&self, request: Request) -> Response {
		match request {
			Request::FindSuccessor { id } => match self.find_successor(id).await {
				Ok(peer) => Response::Successor { peer },
				Err(e) => Response::Error { message: e.to_string() },
			},
			Request::GetPredecessor => Response::Predecessor {
				peer: self.predecessor().await,
			},
			Request::Notify { candidate } => {
				self.notify(candidate).await;
				Response::Notified
			},
			Request::Get { key } => {
				info!("get request for key {:?}", key);
				match self.get(&key).await {
					Ok(value) => Response::Value { value: Some(value) },
					Err(Error::NotFound) => Response::Value { value: None },
					Err(e) => Response::Error { message: e.to_string() },
				}
			},
			Request::Put { key, value } => {
				info!("put request for key {:?}", key);
				match self.put(key, value).await {
					Ok(()) => Response::Stored,
					Err(e) => Response::Error { message: e.to_string() },
				}
			},
			Request::Delete { key } => {
				info!("delete request for key {:?}", key);
				match self.delete(&key).await {
					Ok(existed) => Response::Deleted { existed },
					Err(e) => Response::Error { message: e.to_string() },
				}
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn peer_at(id: u32) -> Peer {
		Peer {
			id,
			host: "10.0.0.1".to_string(),
			port: 9000,
		}
	}

	#[tokio::test]
	async fn new_node_is_a_ring_of_one() {
		let node = Node::new("127.0.0.1", 4000);
		node.join(None).await.unwrap();

		assert_eq!(node.successor().await.id, node.me().id);
		assert!(node.predecessor().await.is_none());
	}

	#[tokio::test]
	async fn lone_node_resolves_every_id_to_itself() {
		let node = Node::new("127.0.0.1", 4001);
		node.join(None).await.unwrap();

		let me = node.me().id;
		for id in [0, 1, me, me.wrapping_add(1), me.wrapping_sub(1), u32::MAX] {
			assert_eq!(node.find_successor(id).await.unwrap().id, me);
		}
	}

	#[tokio::test]
	async fn lone_node_serves_its_own_keys() {
		let node = Node::new("127.0.0.1", 4002);
		node.join(None).await.unwrap();

		node.put("name".to_string(), "ada".to_string()).await.unwrap();
		assert_eq!(node.get("name").await.unwrap(), "ada");

		node.put("name".to_string(), "grace".to_string()).await.unwrap();
		assert_eq!(node.get("name").await.unwrap(), "grace");

		// an empty value is present, not missing
		node.put("empty".to_string(), String::new()).await.unwrap();
		assert_eq!(node.get("empty").await.unwrap(), "");

		assert!(node.delete("name").await.unwrap());
		assert!(matches!(node.get("name").await, Err(Error::NotFound)));
		assert!(!node.delete("name").await.unwrap());
	}

	#[tokio::test]
	async fn notify_accepts_only_closer_candidates() {
		let node = Node::new("127.0.0.1", 4003);
		let me = node.me().id;

		// first candidate is always accepted
		node.notify(peer_at(me.wrapping_sub(100))).await;
		assert_eq!(node.predecessor().await.unwrap().id, me.wrapping_sub(100));

		// closer candidate replaces it
		node.notify(peer_at(me.wrapping_sub(10))).await;
		assert_eq!(node.predecessor().await.unwrap().id, me.wrapping_sub(10));

		// farther candidate is rejected
		node.notify(peer_at(me.wrapping_sub(50))).await;
		assert_eq!(node.predecessor().await.unwrap().id, me.wrapping_sub(10));

		// our own id never becomes the predecessor
		node.notify(peer_at(me)).await;
		assert_eq!(node.predecessor().await.unwrap().id, me.wrapping_sub(10));
	}

	#[tokio::test]
	async fn concurrent_notify_burst_settles_on_the_closest_candidate() {
		let node = Node::new("127.0.0.1", 4004);
		let me = node.me().id;

		let candidates: Vec<Peer> = (1..=64u32)
			.map(|step| peer_at(me.wrapping_sub(step * 1000)))
			.collect();

		let mut tasks = Vec::new();
		for candidate in candidates.clone() {
			let node = node.clone();
			tasks.push(tokio::spawn(async move {
				node.notify(candidate).await;
			}));
		}
		for task in tasks {
			task.await.unwrap();
		}

		// acceptance is monotone, so any interleaving ends on the candidate
		// no other candidate beats
		let expected = candidates
			.into_iter()
			.reduce(|best, candidate| {
				if ring_id::between(candidate.id, best.id, me) {
					candidate
				} else {
					best
				}
			})
			.unwrap();
		let settled = node.predecessor().await.unwrap();
		assert_eq!(settled.id, expected.id);
		assert_ne!(settled.id, me);
	}
}
