use std::time::Duration;

use chord_kv::{Node, NodeHandle, Peer};

/// Spin up `qty` nodes on consecutive loopback ports. The first hosts a new
/// ring; the rest join through it.
pub async fn make_ring(base_port: u16, qty: u16, period: Duration) -> Vec<NodeHandle> {
	let mut handles = Vec::new();
	for i in 0..qty {
		let node = Node::new("127.0.0.1", base_port + i);
		let bootstrap = if i == 0 {
			None
		} else {
			Some(Peer::new("127.0.0.1", base_port))
		};
		node.join(bootstrap.as_ref()).await.expect("join should succeed");
		let handle = node.serve(period).await.expect("nodes should be able to start");
		handles.push(handle);
	}
	handles
}
