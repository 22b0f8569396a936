use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::info;

use crate::error::Result;
use crate::node::Node;
use crate::rpc;

/// Default delay between maintenance rounds.
pub const STABILIZE_PERIOD: Duration = Duration::from_secs(1);

/// A running ring member: the accept loop plus the maintenance loop.
/// Dropping the handle leaves both tasks running for the life of the
/// process, which is the daemon case; stop() tears them down, which is what
/// lets tests start and stop nodes deterministically.
pub struct NodeHandle {
	node: Node,
	listener_handle: JoinHandle<()>,
	maintenance_handle: JoinHandle<()>,
}

impl Node {
	/// Bind the service endpoint and start serving and stabilizing.
	pub async fn serve(&self, period: Duration) -> Result<NodeHandle> {
		let listener = TcpListener::bind(self.me().endpoint()).await?;
		info!("listening on {}", self.me().endpoint());
		let listener_handle = rpc::server::spawn(self.clone(), listener);

		let maintenance_node = self.clone();
		let maintenance_handle = tokio::spawn(async move {
			let mut ticker = interval(period);
			loop {
				ticker.tick().await;
				maintenance_node.stabilize().await;
				maintenance_node.fix_fingers().await;
			}
		});

		Ok(NodeHandle {
			node: self.clone(),
			listener_handle,
			maintenance_handle,
		})
	}
}

impl NodeHandle {
	pub fn node(&self) -> &Node {
		&self.node
	}

	/// Force the member to stop serving and stabilizing.
	pub async fn stop(self) {
		self.listener_handle.abort();
		let _ = self.listener_handle.await;
		self.maintenance_handle.abort();
		let _ = self.maintenance_handle.await;
	}
}
