use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::node::Node;

use super::{Request, codec::JsonStream};

/// Accept loop for the ring member service. Every connection gets its own
/// task and may issue any number of requests before closing, so a blocked
/// outbound hop on one handler never stalls unrelated inbound traffic.
pub fn spawn(node: Node, listener: TcpListener) -> JoinHandle<()> {
	tokio::spawn(async move {
		loop {
			match listener.accept().await {
				Ok((stream, remote_addr)) => {
					debug!("accepted connection from {}", remote_addr);
					let node = node.clone();
					tokio::spawn(async move {
						serve_connection(node, stream).await;
					});
				},
				Err(e) => {
					warn!("accept failed: {}", e);
				},
			}
		}
	})
}

async fn serve_connection(node: Node, stream: TcpStream) {
	let mut stream = JsonStream::new(stream);
	loop {
		let request = match stream.read::<Request>().await {
			Ok(request) => request,
			// peer hung up or sent something unreadable, drop the connection
			Err(_) => break,
		};
		let response = node.handle(request).await;
		if stream.write(&response).await.is_err() {
			break;
		}
	}
}
