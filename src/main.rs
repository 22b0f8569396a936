use anyhow::Context;
use clap::Parser;
use tracing::info;

use chord_kv::handle::STABILIZE_PERIOD;
use chord_kv::{Node, Peer};

/// Ring member daemon: joins an existing ring through a bootstrap member,
/// or hosts a new one, then serves the member interface until interrupted.
#[derive(Parser, Debug)]
struct Args {
	/// Port to listen on.
	port: u16,
	/// Host of an existing member to join through. Omit to host a new ring.
	bootstrap_host: Option<String>,
	/// Port of the bootstrap member.
	bootstrap_port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_max_level(tracing::Level::INFO)
		.init();

	let args = Args::parse();

	let host = local_ip().unwrap_or_else(|| "127.0.0.1".to_string());
	let node = Node::new(host, args.port);
	info!("node identity: {}", node.me());

	let bootstrap = match (args.bootstrap_host, args.bootstrap_port) {
		(Some(host), Some(port)) => Some(Peer::new(host, port)),
		(None, None) => None,
		_ => anyhow::bail!("bootstrap host and port must be given together"),
	};
	// being pointed at our own endpoint also means hosting
	let bootstrap = bootstrap.filter(|peer| peer.endpoint() != node.me().endpoint());

	node.join(bootstrap.as_ref())
		.await
		.context("could not join the ring")?;

	let handle = node
		.serve(STABILIZE_PERIOD)
		.await
		.context("could not bind the service endpoint")?;

	tokio::signal::ctrl_c().await?;
	info!("shutting down");
	handle.stop().await;
	Ok(())
}

/// Routable local address, found by the connected-UDP-socket trick. Falls
/// back to loopback when the host is offline.
fn local_ip() -> Option<String> {
	let socket = std::net::UdpSocket::bind("0.0.0.0:0").ok()?;
	socket.connect("8.8.8.8:80").ok()?;
	Some(socket.local_addr().ok()?.ip().to_string())
}
