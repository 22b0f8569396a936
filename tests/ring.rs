mod common;

use std::time::Duration;

use tokio::time::sleep;

use chord_kv::{ring_id, Error};

const PERIOD: Duration = Duration::from_millis(100);

#[tokio::test]
async fn two_nodes_converge_to_a_mutual_ring() {
	let handles = common::make_ring(7310, 2, PERIOD).await;

	// give stabilization a bounded number of rounds to settle
	sleep(Duration::from_secs(2)).await;

	let a = handles[0].node();
	let b = handles[1].node();

	assert_eq!(a.successor().await.id, b.me().id);
	assert_eq!(b.successor().await.id, a.me().id);
	assert_eq!(a.predecessor().await.map(|p| p.id), Some(b.me().id));
	assert_eq!(b.predecessor().await.map(|p| p.id), Some(a.me().id));

	// the lowest finger tracks the point right after the node, which is
	// always owned by the successor
	let a_first = a.fingers().await[0].clone().expect("finger 0 should be set");
	let b_first = b.fingers().await[0].clone().expect("finger 0 should be set");
	assert_eq!(a_first.id, b.me().id);
	assert_eq!(b_first.id, a.me().id);

	for handle in handles {
		handle.stop().await;
	}
}

#[tokio::test]
async fn successor_pointers_cycle_through_every_member() {
	let handles = common::make_ring(7320, 4, PERIOD).await;

	sleep(Duration::from_secs(4)).await;

	// walk the ring from the first node; every member must appear exactly
	// once before the walk returns to its origin
	let origin = handles[0].node().me().id;
	let mut seen = vec![origin];
	let mut current = handles[0].node().successor().await;
	while current.id != origin {
		assert!(!seen.contains(&current.id), "successor walk revisited a node");
		seen.push(current.id);
		let member = handles
			.iter()
			.find(|h| h.node().me().id == current.id)
			.expect("successor points at an unknown node");
		current = member.node().successor().await;
	}
	assert_eq!(seen.len(), handles.len());

	for handle in handles {
		handle.stop().await;
	}
}

#[tokio::test]
async fn keys_round_trip_through_any_member() {
	let handles = common::make_ring(7330, 3, PERIOD).await;

	sleep(Duration::from_secs(3)).await;

	let first = handles[0].node();
	let last = handles[2].node();

	first
		.put("color".to_string(), "green".to_string())
		.await
		.unwrap();
	assert_eq!(last.get("color").await.unwrap(), "green");

	// overwrite through a different member
	last.put("color".to_string(), "blue".to_string())
		.await
		.unwrap();
	assert_eq!(first.get("color").await.unwrap(), "blue");

	// an empty value round-trips as present
	first.put("blank".to_string(), String::new()).await.unwrap();
	assert_eq!(last.get("blank").await.unwrap(), "");

	for handle in handles {
		handle.stop().await;
	}
}

#[tokio::test]
async fn deleted_keys_read_as_not_found() {
	let handles = common::make_ring(7340, 3, PERIOD).await;

	sleep(Duration::from_secs(3)).await;

	let first = handles[0].node();
	let last = handles[2].node();

	first
		.put("tmp".to_string(), "value".to_string())
		.await
		.unwrap();
	assert!(last.delete("tmp").await.unwrap());
	assert!(matches!(first.get("tmp").await, Err(Error::NotFound)));

	// deleting a key that was never stored reports absence, not an error
	assert!(!first.delete("tmp").await.unwrap());
	assert!(!last.delete("never-stored").await.unwrap());

	for handle in handles {
		handle.stop().await;
	}
}

#[tokio::test]
async fn key_ownership_is_stable_for_a_fixed_membership() {
	let handles = common::make_ring(7350, 3, PERIOD).await;

	sleep(Duration::from_secs(3)).await;

	let id = ring_id::hash(b"stable-key");
	let owner = handles[0].node().find_successor(id).await.unwrap();
	for handle in &handles {
		for _ in 0..3 {
			let resolved = handle.node().find_successor(id).await.unwrap();
			assert_eq!(resolved.id, owner.id);
		}
	}

	for handle in handles {
		handle.stop().await;
	}
}
