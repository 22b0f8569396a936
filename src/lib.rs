//! A key-value store spread over a ring of cooperating nodes.
//!
//! Every node owns the arc of the identifier space between its predecessor
//! and itself, resolves arbitrary ids to their owning node through a finger
//! table, and keeps its ring pointers converging through periodic
//! stabilization.

pub mod ring_id;

pub mod peer;
pub use peer::Peer;

pub mod error;
pub use error::{Error, Result};

pub mod rpc;

pub mod node;
pub use node::Node;

pub mod handle;
pub use handle::NodeHandle;
