use clap::{Parser, Subcommand};

use chord_kv::{ring_id, rpc, Error, Peer};

/// Thin client: issues one operation against a running ring member, which
/// routes it to the owning node.
#[derive(Parser, Debug)]
struct Args {
	/// Host of any ring member.
	host: String,
	/// Port of that member.
	port: u16,
	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Store a key/value pair on its owning node.
	Store { key: String, value: String },
	/// Fetch the value stored under a key.
	Retrieve { key: String },
	/// Remove a key from its owning node.
	Delete { key: String },
	/// Show which node owns a key.
	Lookup { key: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();
	let member = Peer::new(args.host, args.port);

	match args.command {
		Command::Store { key, value } => {
			rpc::put(&member, &key, &value).await?;
			println!("stored {:?}", key);
		},
		Command::Retrieve { key } => match rpc::get(&member, &key).await {
			Ok(value) => println!("{}", value),
			Err(Error::NotFound) => println!("key {:?} not found", key),
			Err(e) => return Err(e.into()),
		},
		Command::Delete { key } => {
			if rpc::delete(&member, &key).await? {
				println!("deleted {:?}", key);
			} else {
				println!("key {:?} did not exist", key);
			}
		},
		Command::Lookup { key } => {
			let owner = rpc::find_successor(&member, ring_id::hash(key.as_bytes())).await?;
			println!("{}", owner);
		},
	}
	Ok(())
}
