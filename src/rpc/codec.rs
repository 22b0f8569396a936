use std::io::ErrorKind;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Deserializer, error::Category};
use tokio::{net::TcpStream, io::{AsyncWriteExt, AsyncReadExt}};

use crate::error::{Error, Result};

/// A TcpStream carrying a sequence of serde_json values. The deserializer
/// itself does the framing: bytes are buffered until they form at least one
/// complete value.
pub struct JsonStream {
	stream: TcpStream,
	buffer: Vec<u8>,
}

impl JsonStream {
	pub fn new(stream: TcpStream) -> Self {
		Self {
			stream,
			buffer: Vec::new(),
		}
	}

	pub async fn read<T: DeserializeOwned>(&mut self) -> Result<T> {
		loop {
			// attempt to deserialize the front of the buffer
			let mut deserializer = Deserializer::from_slice(self.buffer.as_slice()).into_iter();
			match deserializer.next() {
				Some(Ok(value)) => {
					let consumed = deserializer.byte_offset();
					self.buffer.drain(..consumed);
					return Ok(value);
				},
				// an EOF here only means the value is still incomplete
				Some(Err(ref e)) if e.classify() == Category::Eof => {},
				Some(Err(e)) => {
					return Err(Error::Codec(e));
				},
				None => {},
			}

			// else, read more bytes into the buffer
			let mut tmp_buf = vec![0; 1024];
			match self.stream.read(&mut tmp_buf).await {
				Ok(0) => {
					return Err(Error::Transport(ErrorKind::UnexpectedEof.into()));
				},
				Ok(len) => {
					self.buffer.extend_from_slice(&tmp_buf[..len]);
				},
				Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
					continue;
				},
				Err(e) => {
					return Err(Error::Transport(e));
				},
			}
		}
	}

	pub async fn write<T: Serialize>(&mut self, value: &T) -> Result<()> {
		let raw_data = serde_json::to_string(value)?;
		self.stream.write_all(raw_data.as_bytes()).await?;
		Ok(())
	}
}
