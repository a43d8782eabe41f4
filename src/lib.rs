//! Serial stream classifier and frame assembler for CTG monitors.
//!
//! ctglink reads the byte stream of a cardiotocograph, works out whether it
//! speaks the framed binary protocol or plain text telemetry, and turns it into
//! typed records.
//!
//! # Features
//!
//! - **Mode detection**: probe handshake match or a text-likelihood streak
//! - **Framing**: `DLE`-stuffed frames with CRC-16, resynchronizing on any fault
//! - **Typed records**: heart-rate, TOCO and status fields of `'C'` frames, temperature of `'T'` frames
//! - **Async read loop**: one tokio task per connection, cancellable, with serialized writes
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ctglink::{Link, LinkConfig, LinkEvent};
//! use ctglink::transports::MemoryTransport;
//!
//! #[tokio::main]
//! async fn main() -> ctglink::Result<()> {
//!     let mut link = Link::new(LinkConfig::default())?;
//!     let (transport, _handle) = MemoryTransport::new();
//!     link.set_transport(transport).await?;
//!     link.write("G").await?;
//!
//!     while let Some(event) = link.next_event().await {
//!         match event {
//!             LinkEvent::Record(record) => println!("{:?}", record),
//!             LinkEvent::TextLine(line) => println!("{}", line.text),
//!             LinkEvent::Error(err) => eprintln!("{}", err.user_message()),
//!             LinkEvent::Disconnected => break,
//!             _ => {}
//!         }
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Protocol layers
pub mod classifier;
pub mod config;
pub mod engine;
pub mod events;
pub mod protocol;
pub mod stream;

// Connection management
pub mod driver;
pub mod link;
pub mod transport;
pub mod transports;

// Core exports
pub use error::*;
pub use types::*;

// Main API exports
pub use config::{CrcPolicy, LinkConfig};
pub use engine::StreamEngine;
pub use events::{EventSink, LinkEvent};
pub use link::Link;
pub use transport::Transport;
