// ABOUTME: SMPP v3.4 load-generation client: paced submit_sm traffic over a transceiver session
// ABOUTME: Exposes the codec, session, segmentation, scheduler and the runner that ties them together

//! Bind to an SMSC as a transceiver, submit messages at a fixed rate, and
//! answer whatever comes back (receipts, enquire_link, unbind) until the run
//! ends.
//!
//! # Example
//!
//! ```rust,no_run
//! use smpp_loadtest::client::TcpConnector;
//! use smpp_loadtest::config::{SendConfig, SessionConfig};
//! use smpp_loadtest::encoding::Encoding;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let connector = TcpConnector::new(SessionConfig::new("localhost", 2775, "user", "secret"));
//!     let send = SendConfig::builder()
//!         .rate(20)
//!         .max_count(100)
//!         .text("Привет, мир")
//!         .encoding(Encoding::select("cyrillic"))
//!         .build()?;
//!
//!     let (_stop, shutdown) = tokio::sync::watch::channel(false);
//!     let stats = smpp_loadtest::runner::run(&connector, send, shutdown).await?;
//!     println!("{stats}");
//!     Ok(())
//! }
//! ```

mod macros;

pub mod client;
pub mod codec;
pub mod config;
pub mod connection;
pub mod datatypes;
pub mod dispatcher;
pub mod encoding;
pub mod error;
pub mod receipt;
pub mod runner;
pub mod scheduler;
pub mod segment;


pub use codec::{CodecError, Decodable, Encodable, Frame, PduHeader, PduRegistry};

pub use client::{
    SmppConnection, SmppConnector, SmppError, SmppResult, SmppTransmitter, SubmitError,
    TcpConnector, TransceiverSession,
};
pub use config::{ConfigError, SendConfig, SessionConfig};
pub use dispatcher::{Dispatcher, InboundEvent, PduHandler, Reply};
pub use encoding::{Encoding, EncodingError};
pub use error::LoadTestError;
pub use scheduler::{RunError, RunStats, Scheduler};
pub use segment::{MessageUnit, segment};
