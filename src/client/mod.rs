// ABOUTME: SMPP client module: a bound transceiver session behind native async traits
// ABOUTME: Exports the session, its connector, keep-alive bookkeeping, credentials and error types

//! SMPP Client Module
//!
//! * **Native async traits** - `async fn` in traits, no `async_trait` dependency
//! * **Background tasks** - reader, writer and keep-alive run alongside the caller
//! * **Backpressure** - `submit` waits for queue space, never for the SMSC's reply
//! * **Keep-alive** - periodic enquire_link with failure counting
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use smpp_loadtest::client::{SmppConnection, SmppConnector, SmppTransmitter, TcpConnector};
//! use smpp_loadtest::config::SessionConfig;
//! use smpp_loadtest::datatypes::{Address, SubmitSm};
//! use smpp_loadtest::dispatcher::Dispatcher;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connector = TcpConnector::new(SessionConfig::new("localhost", 2775, "system_id", "password"));
//! let mut session = connector.open(Arc::new(Dispatcher::new())).await?;
//!
//! let pdu = SubmitSm::new(
//!     Address::unknown("test")?,
//!     Address::unknown("447700900123")?,
//!     0x00,
//!     bytes::Bytes::from_static(b"Hello!"),
//! );
//! session.submit(pdu).await?;
//!
//! session.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod keepalive;
pub mod session;
pub mod traits;
pub mod types;

pub use error::{SmppError, SmppResult, SubmitError};
pub use keepalive::{KeepAliveConfig, KeepAliveManager, KeepAliveStatus};
pub use session::{TcpConnector, TransceiverSession};
pub use traits::{SmppConnection, SmppConnector, SmppTransmitter};
pub use types::BindCredentials;
