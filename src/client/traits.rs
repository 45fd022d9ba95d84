// ABOUTME: Seams between the load-test core and the SMPP transport, using native async trait methods
// ABOUTME: The scheduler and runner only see these traits, so tests can swap in in-memory fakes

use crate::client::error::{SmppResult, SubmitError};
use crate::datatypes::SubmitSm;
use crate::dispatcher::PduHandler;
use std::sync::Arc;

/// Lifecycle of a bound session
pub trait SmppConnection {
    /// Unbind if still bound and release the connection.
    ///
    /// Consumes the session, so it runs exactly once.
    async fn close(self) -> SmppResult<()>
    where
        Self: Sized;

    /// True while the session is bound and not yet closed by either side
    fn is_bound(&self) -> bool;
}

/// Outbound submissions
pub trait SmppTransmitter {
    /// Queue a submit_sm for sending. The session assigns the sequence
    /// number. Waits only for queue space, never for the SMSC's response.
    async fn submit(&mut self, pdu: SubmitSm) -> Result<(), SubmitError>;
}

/// Opens bound sessions with an inbound PDU handler registered
pub trait SmppConnector {
    type Session: SmppConnection + SmppTransmitter;

    /// Connect and bind. The handler receives every inbound PDU for the
    /// lifetime of the session.
    async fn open(&self, handler: Arc<dyn PduHandler>) -> SmppResult<Self::Session>;
}
