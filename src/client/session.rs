// ABOUTME: Bound transceiver session: background reader, writer and enquire_link tasks over one socket
// ABOUTME: Replies go on an unbounded control queue ahead of submissions, which wait on a bounded queue

use crate::client::error::{SmppError, SmppResult, SubmitError};
use crate::client::keepalive::{KeepAliveManager, KeepAliveStatus};
use crate::client::traits::{SmppConnection, SmppConnector, SmppTransmitter};
use crate::codec::{Encodable, Frame};
use crate::config::SessionConfig;
use crate::connection::{Connection, ConnectionError, FrameReader, FrameWriter};
use crate::datatypes::{EnquireLink, EnquireLinkResponse, GenericNack, SubmitSm, Unbind};
use crate::dispatcher::{InboundEvent, PduHandler};
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::{Notify, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, timeout};
use tracing::{debug, error, info, warn};

/// How long each step of `close` may take: queueing unbind, unbind_resp, writer exit
const UNBIND_TIMEOUT: Duration = Duration::from_secs(2);

/// Sequence numbers run 1..=0x7FFFFFFF and then wrap to 1
const MAX_SEQUENCE: u32 = 0x7FFF_FFFF;

/// Connects over TCP and binds as a transceiver
#[derive(Debug, Clone)]
pub struct TcpConnector {
    config: SessionConfig,
}

impl TcpConnector {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }
}

impl SmppConnector for TcpConnector {
    type Session = TransceiverSession;

    async fn open(&self, handler: Arc<dyn PduHandler>) -> SmppResult<TransceiverSession> {
        let addr = self.config.addr();
        info!(%addr, system_id = %self.config.system_id, "connecting");

        timeout(self.config.bind_timeout, connect(&addr, &self.config, handler))
            .await
            .map_err(|_| SmppError::Timeout)?
    }
}

async fn connect(
    addr: &str,
    config: &SessionConfig,
    handler: Arc<dyn PduHandler>,
) -> SmppResult<TransceiverSession> {
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    TransceiverSession::bind(stream, config, handler).await
}

/// State shared by the session handle and its tasks
struct Shared {
    /// Last sequence number handed out
    sequence: AtomicU32,
    bound: AtomicBool,
    closed: watch::Sender<bool>,
    control: mpsc::UnboundedSender<Bytes>,
    keep_alive: Mutex<KeepAliveManager>,
    unbind_resp: Notify,
}

impl Shared {
    fn next_sequence(&self) -> u32 {
        let advance = |seq: u32| if seq >= MAX_SEQUENCE { 1 } else { seq + 1 };
        let prev = self
            .sequence
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |seq| Some(advance(seq)))
            .unwrap_or_else(|prev| prev);
        advance(prev)
    }

    fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    fn mark_closed(&self, reason: &str) {
        self.bound.store(false, Ordering::Release);
        if !self.closed.send_replace(true) {
            info!(reason, "session closed");
        }
    }

    /// Queue a reply or link-level PDU ahead of any submission
    fn send_control(&self, frame: Frame) -> bool {
        match frame.to_bytes() {
            Ok(pdu) => self.control.send(pdu).is_ok(),
            Err(e) => {
                error!(pdu = frame.name(), error = %e, "cannot encode outbound PDU");
                false
            }
        }
    }

    fn keep_alive(&self) -> MutexGuard<'_, KeepAliveManager> {
        self.keep_alive.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn wait_closed(mut closed: watch::Receiver<bool>) {
    let _ = closed.wait_for(|closed| *closed).await;
}

/// A bound transceiver session.
///
/// Inbound PDUs are handled on a reader task that calls the registered
/// [`PduHandler`] and queues its reply. Outbound PDUs are written by a
/// single writer task that always drains the control queue (replies and
/// enquire_link) before taking the next submission. Unbind travels on the
/// submission queue, so every accepted submit_sm is written first. A keep-alive
/// task sends enquire_link on a fixed interval and closes the session when
/// too many go unanswered.
pub struct TransceiverSession {
    shared: Arc<Shared>,
    data: mpsc::Sender<Bytes>,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
    keep_alive: Option<JoinHandle<()>>,
}

impl TransceiverSession {
    /// Bind over an established stream and start the session tasks.
    pub async fn bind<S>(
        stream: S,
        config: &SessionConfig,
        handler: Arc<dyn PduHandler>,
    ) -> SmppResult<Self>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let mut connection = Connection::new(stream);
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (closed, _) = watch::channel(false);
        let shared = Arc::new(Shared {
            sequence: AtomicU32::new(0),
            bound: AtomicBool::new(false),
            closed,
            control: control_tx,
            keep_alive: Mutex::new(KeepAliveManager::new(config.keep_alive.clone())),
            unbind_resp: Notify::new(),
        });

        let seq = shared.next_sequence();
        let bind = config.credentials().bind_pdu(seq);
        connection.write_frame(&Frame::BindTransceiver(bind)).await?;
        let smsc_id = await_bind_response(&mut connection, seq).await?;
        info!(smsc = %smsc_id, "bound as transceiver");
        shared.bound.store(true, Ordering::Release);

        let (reader, writer) = connection.into_split();
        let (data_tx, data_rx) = mpsc::channel(config.queue_depth.max(1));

        let writer = tokio::spawn(write_loop(writer, control_rx, data_rx, Arc::clone(&shared)));
        let reader = tokio::spawn(read_loop(
            reader,
            handler,
            config.read_timeout,
            Arc::clone(&shared),
        ));
        let keep_alive = (config.keep_alive.enabled && !config.keep_alive.interval.is_zero())
            .then(|| tokio::spawn(keep_alive_loop(config.keep_alive.interval, Arc::clone(&shared))));

        Ok(Self {
            shared,
            data: data_tx,
            writer,
            reader,
            keep_alive,
        })
    }

    pub fn keep_alive_status(&self) -> KeepAliveStatus {
        self.shared.keep_alive().status()
    }
}

impl SmppTransmitter for TransceiverSession {
    async fn submit(&mut self, mut pdu: SubmitSm) -> Result<(), SubmitError> {
        if self.shared.is_closed() {
            return Err(SubmitError::SessionClosed);
        }
        pdu.sequence_number = self.shared.next_sequence();
        let encoded = pdu.to_bytes()?;
        self.data
            .send(encoded)
            .await
            .map_err(|_| SubmitError::SessionClosed)
    }
}

impl SmppConnection for TransceiverSession {
    async fn close(self) -> SmppResult<()> {
        let TransceiverSession {
            shared,
            data,
            mut writer,
            reader,
            keep_alive,
        } = self;

        let result = if shared.bound.swap(false, Ordering::AcqRel) && !shared.is_closed() {
            unbind(&shared, data).await
        } else {
            drop(data);
            Ok(())
        };

        shared.mark_closed("closed by client");
        if let Some(keep_alive) = keep_alive {
            keep_alive.abort();
        }
        if timeout(UNBIND_TIMEOUT, &mut writer).await.is_err() {
            warn!("writer did not finish, aborting");
            writer.abort();
        }
        reader.abort();

        let status = shared.keep_alive().status();
        debug!(
            pings = status.total_pings,
            pongs = status.total_pongs,
            "keep-alive summary"
        );
        result
    }

    fn is_bound(&self) -> bool {
        self.shared.bound.load(Ordering::Acquire) && !self.shared.is_closed()
    }
}

/// Queue unbind behind every pending submission, close the submission
/// queue and wait for unbind_resp.
async fn unbind(shared: &Shared, data: mpsc::Sender<Bytes>) -> SmppResult<()> {
    let seq = shared.next_sequence();
    let pdu = Frame::Unbind(Unbind::new(seq)).to_bytes()?;
    debug!(
        seq,
        pending = data.max_capacity() - data.capacity(),
        "queueing unbind"
    );

    match timeout(UNBIND_TIMEOUT, data.send(pdu)).await {
        Ok(Ok(())) => {}
        Ok(Err(_)) => {
            debug!("writer already stopped, unbind not sent");
            return Ok(());
        }
        Err(_) => {
            warn!("submission queue still full after {:?}, unbind not sent", UNBIND_TIMEOUT);
            return Err(SmppError::Timeout);
        }
    }
    drop(data);

    match timeout(UNBIND_TIMEOUT, shared.unbind_resp.notified()).await {
        Ok(()) => {
            debug!("unbind acknowledged");
            Ok(())
        }
        Err(_) => {
            warn!("no unbind_resp within {:?}", UNBIND_TIMEOUT);
            Err(SmppError::Timeout)
        }
    }
}

async fn await_bind_response<S>(connection: &mut Connection<S>, seq: u32) -> SmppResult<String>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        match connection.read_frame().await? {
            None => return Err(SmppError::ConnectionClosed),
            Some(Frame::BindTransceiverResp(resp)) if resp.sequence_number == seq => {
                return if resp.command_status.is_ok() {
                    Ok(resp.system_id)
                } else {
                    Err(SmppError::Protocol(resp.command_status))
                };
            }
            Some(Frame::GenericNack(nack)) => return Err(SmppError::Protocol(nack.command_status)),
            Some(Frame::EnquireLink(link)) => {
                connection
                    .write_frame(&Frame::EnquireLinkResp(EnquireLinkResponse::new(
                        link.sequence_number,
                    )))
                    .await?;
            }
            Some(other) => {
                return Err(SmppError::UnexpectedPdu {
                    expected: "bind_transceiver_resp",
                    actual: other.name(),
                });
            }
        }
    }
}

async fn write_loop<S>(
    mut writer: FrameWriter<S>,
    mut control: mpsc::UnboundedReceiver<Bytes>,
    mut data: mpsc::Receiver<Bytes>,
    shared: Arc<Shared>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let closed = wait_closed(shared.closed.subscribe());
    tokio::pin!(closed);

    loop {
        let pdu = tokio::select! {
            biased;

            Some(pdu) = control.recv() => pdu,
            () = &mut closed => break,
            Some(pdu) = data.recv() => pdu,
            else => break,
        };

        if let Err(e) = writer.write_pdu(&pdu).await {
            error!(error = %e, "write failed");
            shared.mark_closed("write failed");
            break;
        }
    }

    if let Err(e) = writer.shutdown().await {
        debug!(error = %e, "socket shutdown failed");
    }
}

async fn read_loop<S>(
    mut reader: FrameReader<S>,
    handler: Arc<dyn PduHandler>,
    read_timeout: Duration,
    shared: Arc<Shared>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let closed = wait_closed(shared.closed.subscribe());
    tokio::pin!(closed);

    loop {
        let read = tokio::select! {
            () = &mut closed => break,
            read = timeout(read_timeout, reader.read_frame()) => read,
        };

        let frame = match read {
            Ok(Ok(Some(frame))) => frame,
            Ok(Ok(None)) => {
                shared.mark_closed("connection closed by SMSC");
                break;
            }
            Ok(Err(ConnectionError::Decode {
                command_id,
                sequence_number,
                source,
            })) => {
                warn!(
                    command_id = format_args!("{command_id:#010x}"),
                    seq = sequence_number,
                    error = %source,
                    "malformed PDU, answering generic_nack"
                );
                shared.send_control(Frame::GenericNack(GenericNack::new(
                    source.to_command_status(),
                    sequence_number,
                )));
                continue;
            }
            Ok(Err(e)) => {
                error!(error = %e, "read failed");
                shared.mark_closed("read failed");
                break;
            }
            Err(_) => {
                warn!("nothing received for {:?}", read_timeout);
                shared.mark_closed("read timeout");
                break;
            }
        };

        match &frame {
            Frame::EnquireLinkResp(_) => shared.keep_alive().on_ping_success(),
            Frame::UnbindResp(_) => shared.unbind_resp.notify_one(),
            _ => {}
        }

        let event = InboundEvent::classify(frame);
        let reply = handler.handle(&event);
        if let Some(response) = reply.response {
            shared.send_control(response);
        }
        if reply.terminate {
            shared.mark_closed("unbind requested by SMSC");
            break;
        }
    }
}

async fn keep_alive_loop(period: Duration, shared: Arc<Shared>) {
    let closed = wait_closed(shared.closed.subscribe());
    tokio::pin!(closed);

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let now = tokio::select! {
            () = &mut closed => break,
            now = ticker.tick() => now,
        };

        let (failed, ping) = {
            let mut keep_alive = shared.keep_alive();
            keep_alive.check_timeout(now);
            let failed = keep_alive.is_connection_failed();
            let ping = !failed && keep_alive.should_ping(now);
            if ping {
                keep_alive.on_ping_sent(now);
            }
            (failed, ping)
        };

        if failed {
            warn!("enquire_link unanswered too many times");
            shared.mark_closed("keep-alive failed");
            break;
        }
        if ping {
            let seq = shared.next_sequence();
            shared.send_control(Frame::EnquireLink(EnquireLink::new(seq)));
        }
    }
}
