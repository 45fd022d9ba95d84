// ABOUTME: Framed SMPP I/O over any async byte stream, one PDU per read_frame/write_frame call
// ABOUTME: Splits into independent reader and writer halves for the session's background tasks

use crate::codec::{CodecError, Encodable, Frame, PduRegistry, RawHeader};
use bytes::BytesMut;
use std::io::{self, Cursor};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{
    AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter, ReadHalf, WriteHalf,
};

const READ_BUFFER_SIZE: usize = 4 * 1024;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("connection reset by peer")]
    ResetByPeer,

    /// The stream can no longer be framed, e.g. an impossible command_length
    #[error("framing error: {0}")]
    Framing(#[source] CodecError),

    /// A complete PDU was consumed but its contents are invalid. The stream
    /// is still in sync and reading can continue.
    #[error("cannot decode PDU {command_id:#010x} (seq {sequence_number}): {source}")]
    Decode {
        command_id: u32,
        sequence_number: u32,
        #[source]
        source: CodecError,
    },

    #[error("cannot encode PDU: {0}")]
    Encode(#[source] CodecError),
}

impl ConnectionError {
    /// True when the next `read_frame` can still succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ConnectionError::Decode { .. })
    }
}

/// Framed SMPP transport.
///
/// `Connection` reads into a buffer until a whole PDU is available, consumes
/// exactly `command_length` octets and decodes them. Writes go through a
/// `BufWriter` and are flushed once per frame. It does not track session
/// state; binding and sequencing belong to the session on top.
pub struct Connection<S> {
    stream: BufWriter<S>,
    buffer: BytesMut,
    registry: Arc<PduRegistry>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    pub fn new(socket: S) -> Connection<S> {
        Connection {
            stream: BufWriter::new(socket),
            buffer: BytesMut::with_capacity(READ_BUFFER_SIZE),
            registry: Arc::new(PduRegistry::new()),
        }
    }

    /// Read a single frame. `Ok(None)` means the peer closed the stream
    /// cleanly between frames.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, ConnectionError> {
        read_frame_from(&mut self.stream, &mut self.buffer, &self.registry).await
    }

    pub async fn write_frame(&mut self, frame: &Frame) -> Result<(), ConnectionError> {
        write_frame_to(&mut self.stream, frame).await
    }

    /// Split into halves usable from different tasks. Octets already read
    /// but not yet framed move to the reader.
    pub fn into_split(self) -> (FrameReader<S>, FrameWriter<S>) {
        let (reader, writer) = tokio::io::split(self.stream);
        (
            FrameReader {
                reader,
                buffer: self.buffer,
                registry: self.registry,
            },
            FrameWriter { writer },
        )
    }
}

/// Reading half of a split [`Connection`]
pub struct FrameReader<S> {
    reader: ReadHalf<BufWriter<S>>,
    buffer: BytesMut,
    registry: Arc<PduRegistry>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> FrameReader<S> {
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, ConnectionError> {
        read_frame_from(&mut self.reader, &mut self.buffer, &self.registry).await
    }
}

/// Writing half of a split [`Connection`]
#[derive(Debug)]
pub struct FrameWriter<S> {
    writer: WriteHalf<BufWriter<S>>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> FrameWriter<S> {
    pub async fn write_frame(&mut self, frame: &Frame) -> Result<(), ConnectionError> {
        write_frame_to(&mut self.writer, frame).await
    }

    /// Write a PDU that was encoded ahead of time
    pub async fn write_pdu(&mut self, pdu: &[u8]) -> Result<(), ConnectionError> {
        write_pdu_to(&mut self.writer, pdu).await
    }

    /// Flush and close the write side of the stream
    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.writer.shutdown().await
    }
}

async fn read_frame_from<R: AsyncRead + Unpin>(
    reader: &mut R,
    buffer: &mut BytesMut,
    registry: &PduRegistry,
) -> Result<Option<Frame>, ConnectionError> {
    loop {
        if let Some(frame) = parse_frame(buffer, registry)? {
            return Ok(Some(frame));
        }

        // 0 is end of stream. Clean only if no partial PDU is pending.
        if 0 == reader.read_buf(buffer).await? {
            return if buffer.is_empty() {
                Ok(None)
            } else {
                Err(ConnectionError::ResetByPeer)
            };
        }
    }
}

fn parse_frame(
    buffer: &mut BytesMut,
    registry: &PduRegistry,
) -> Result<Option<Frame>, ConnectionError> {
    let mut cursor = Cursor::new(&buffer[..]);
    let len = match Frame::check(&mut cursor) {
        Ok(len) => len,
        Err(CodecError::Incomplete) => return Ok(None),
        Err(e) => return Err(ConnectionError::Framing(e)),
    };

    // Consume the PDU before decoding so a bad body never desyncs the stream
    let pdu = buffer.split_to(len).freeze();

    Frame::parse(&pdu, registry).map(Some).map_err(|source| {
        let header = RawHeader::peek(&pdu);
        ConnectionError::Decode {
            command_id: header.map_or(0, |h| h.command_id),
            sequence_number: header.map_or(0, |h| h.sequence_number),
            source,
        }
    })
}

async fn write_frame_to<W: AsyncWrite + Unpin>(
    writer: &mut W,
    frame: &Frame,
) -> Result<(), ConnectionError> {
    let bytes = frame.to_bytes().map_err(ConnectionError::Encode)?;
    write_pdu_to(writer, &bytes).await
}

async fn write_pdu_to<W: AsyncWrite + Unpin>(
    writer: &mut W,
    pdu: &[u8],
) -> Result<(), ConnectionError> {
    writer.write_all(pdu).await?;
    writer.flush().await?;
    Ok(())
}
