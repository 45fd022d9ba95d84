// ABOUTME: Classifies every inbound PDU and decides the protocol reply and whether to end the session
// ABOUTME: Runs on the session's reader task, so it never blocks and keeps only atomic counters

use crate::codec::Frame;
use crate::datatypes::{
    CommandStatus, DataSm, DataSmResponse, DeliverSm, DeliverSmResponse, EnquireLink,
    EnquireLinkResponse, EsmClass, GenericNack, SubmitSmResponse, Unbind, UnbindResponse,
    tlv::tags,
};
use crate::encoding::Encoding;
use crate::receipt::DeliveryReceipt;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// A received PDU sorted by what the load test cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Unbind(Unbind),
    UnbindResponse(UnbindResponse),
    SubmitResponse(SubmitSmResponse),
    GenericNack(GenericNack),
    LinkCheck(EnquireLink),
    LinkCheckResponse(EnquireLinkResponse),
    DataMessage(Box<DataSm>),
    /// Any deliver_sm. `receipt` is set when the text has the receipt layout.
    DeliveryReceipt {
        pdu: Box<DeliverSm>,
        text: String,
        receipt: Option<DeliveryReceipt>,
    },
    /// Unknown command ids and PDUs a transceiver never expects to receive
    Unknown(Frame),
}

impl InboundEvent {
    pub fn classify(frame: Frame) -> Self {
        match frame {
            Frame::Unbind(pdu) => InboundEvent::Unbind(pdu),
            Frame::UnbindResp(pdu) => InboundEvent::UnbindResponse(pdu),
            Frame::SubmitSmResp(pdu) => InboundEvent::SubmitResponse(pdu),
            Frame::GenericNack(pdu) => InboundEvent::GenericNack(pdu),
            Frame::EnquireLink(pdu) => InboundEvent::LinkCheck(pdu),
            Frame::EnquireLinkResp(pdu) => InboundEvent::LinkCheckResponse(pdu),
            Frame::DataSm(pdu) => InboundEvent::DataMessage(pdu),
            Frame::DeliverSm(pdu) => {
                let text = decode_text(
                    pdu.body.data_coding,
                    pdu.body.esm_class,
                    pdu.body.payload(),
                );
                let receipt = DeliveryReceipt::parse(&text).map(|mut receipt| {
                    if let Some(id) = pdu
                        .body
                        .tlv(tags::RECEIPTED_MESSAGE_ID)
                        .and_then(|tlv| tlv.as_cstring())
                    {
                        receipt.id = id;
                    }
                    receipt
                });
                InboundEvent::DeliveryReceipt { pdu, text, receipt }
            }
            other => InboundEvent::Unknown(other),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            InboundEvent::Unbind(_) => "unbind",
            InboundEvent::UnbindResponse(_) => "unbind_resp",
            InboundEvent::SubmitResponse(_) => "submit_sm_resp",
            InboundEvent::GenericNack(_) => "generic_nack",
            InboundEvent::LinkCheck(_) => "enquire_link",
            InboundEvent::LinkCheckResponse(_) => "enquire_link_resp",
            InboundEvent::DataMessage(_) => "data_sm",
            InboundEvent::DeliveryReceipt { .. } => "deliver_sm",
            InboundEvent::Unknown(_) => "unknown",
        }
    }
}

/// Text of inbound user data, skipping the UDH when esm_class flags one.
/// Unknown data codings are read as Latin-1.
pub fn decode_text(data_coding: u8, esm_class: EsmClass, payload: &[u8]) -> String {
    let encoding = Encoding::from_data_coding(data_coding).unwrap_or(Encoding::Latin1);
    let user_data = match payload.first() {
        Some(&udh_len) if esm_class.has_udhi() => {
            payload.get(usize::from(udh_len) + 1..).unwrap_or_default()
        }
        _ => payload,
    };
    encoding.decode(user_data)
}

/// What the session should do after an inbound PDU.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reply {
    pub response: Option<Frame>,
    pub terminate: bool,
}

impl Reply {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn respond(frame: Frame) -> Self {
        Self {
            response: Some(frame),
            terminate: false,
        }
    }
}

/// Invoked by the transport for every inbound PDU.
pub trait PduHandler: Send + Sync {
    fn handle(&self, event: &InboundEvent) -> Reply;
}

pub type Observer = Box<dyn Fn(&InboundEvent) + Send + Sync>;

#[derive(Debug, Default)]
struct InboundStats {
    unbind: AtomicU64,
    unbind_resp: AtomicU64,
    submit_resp: AtomicU64,
    submit_resp_failed: AtomicU64,
    generic_nack: AtomicU64,
    enquire_link: AtomicU64,
    enquire_link_resp: AtomicU64,
    data_sm: AtomicU64,
    deliver_sm: AtomicU64,
    receipts: AtomicU64,
    unknown: AtomicU64,
}

/// Snapshot of the dispatcher's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InboundCounts {
    pub unbind: u64,
    pub unbind_resp: u64,
    pub submit_resp: u64,
    pub submit_resp_failed: u64,
    pub generic_nack: u64,
    pub enquire_link: u64,
    pub enquire_link_resp: u64,
    pub data_sm: u64,
    pub deliver_sm: u64,
    pub receipts: u64,
    pub unknown: u64,
}

impl fmt::Display for InboundCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "submit_sm_resp={} (failed {}), deliver_sm={} (receipts {}), data_sm={}, \
             generic_nack={}, enquire_link={}/{}, unbind={}/{}, unknown={}",
            self.submit_resp,
            self.submit_resp_failed,
            self.deliver_sm,
            self.receipts,
            self.data_sm,
            self.generic_nack,
            self.enquire_link,
            self.enquire_link_resp,
            self.unbind,
            self.unbind_resp,
            self.unknown,
        )
    }
}

/// The load test's [`PduHandler`]: logs each event, counts it, and answers
/// the requests that need an answer.
#[derive(Default)]
pub struct Dispatcher {
    observer: Option<Observer>,
    stats: InboundStats,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with every event before the reply is decided
    pub fn with_observer(mut self, observer: impl Fn(&InboundEvent) + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn counts(&self) -> InboundCounts {
        let s = &self.stats;
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        InboundCounts {
            unbind: load(&s.unbind),
            unbind_resp: load(&s.unbind_resp),
            submit_resp: load(&s.submit_resp),
            submit_resp_failed: load(&s.submit_resp_failed),
            generic_nack: load(&s.generic_nack),
            enquire_link: load(&s.enquire_link),
            enquire_link_resp: load(&s.enquire_link_resp),
            data_sm: load(&s.data_sm),
            deliver_sm: load(&s.deliver_sm),
            receipts: load(&s.receipts),
            unknown: load(&s.unknown),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn observe(&self, event: &InboundEvent) {
        let s = &self.stats;
        match event {
            InboundEvent::Unbind(pdu) => {
                Self::bump(&s.unbind);
                info!(seq = pdu.sequence_number, "unbind received");
            }
            InboundEvent::UnbindResponse(pdu) => {
                Self::bump(&s.unbind_resp);
                debug!(seq = pdu.sequence_number, "unbind_resp received");
            }
            InboundEvent::SubmitResponse(pdu) => {
                Self::bump(&s.submit_resp);
                if pdu.command_status == CommandStatus::Ok {
                    debug!(
                        seq = pdu.sequence_number,
                        message_id = %pdu.message_id,
                        "submit_sm_resp received"
                    );
                } else {
                    Self::bump(&s.submit_resp_failed);
                    warn!(
                        seq = pdu.sequence_number,
                        status = ?pdu.command_status,
                        "submit_sm rejected"
                    );
                }
            }
            InboundEvent::GenericNack(pdu) => {
                Self::bump(&s.generic_nack);
                warn!(
                    seq = pdu.sequence_number,
                    status = ?pdu.command_status,
                    "generic_nack received"
                );
            }
            InboundEvent::LinkCheck(pdu) => {
                Self::bump(&s.enquire_link);
                debug!(seq = pdu.sequence_number, "enquire_link received");
            }
            InboundEvent::LinkCheckResponse(pdu) => {
                Self::bump(&s.enquire_link_resp);
                debug!(seq = pdu.sequence_number, "enquire_link_resp received");
            }
            InboundEvent::DataMessage(pdu) => {
                Self::bump(&s.data_sm);
                info!(
                    seq = pdu.sequence_number,
                    from = %pdu.source,
                    bytes = pdu.message_payload().map_or(0, |p| p.len()),
                    "data_sm received"
                );
            }
            InboundEvent::DeliveryReceipt { pdu, text, receipt } => {
                Self::bump(&s.deliver_sm);
                match receipt {
                    Some(receipt) => {
                        Self::bump(&s.receipts);
                        info!(
                            seq = pdu.sequence_number,
                            id = %receipt.id,
                            stat = %receipt.stat,
                            err = receipt.err.as_deref().unwrap_or(""),
                            "delivery receipt received"
                        );
                    }
                    None => info!(
                        seq = pdu.sequence_number,
                        from = %pdu.body.source,
                        text = %text,
                        "deliver_sm received"
                    ),
                }
            }
            InboundEvent::Unknown(frame) => {
                Self::bump(&s.unknown);
                warn!(
                    command_id = format_args!("{:#010x}", frame.command_id()),
                    seq = frame.sequence_number(),
                    "ignoring unexpected PDU {}",
                    frame.name()
                );
            }
        }
    }
}

impl PduHandler for Dispatcher {
    fn handle(&self, event: &InboundEvent) -> Reply {
        if let Some(observer) = &self.observer {
            observer(event);
        }
        self.observe(event);

        match event {
            InboundEvent::Unbind(pdu) => Reply {
                response: Some(Frame::UnbindResp(UnbindResponse::new(pdu.sequence_number))),
                terminate: true,
            },
            InboundEvent::LinkCheck(pdu) => Reply::respond(Frame::EnquireLinkResp(
                EnquireLinkResponse::new(pdu.sequence_number),
            )),
            InboundEvent::DataMessage(pdu) => {
                Reply::respond(Frame::DataSmResp(DataSmResponse::new(pdu.sequence_number)))
            }
            InboundEvent::DeliveryReceipt { pdu, .. } => Reply::respond(Frame::DeliverSmResp(
                DeliverSmResponse::new(pdu.sequence_number),
            )),
            InboundEvent::UnbindResponse(_)
            | InboundEvent::SubmitResponse(_)
            | InboundEvent::GenericNack(_)
            | InboundEvent::LinkCheckResponse(_)
            | InboundEvent::Unknown(_) => Reply::none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{Address, MessageBody, Tlv};
    use bytes::Bytes;
    use std::sync::Arc;
    use std::sync::Mutex;

    fn deliver(esm_class: EsmClass, data_coding: u8, payload: &[u8]) -> Frame {
        let mut body = MessageBody {
            source: Address::unknown("447700900123").unwrap(),
            destination: Address::unknown("test").unwrap(),
            esm_class,
            data_coding,
            ..Default::default()
        };
        body.set_payload(Bytes::copy_from_slice(payload));
        Frame::DeliverSm(Box::new(DeliverSm {
            command_status: CommandStatus::Ok,
            sequence_number: 17,
            body,
        }))
    }

    fn handle(frame: Frame) -> Reply {
        Dispatcher::new().handle(&InboundEvent::classify(frame))
    }

    #[test]
    fn unbind_is_answered_and_terminates() {
        let reply = handle(Frame::Unbind(Unbind::new(9)));
        assert_eq!(reply.response, Some(Frame::UnbindResp(UnbindResponse::new(9))));
        assert!(reply.terminate);
    }

    #[test]
    fn submit_response_needs_no_reply() {
        let reply = handle(Frame::SubmitSmResp(SubmitSmResponse::new(3, "abc")));
        assert_eq!(reply, Reply { response: None, terminate: false });

        let reply = handle(Frame::SubmitSmResp(SubmitSmResponse::error(
            4,
            CommandStatus::ThrottlingError,
        )));
        assert_eq!(reply, Reply::none());
    }

    #[test]
    fn requests_get_matching_responses() {
        let reply = handle(Frame::EnquireLink(EnquireLink::new(5)));
        assert_eq!(reply.response, Some(Frame::EnquireLinkResp(EnquireLinkResponse::new(5))));
        assert!(!reply.terminate);

        let data_sm = DataSm::new(
            6,
            Address::unknown("1").unwrap(),
            Address::unknown("2").unwrap(),
            0x03,
        )
        .with_message_payload(&b"hi"[..]);
        let reply = handle(Frame::DataSm(Box::new(data_sm)));
        assert_eq!(reply.response, Some(Frame::DataSmResp(DataSmResponse::new(6))));
        assert!(!reply.terminate);

        let reply = handle(deliver(EsmClass::from_byte(0x04), 0x00, b"id:1 stat:DELIVRD"));
        assert_eq!(reply.response, Some(Frame::DeliverSmResp(DeliverSmResponse::new(17))));
        assert!(!reply.terminate);
    }

    #[test]
    fn passive_kinds_need_no_reply() {
        let frames = [
            Frame::UnbindResp(UnbindResponse::new(1)),
            Frame::GenericNack(GenericNack::system_error(2)),
            Frame::EnquireLinkResp(EnquireLinkResponse::new(3)),
            Frame::Unknown {
                command_id: 0x0000_0103,
                command_status: CommandStatus::Ok,
                sequence_number: 4,
                body: Bytes::new(),
            },
            Frame::DeliverSmResp(DeliverSmResponse::new(5)),
        ];
        for frame in frames {
            assert_eq!(handle(frame), Reply::none());
        }
    }

    #[test]
    fn classification() {
        assert!(matches!(
            InboundEvent::classify(Frame::EnquireLink(EnquireLink::new(1))),
            InboundEvent::LinkCheck(_)
        ));
        assert!(matches!(
            InboundEvent::classify(Frame::DeliverSmResp(DeliverSmResponse::new(1))),
            InboundEvent::Unknown(Frame::DeliverSmResp(_))
        ));
    }

    #[test]
    fn receipt_fields_are_parsed() {
        let frame = deliver(
            EsmClass::from_byte(0x04),
            0x00,
            b"id:77 sub:001 dlvrd:001 submit date:2501021530 done date:2501021531 stat:DELIVRD err:000 text:load-test",
        );
        match InboundEvent::classify(frame) {
            InboundEvent::DeliveryReceipt { receipt: Some(receipt), .. } => {
                assert_eq!(receipt.id, "77");
                assert!(receipt.is_delivered());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn receipted_message_id_tlv_wins() {
        let mut frame = deliver(EsmClass::from_byte(0x04), 0x00, b"id:1 stat:DELIVRD");
        if let Frame::DeliverSm(pdu) = &mut frame {
            pdu.body
                .tlvs
                .push(Tlv::new(tags::RECEIPTED_MESSAGE_ID, &b"ABC-123\0"[..]));
        }
        match InboundEvent::classify(frame) {
            InboundEvent::DeliveryReceipt { receipt: Some(receipt), .. } => {
                assert_eq!(receipt.id, "ABC-123");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn mobile_originated_text_is_decoded() {
        let payload = Encoding::Ucs2.encode("Привет").unwrap();
        match InboundEvent::classify(deliver(EsmClass::none(), 0x08, &payload)) {
            InboundEvent::DeliveryReceipt { text, receipt, .. } => {
                assert_eq!(text, "Привет");
                assert_eq!(receipt, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn udh_is_skipped() {
        let mut payload = vec![0x05, 0x00, 0x03, 0x01, 0x02, 0x01];
        payload.extend_from_slice(b"part one");
        assert_eq!(decode_text(0x03, EsmClass::none().with_udhi(), &payload), "part one");
        assert_eq!(decode_text(0x03, EsmClass::none().with_udhi(), &[0x09]), "");
    }

    #[test]
    fn observer_sees_every_event_and_counts_accumulate() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let dispatcher = Dispatcher::new().with_observer(move |event| {
            sink.lock().unwrap().push(event.name());
        });

        let frames = [
            Frame::SubmitSmResp(SubmitSmResponse::new(1, "a")),
            Frame::SubmitSmResp(SubmitSmResponse::error(2, CommandStatus::SubmitFailed)),
            deliver(EsmClass::from_byte(0x04), 0x00, b"id:1 stat:DELIVRD"),
            deliver(EsmClass::none(), 0x00, b"hello"),
            Frame::EnquireLink(EnquireLink::new(3)),
            Frame::Unbind(Unbind::new(4)),
        ];
        for frame in frames {
            dispatcher.handle(&InboundEvent::classify(frame));
        }

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "submit_sm_resp",
                "submit_sm_resp",
                "deliver_sm",
                "deliver_sm",
                "enquire_link",
                "unbind"
            ]
        );
        let counts = dispatcher.counts();
        assert_eq!(counts.submit_resp, 2);
        assert_eq!(counts.submit_resp_failed, 1);
        assert_eq!(counts.deliver_sm, 2);
        assert_eq!(counts.receipts, 1);
        assert_eq!(counts.enquire_link, 1);
        assert_eq!(counts.unbind, 1);
    }
}
