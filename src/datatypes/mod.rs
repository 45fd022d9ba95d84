mod address;
mod bind_transceiver;
mod command_id;
mod command_status;
mod data_sm;
pub mod datetime;
mod deliver_sm;
mod enquire_link;
mod esm_class;
mod generic_nack;
mod interface_version;
mod message;
mod numeric_plan_indicator;
mod submit_sm;
pub mod tlv;
mod type_of_number;
mod unbind;

pub use address::{Address, AddressError, MAX_ADDRESS_LEN};
pub use bind_transceiver::{BindTransceiver, BindTransceiverBuilder, BindTransceiverResponse};
pub use command_id::CommandId;
pub use command_status::CommandStatus;
pub use data_sm::{DataSm, DataSmResponse};
pub use datetime::{DateTimeError, validity_period, validity_period_at};
pub use deliver_sm::{DeliverSm, DeliverSmResponse};
pub use enquire_link::{EnquireLink, EnquireLinkResponse};
pub use esm_class::EsmClass;
pub use generic_nack::GenericNack;
pub use interface_version::InterfaceVersion;
pub use message::{MAX_SHORT_MESSAGE_LEN, MessageBody};
pub use numeric_plan_indicator::NumericPlanIndicator;
pub use submit_sm::{SubmitSm, SubmitSmResponse};
pub use tlv::Tlv;
pub use type_of_number::TypeOfNumber;
pub use unbind::{Unbind, UnbindResponse};
