// ABOUTME: Bind credentials for a transceiver session
// ABOUTME: Turns system_id/password/system_type into the bind_transceiver PDU

use crate::datatypes::{BindTransceiver, InterfaceVersion};

/// SMPP bind operation credentials
#[derive(Debug, Clone, PartialEq)]
pub struct BindCredentials {
    /// System identifier for authentication
    pub system_id: String,
    /// Password for authentication
    pub password: String,
    /// System type (optional, defaults to empty string)
    pub system_type: Option<String>,
    /// SMPP interface version to use
    pub interface_version: InterfaceVersion,
}

impl BindCredentials {
    /// Credentials for a transceiver session (SMPP v3.4)
    pub fn transceiver(system_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            system_id: system_id.into(),
            password: password.into(),
            system_type: None,
            interface_version: InterfaceVersion::SmppV34,
        }
    }

    pub fn with_system_type(mut self, system_type: impl Into<String>) -> Self {
        let system_type = system_type.into();
        self.system_type = (!system_type.is_empty()).then_some(system_type);
        self
    }

    pub fn bind_pdu(&self, sequence_number: u32) -> BindTransceiver {
        BindTransceiver::builder()
            .sequence_number(sequence_number)
            .system_id(&self.system_id)
            .password(&self.password)
            .system_type(self.system_type.as_deref().unwrap_or(""))
            .interface_version(self.interface_version)
            .build()
    }
}
