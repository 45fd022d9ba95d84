// ABOUTME: Run configuration for the load test: what to send, how fast, and where to connect
// ABOUTME: Builders carry the CLI defaults and validate once so the scheduler can trust its inputs

use crate::client::{BindCredentials, KeepAliveConfig};
use crate::datatypes::{Address, AddressError, NumericPlanIndicator, TypeOfNumber};
use crate::encoding::Encoding;
use crate::macros::builder_setters;
use std::time::Duration;
use thiserror::Error;

/// Highest accepted submission rate; the tick period must stay above zero
pub const MAX_RATE: i64 = 1_000_000;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("rate must be between 1 and {MAX_RATE} messages per second, got {0}")]
    InvalidRate(i64),

    #[error("destination address is empty")]
    EmptyDestination,

    #[error("invalid {field} address: {source}")]
    Address {
        field: &'static str,
        #[source]
        source: AddressError,
    },
}

/// What the scheduler sends. Built once through [`SendConfigBuilder`] and
/// never mutated during a run.
#[derive(Debug, Clone)]
pub struct SendConfig {
    pub rate: i64,
    pub source: String,
    pub source_ton: TypeOfNumber,
    pub source_npi: NumericPlanIndicator,
    pub destination: String,
    pub dest_ton: TypeOfNumber,
    pub dest_npi: NumericPlanIndicator,
    pub text: String,
    pub encoding: Encoding,
    pub ttl_secs: u32,
    pub multi_segment: bool,
    /// Zero or negative means no limit
    pub max_count: i64,
    pub drain: Duration,
    pub registered_delivery: u8,
    pub service_type: String,
}

impl SendConfig {
    pub fn builder() -> SendConfigBuilder {
        SendConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate <= 0 || self.rate > MAX_RATE {
            return Err(ConfigError::InvalidRate(self.rate));
        }
        if self.destination.is_empty() {
            return Err(ConfigError::EmptyDestination);
        }
        self.source_address()?;
        self.destination_address()?;
        Ok(())
    }

    /// Time between ticks. Only meaningful on a validated config.
    pub fn period(&self) -> Duration {
        let rate = self.rate.clamp(1, MAX_RATE) as u64;
        Duration::from_nanos(1_000_000_000 / rate)
    }

    pub fn max_count(&self) -> Option<u64> {
        (self.max_count > 0).then_some(self.max_count as u64)
    }

    pub fn source_address(&self) -> Result<Address, ConfigError> {
        Address::new(self.source_ton, self.source_npi, self.source.as_str()).map_err(|source| {
            ConfigError::Address {
                field: "source",
                source,
            }
        })
    }

    pub fn destination_address(&self) -> Result<Address, ConfigError> {
        Address::new(self.dest_ton, self.dest_npi, self.destination.as_str()).map_err(|source| {
            ConfigError::Address {
                field: "destination",
                source,
            }
        })
    }
}

#[derive(Debug, Clone)]
pub struct SendConfigBuilder {
    rate: i64,
    source: String,
    source_ton: TypeOfNumber,
    source_npi: NumericPlanIndicator,
    destination: String,
    dest_ton: TypeOfNumber,
    dest_npi: NumericPlanIndicator,
    text: String,
    encoding: Encoding,
    ttl_secs: u32,
    multi_segment: bool,
    max_count: i64,
    drain: Duration,
    registered_delivery: u8,
    service_type: String,
}

impl Default for SendConfigBuilder {
    fn default() -> Self {
        Self {
            rate: 50,
            source: "test".to_string(),
            source_ton: TypeOfNumber::Unknown,
            source_npi: NumericPlanIndicator::Unknown,
            destination: "test".to_string(),
            dest_ton: TypeOfNumber::Unknown,
            dest_npi: NumericPlanIndicator::Unknown,
            text: "load-test".to_string(),
            encoding: Encoding::Ucs2,
            ttl_secs: 60,
            multi_segment: false,
            max_count: -1,
            drain: Duration::from_secs(10),
            registered_delivery: 1,
            service_type: String::new(),
        }
    }
}

impl SendConfigBuilder {
    builder_setters!(
        rate: i64,
        encoding: Encoding,
        ttl_secs: u32,
        multi_segment: bool,
        max_count: i64,
        drain: Duration,
        registered_delivery: u8,
    );

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn service_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = service_type.into();
        self
    }

    pub fn source_numbering(mut self, ton: TypeOfNumber, npi: NumericPlanIndicator) -> Self {
        self.source_ton = ton;
        self.source_npi = npi;
        self
    }

    pub fn dest_numbering(mut self, ton: TypeOfNumber, npi: NumericPlanIndicator) -> Self {
        self.dest_ton = ton;
        self.dest_npi = npi;
        self
    }

    pub fn build(self) -> Result<SendConfig, ConfigError> {
        let config = SendConfig {
            rate: self.rate,
            source: self.source,
            source_ton: self.source_ton,
            source_npi: self.source_npi,
            destination: self.destination,
            dest_ton: self.dest_ton,
            dest_npi: self.dest_npi,
            text: self.text,
            encoding: self.encoding,
            ttl_secs: self.ttl_secs,
            multi_segment: self.multi_segment,
            max_count: self.max_count,
            drain: self.drain,
            registered_delivery: self.registered_delivery,
            service_type: self.service_type,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Where and how to bind, plus transport timing.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    pub system_id: String,
    pub password: String,
    pub system_type: String,
    /// Covers both the TCP connect and the bind response
    pub bind_timeout: Duration,
    /// Longest silence tolerated from the SMSC before the session is dropped
    pub read_timeout: Duration,
    pub keep_alive: KeepAliveConfig,
    /// Submissions buffered ahead of the socket before `submit` waits
    pub queue_depth: usize,
}

impl SessionConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        system_id: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            system_id: system_id.into(),
            password: password.into(),
            system_type: String::new(),
            bind_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(10),
            keep_alive: KeepAliveConfig::new(Duration::from_secs(5)),
            queue_depth: 64,
        }
    }

    builder_setters!(
        bind_timeout: Duration,
        read_timeout: Duration,
        keep_alive: KeepAliveConfig,
        queue_depth: usize,
    );

    pub fn system_type(mut self, system_type: impl Into<String>) -> Self {
        self.system_type = system_type.into();
        self
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn credentials(&self) -> BindCredentials {
        BindCredentials::transceiver(self.system_id.as_str(), self.password.as_str())
            .with_system_type(self.system_type.as_str())
    }
}
