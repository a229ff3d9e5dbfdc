use std::time::Duration;

use crate::constants::{DEFAULT_COUNT, DEFAULT_INTERVAL, DEFAULT_PACKET_SIZE, DEFAULT_TIMEOUT};
use crate::error::InputBuildError;

/// Parameters shared by every host of an ICMP probe run.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct RunParameters {
    /// How long to wait for the reply to a single request.
    pub timeout: Duration,
    /// Number of request/reply rounds per host.
    pub count: usize,
    /// Size of each echo request, ICMP header included.
    pub packet_size: usize,
    /// Minimum time between the start of two rounds.
    pub interval: Duration,
    /// Time after which no further rounds are started, regardless of `count`.
    pub deadline: Option<Duration>,
}

impl Default for RunParameters {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            count: DEFAULT_COUNT,
            packet_size: DEFAULT_PACKET_SIZE,
            interval: DEFAULT_INTERVAL,
            deadline: None,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct RunParametersBuilder {
    timeout: Option<Duration>,
    count: Option<usize>,
    packet_size: Option<usize>,
    interval: Option<Duration>,
    deadline: Option<Duration>,
}

impl RunParametersBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_packet_size(mut self, packet_size: usize) -> Self {
        self.packet_size = Some(packet_size);
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn build(&self) -> Result<RunParameters, InputBuildError> {
        let defaults = RunParameters::default();
        let params = RunParameters {
            timeout: self.timeout.unwrap_or(defaults.timeout),
            count: self.count.unwrap_or(defaults.count),
            packet_size: self.packet_size.unwrap_or(defaults.packet_size),
            interval: self.interval.unwrap_or(defaults.interval),
            deadline: self.deadline,
        };
        if params.count == 0 {
            return Err(InputBuildError::ZeroCount);
        }
        if params.timeout.is_zero() {
            return Err(InputBuildError::ZeroTimeout);
        }
        Ok(params)
    }
}

/// Settings of an ARP request run.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ArpConfig {
    pub interface_name: String,
    /// Host (name or IPv4 address) the requests are sent on behalf of.
    pub source: String,
    pub timeout: Duration,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ArpConfigBuilder {
    interface_name: String,
    source: Option<String>,
    timeout: Option<Duration>,
}

impl ArpConfigBuilder {
    pub fn new(interface_name: &str) -> Self {
        Self {
            interface_name: interface_name.into(),
            source: None,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<ArpConfig, InputBuildError> {
        if self.interface_name.is_empty() {
            return Err(InputBuildError::MissingInterface);
        }
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(InputBuildError::ZeroTimeout);
        }
        Ok(ArpConfig {
            interface_name: self.interface_name,
            source: self.source.ok_or(InputBuildError::MissingSource)?,
            timeout,
        })
    }
}
