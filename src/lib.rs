//! Concurrent host probing over raw sockets: ICMP echo ("ping") with round trip
//! statistics, ARP requests for hardware addresses, and TCP port checks.
//!
//! Every host is probed in its own task on its own socket; results come back as one
//! map keyed by the hosts as given, holding either the probe outcome or the error that
//! prevented it (for example an unresolvable name or missing raw socket privileges).
//!
//! ## Example
//! Following example pings the hosts given on the command line and prints their statistics.
//! ```no_run
#![doc = include_str!("../demos/ping.rs")]
//! ```
//! ARP requests work in a similar fashion through [`client::Client::arp`], see `demos/arp-scan.rs`.

pub mod client;
pub mod echo;
pub mod error;
pub mod frame;
pub mod params;
pub mod ports;
pub mod probe;
pub mod resolver;

pub(crate) mod constants;
pub(crate) mod dispatch;
pub(crate) mod request;
pub(crate) mod response;
pub(crate) mod socket;

pub use client::Client;
pub use echo::{checksum, EchoPacket};
pub use error::{Error, InputBuildError, Result};
pub use frame::ArpFrame;
pub use params::{ArpConfig, ArpConfigBuilder, RunParameters, RunParametersBuilder};
pub use ports::PortReport;
pub use probe::ProbeResult;
pub use resolver::{AddressDescriptor, AddressFamily, Resolver, SocketKind, SystemResolver};
