use std::time::Duration;

pub(crate) const MAC_ADDR_LEN: u8 = 6;
pub(crate) const IP_V4_LEN: u8 = 4;
pub(crate) const ETH_HEADER_LEN: usize = 14;
pub(crate) const ARP_PACK_LEN: usize = 28;
pub(crate) const ETH_PACK_LEN: usize = ETH_HEADER_LEN + ARP_PACK_LEN;

pub(crate) const ICMP_HEADER_LEN: usize = 8;
pub(crate) const ICMPV4_ECHO_REQUEST: u8 = 8;
pub(crate) const ICMPV4_ECHO_REPLY: u8 = 0;
pub(crate) const ICMPV6_ECHO_REQUEST: u8 = 128;
pub(crate) const ICMPV6_ECHO_REPLY: u8 = 129;
pub(crate) const TIMESTAMP_LEN: usize = 8;
pub(crate) const PAYLOAD_FILLER: u8 = b'Q';

pub(crate) const ICMPV4_PROTOCOL: u8 = 1;
pub(crate) const ICMPV6_PROTOCOL: u8 = 58;
pub(crate) const TCP_PROTOCOL: u8 = 6;

pub(crate) const RECV_BUF_LEN: usize = 1024;

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub(crate) const DEFAULT_COUNT: usize = 10;
pub(crate) const DEFAULT_PACKET_SIZE: usize = 64;
pub(crate) const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
