use std::{
    net::{IpAddr, Ipv4Addr},
    time::{Duration, SystemTime},
};

use pnet::packet::ipv4::Ipv4Packet;
use pnet::util::MacAddr;
use tokio::time::Instant;

use crate::constants::{ICMPV4_ECHO_REPLY, ICMPV6_ECHO_REPLY, RECV_BUF_LEN};
use crate::echo::{unix_seconds, EchoPacket};
use crate::error::Result;
use crate::frame::ArpFrame;
use crate::socket::PacketChannel;

/// Recognises the reply a worker is waiting for among everything a raw socket delivers.
pub(crate) trait ReplyMatcher {
    type Reply;

    fn match_reply(
        &self,
        packet: &[u8],
        from: Option<IpAddr>,
        received_at: SystemTime,
    ) -> Option<Self::Reply>;
}

/// Matches the echo reply to one request; yields the round trip time in seconds.
#[derive(Copy, Clone, Debug)]
pub(crate) struct EchoMatcher {
    pub(crate) host: IpAddr,
    pub(crate) identifier: u16,
    pub(crate) sequence: u16,
}

impl ReplyMatcher for EchoMatcher {
    type Reply = f64;

    fn match_reply(
        &self,
        packet: &[u8],
        from: Option<IpAddr>,
        received_at: SystemTime,
    ) -> Option<f64> {
        // IPv4 raw sockets hand over the IP header, IPv6 ones do not
        let (message, reply_type) = match self.host {
            IpAddr::V4(_) => {
                let header_len = Ipv4Packet::new(packet)?.get_header_length() as usize * 4;
                (packet.get(header_len..)?, ICMPV4_ECHO_REPLY)
            }
            IpAddr::V6(_) => (packet, ICMPV6_ECHO_REPLY),
        };
        let reply = match EchoPacket::decode(message) {
            Ok(reply) => reply,
            Err(err) => {
                log::trace!("discarding packet from {:?}: {}", from, err);
                return None;
            }
        };
        if reply.message_type != reply_type
            || reply.identifier != self.identifier
            || reply.sequence != self.sequence
            || from != Some(self.host)
        {
            log::trace!(
                "discarding foreign ICMP message type {} id {} seq {} from {:?}",
                reply.message_type,
                reply.identifier,
                reply.sequence,
                from
            );
            return None;
        }
        let sent_at = reply.timestamp()?;
        Some(unix_seconds(received_at) - sent_at)
    }
}

/// Matches the ARP reply from `target_ip` addressed to `source_ip`; yields its hardware address.
#[derive(Copy, Clone, Debug)]
pub(crate) struct ArpMatcher {
    pub(crate) source_ip: Ipv4Addr,
    pub(crate) target_ip: Ipv4Addr,
}

impl ReplyMatcher for ArpMatcher {
    type Reply = MacAddr;

    fn match_reply(&self, packet: &[u8], _: Option<IpAddr>, _: SystemTime) -> Option<MacAddr> {
        match ArpFrame::decode(packet) {
            Ok(Some(frame)) if frame.answers(self.source_ip, self.target_ip) => {
                Some(frame.sender_mac)
            }
            Ok(_) => None,
            Err(err) => {
                log::trace!("discarding frame: {}", err);
                None
            }
        }
    }
}

/// Reads from `channel` until `matcher` accepts a packet or `timeout` is used up.
///
/// Every unrelated packet costs the time actually spent waiting for it; the budget is
/// never reset. `Ok(None)` means no reply arrived in time.
pub(crate) async fn wait_for_reply<C, M>(
    channel: &mut C,
    matcher: &M,
    timeout: Duration,
) -> Result<Option<M::Reply>>
where
    C: PacketChannel,
    M: ReplyMatcher,
{
    let mut buf = [0; RECV_BUF_LEN];
    let mut time_left = timeout;
    loop {
        let started = Instant::now();
        let received = tokio::time::timeout(time_left, channel.recv(&mut buf)).await;
        let waited = started.elapsed();
        let Ok(received) = received else {
            return Ok(None);
        };
        let (read_bytes, from) = received?;
        if let Some(reply) = matcher.match_reply(&buf[..read_bytes], from, SystemTime::now()) {
            return Ok(Some(reply));
        }
        time_left = time_left.saturating_sub(waited);
        if time_left.is_zero() {
            return Ok(None);
        }
    }
}
