use std::{
    net::{IpAddr, Ipv4Addr},
    time::Duration,
};

use pnet::util::MacAddr;

use crate::error::Result;
use crate::frame::ArpFrame;
use crate::resolver::AddressDescriptor;
use crate::response::{wait_for_reply, ArpMatcher};
use crate::socket::{LinkSocket, PacketChannel};

/// Who is asking: the interface the request leaves from and the addresses it claims.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub(crate) struct ArpSender {
    pub(crate) interface_name: String,
    pub(crate) mac: MacAddr,
    pub(crate) ip: Ipv4Addr,
}

/// Sends one broadcast ARP request for `target` and waits once for the answer.
///
/// Targets that are not IPv4 cannot be asked for and yield `Ok(None)`.
pub(crate) async fn arp_worker(
    target: AddressDescriptor,
    sender: ArpSender,
    timeout: Duration,
) -> Result<Option<MacAddr>> {
    let IpAddr::V4(target_ip) = target.ip() else {
        log::debug!("{} is not an IPv4 address, skipping ARP request", target.ip());
        return Ok(None);
    };
    let mut socket = LinkSocket::open(&sender.interface_name)?;
    request_mac(&mut socket, &sender, target_ip, timeout).await
}

pub(crate) async fn request_mac<C: PacketChannel>(
    channel: &mut C,
    sender: &ArpSender,
    target_ip: Ipv4Addr,
    timeout: Duration,
) -> Result<Option<MacAddr>> {
    let request = ArpFrame::request(sender.mac, sender.ip, target_ip);
    channel.send(&request.encode()).await?;
    let matcher = ArpMatcher {
        source_ip: sender.ip,
        target_ip,
    };
    let mac = wait_for_reply(channel, &matcher, timeout).await?;
    match mac {
        Some(mac) => log::debug!("{} is at {}", target_ip, mac),
        None => log::debug!("no ARP reply from {}", target_ip),
    }
    Ok(mac)
}

#[cfg(test)]
mod tests {
    use std::net::Ipv6Addr;

    use pnet::packet::arp::ArpOperations;

    use super::*;
    use crate::socket::testing::{FakeChannel, Inbound};

    const PEER_MAC: MacAddr = MacAddr(0x02, 0x00, 0x00, 0x00, 0x00, 0x01);
    const TARGET_IP: Ipv4Addr = Ipv4Addr::new(10, 1, 1, 1);

    fn sender() -> ArpSender {
        ArpSender {
            interface_name: "dummy0".into(),
            mac: MacAddr(0x00, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e),
            ip: Ipv4Addr::new(10, 1, 1, 100),
        }
    }

    fn reply_from(sender_ip: Ipv4Addr, to: Ipv4Addr) -> Vec<u8> {
        let mut frame = ArpFrame::request(PEER_MAC, sender_ip, to);
        frame.operation = ArpOperations::Reply;
        frame.encode().to_vec()
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_is_broadcast_and_answered() {
        let own_ip = sender().ip;
        let mut channel = FakeChannel::responding(move |request| {
            let request = ArpFrame::decode(request).unwrap();
            // requests are not decoded as replies
            assert!(request.is_none());
            vec![
                Inbound::new(Duration::from_millis(5), vec![0; 60], None),
                Inbound::new(
                    Duration::from_millis(5),
                    reply_from(Ipv4Addr::new(10, 1, 1, 9), own_ip),
                    None,
                ),
                Inbound::new(Duration::from_millis(5), reply_from(TARGET_IP, own_ip), None),
            ]
        });
        let mac = request_mac(&mut channel, &sender(), TARGET_IP, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(mac, Some(PEER_MAC));
        assert_eq!(channel.sent.len(), 1);
        assert_eq!(&channel.sent[0][..6], &[0xff; 6]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_target_yields_none() {
        let mut channel = FakeChannel::new(vec![]);
        let mac = request_mac(&mut channel, &sender(), TARGET_IP, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(mac, None);
    }

    #[tokio::test]
    async fn test_ipv6_target_is_skipped() {
        let target = AddressDescriptor::raw(IpAddr::V6(Ipv6Addr::LOCALHOST));
        let mac = arp_worker(target, sender(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(mac, None);
    }
}
