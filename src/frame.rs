use std::net::Ipv4Addr;

use pnet::{
    packet::{
        arp::{ArpHardwareTypes, ArpOperation, ArpOperations, ArpPacket, MutableArpPacket},
        ethernet::{EtherTypes, EthernetPacket, MutableEthernetPacket},
        Packet,
    },
    util::MacAddr,
};

use crate::constants::{ARP_PACK_LEN, ETH_PACK_LEN, IP_V4_LEN, MAC_ADDR_LEN};
use crate::error::{Error, Result};

/// An Ethernet frame carrying an IPv4-over-Ethernet ARP message.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ArpFrame {
    pub destination_mac: MacAddr,
    pub source_mac: MacAddr,
    pub operation: ArpOperation,
    pub sender_mac: MacAddr,
    pub sender_ip: Ipv4Addr,
    pub target_mac: MacAddr,
    pub target_ip: Ipv4Addr,
}

impl ArpFrame {
    /// Broadcast request asking who owns `target_ip`.
    pub fn request(source_mac: MacAddr, source_ip: Ipv4Addr, target_ip: Ipv4Addr) -> Self {
        Self {
            destination_mac: MacAddr::broadcast(),
            source_mac,
            operation: ArpOperations::Request,
            sender_mac: source_mac,
            sender_ip: source_ip,
            target_mac: MacAddr::zero(),
            target_ip,
        }
    }

    /// Whether this frame answers a request sent from `source_ip` about `target_ip`.
    pub fn answers(&self, source_ip: Ipv4Addr, target_ip: Ipv4Addr) -> bool {
        self.operation == ArpOperations::Reply
            && self.sender_ip == target_ip
            && self.target_ip == source_ip
    }

    pub fn encode(&self) -> [u8; ETH_PACK_LEN] {
        let mut eth_buf = [0; ETH_PACK_LEN];
        let mut eth_packet = MutableEthernetPacket::new(&mut eth_buf).unwrap();
        eth_packet.set_destination(self.destination_mac);
        eth_packet.set_source(self.source_mac);
        eth_packet.set_ethertype(EtherTypes::Arp);

        let mut arp_buf = [0; ARP_PACK_LEN];
        let mut arp_packet = MutableArpPacket::new(&mut arp_buf).unwrap();
        arp_packet.set_hardware_type(ArpHardwareTypes::Ethernet);
        arp_packet.set_protocol_type(EtherTypes::Ipv4);
        arp_packet.set_hw_addr_len(MAC_ADDR_LEN);
        arp_packet.set_proto_addr_len(IP_V4_LEN);
        arp_packet.set_operation(self.operation);
        arp_packet.set_sender_hw_addr(self.sender_mac);
        arp_packet.set_sender_proto_addr(self.sender_ip);
        arp_packet.set_target_hw_addr(self.target_mac);
        arp_packet.set_target_proto_addr(self.target_ip);

        eth_packet.set_payload(arp_packet.packet());
        eth_buf
    }

    /// Decodes an ARP reply.
    ///
    /// Frames that are not ARP, or ARP messages that are not replies, are routine on
    /// a raw link socket and yield `Ok(None)`.
    pub fn decode(bytes: &[u8]) -> Result<Option<Self>> {
        let eth_packet = EthernetPacket::new(bytes)
            .ok_or(Error::MalformedPacket("failed to parse Ethernet frame"))?;
        if eth_packet.get_ethertype() != EtherTypes::Arp {
            return Ok(None);
        }
        let arp_packet = ArpPacket::new(eth_packet.payload())
            .ok_or(Error::MalformedPacket("failed to parse ARP packet"))?;
        if arp_packet.get_hw_addr_len() != MAC_ADDR_LEN
            || arp_packet.get_proto_addr_len() != IP_V4_LEN
        {
            return Err(Error::MalformedPacket("unsupported ARP address lengths"));
        }
        if arp_packet.get_operation() != ArpOperations::Reply {
            return Ok(None);
        }
        Ok(Some(Self {
            destination_mac: eth_packet.get_destination(),
            source_mac: eth_packet.get_source(),
            operation: arp_packet.get_operation(),
            sender_mac: arp_packet.get_sender_hw_addr(),
            sender_ip: arp_packet.get_sender_proto_addr(),
            target_mac: arp_packet.get_target_hw_addr(),
            target_ip: arp_packet.get_target_proto_addr(),
        }))
    }
}
