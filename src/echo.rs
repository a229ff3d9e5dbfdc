use std::time::{SystemTime, UNIX_EPOCH};

use pnet::packet::icmp::echo_request::{EchoRequestPacket, MutableEchoRequestPacket};
use pnet::packet::icmp::{IcmpCode, IcmpType};
use pnet::packet::Packet;

use crate::constants::{
    ICMPV4_ECHO_REQUEST, ICMPV6_ECHO_REPLY, ICMPV6_ECHO_REQUEST, ICMP_HEADER_LEN, PAYLOAD_FILLER,
    TIMESTAMP_LEN,
};
use crate::error::{Error, Result};

/// An ICMP (or ICMPv6) echo message.
///
/// The same layout is used for requests and replies, only the message type differs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EchoPacket {
    pub message_type: u8,
    pub code: u8,
    pub identifier: u16,
    pub sequence: u16,
    pub payload: Vec<u8>,
    pub ipv6: bool,
}

impl EchoPacket {
    /// Creates an echo request with the message type matching the address family.
    pub fn new(identifier: u16, sequence: u16, payload: Vec<u8>, ipv6: bool) -> Self {
        let message_type = if ipv6 {
            ICMPV6_ECHO_REQUEST
        } else {
            ICMPV4_ECHO_REQUEST
        };
        Self {
            message_type,
            code: 0,
            identifier,
            sequence,
            payload,
            ipv6,
        }
    }

    /// Creates an echo request of `packet_size` bytes carrying `sent_at` in its payload.
    ///
    /// The payload always holds at least the timestamp, so packets are never
    /// shorter than the header plus 8 bytes.
    pub fn with_timestamp(
        identifier: u16,
        sequence: u16,
        packet_size: usize,
        ipv6: bool,
        sent_at: SystemTime,
    ) -> Self {
        let filler_len = packet_size.saturating_sub(ICMP_HEADER_LEN + TIMESTAMP_LEN);
        let mut payload = Vec::with_capacity(TIMESTAMP_LEN + filler_len);
        payload.extend_from_slice(&unix_seconds(sent_at).to_be_bytes());
        payload.resize(TIMESTAMP_LEN + filler_len, PAYLOAD_FILLER);
        Self::new(identifier, sequence, payload, ipv6)
    }

    /// The send time embedded at the start of the payload, in seconds since the epoch.
    pub fn timestamp(&self) -> Option<f64> {
        let bytes: [u8; TIMESTAMP_LEN] = self.payload.get(..TIMESTAMP_LEN)?.try_into().ok()?;
        Some(f64::from_be_bytes(bytes))
    }

    /// The checksum carried by the encoded packet; ICMPv6 leaves it to the network stack.
    pub fn checksum(&self) -> u16 {
        if self.ipv6 {
            return 0;
        }
        checksum(&self.encode_with_checksum(0))
    }

    pub fn encode(&self) -> Vec<u8> {
        self.encode_with_checksum(self.checksum())
    }

    fn encode_with_checksum(&self, checksum: u16) -> Vec<u8> {
        let mut buf = vec![0; ICMP_HEADER_LEN + self.payload.len()];
        let mut packet = MutableEchoRequestPacket::new(&mut buf)
            .expect("buffer is sized for the echo header");
        packet.set_icmp_type(IcmpType::new(self.message_type));
        packet.set_icmp_code(IcmpCode::new(self.code));
        packet.set_checksum(checksum);
        packet.set_identifier(self.identifier);
        packet.set_sequence_number(self.sequence);
        packet.set_payload(&self.payload);
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let packet = EchoRequestPacket::new(bytes)
            .ok_or(Error::MalformedPacket("echo message shorter than its header"))?;
        let message_type = packet.get_icmp_type().0;
        Ok(Self {
            message_type,
            code: packet.get_icmp_code().0,
            identifier: packet.get_identifier(),
            sequence: packet.get_sequence_number(),
            payload: packet.payload().to_vec(),
            ipv6: message_type == ICMPV6_ECHO_REQUEST || message_type == ICMPV6_ECHO_REPLY,
        })
    }
}

/// Internet checksum (RFC 1071) of `data`.
///
/// An odd trailing byte is summed as if followed by a zero byte.
pub fn checksum(data: &[u8]) -> u16 {
    let mut chunks = data.chunks_exact(2);
    let mut sum: u32 = chunks
        .by_ref()
        .map(|word| u32::from(u16::from_be_bytes([word[0], word[1]])))
        .fold(0u32, u32::wrapping_add);
    if let [last] = chunks.remainder() {
        sum = sum.wrapping_add(u32::from(*last) << 8);
    }
    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    !(sum as u16)
}

pub(crate) fn unix_seconds(time: SystemTime) -> f64 {
    time.duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const V4_PAYLOAD: [u8; 48] = [
        0x41, 0xd5, 0x19, 0x96, 0xb5, 0xb6, 0xc3, 0xad, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51,
        0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51,
        0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51,
        0x51, 0x51, 0x51,
    ];

    const V4_WIRE: [u8; 56] = [
        0x08, 0x00, 0x70, 0x44, 0x58, 0x8a, 0x00, 0x07, 0x41, 0xd5, 0x19, 0x96, 0xb5, 0xb6, 0xc3,
        0xad, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51,
        0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51,
        0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51,
    ];

    const V6_PAYLOAD: [u8; 56] = [
        0x41, 0xd5, 0x1b, 0x67, 0x5e, 0xd1, 0x9f, 0x5a, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51,
        0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51,
        0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51,
        0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51, 0x51,
    ];

    fn v4_packet() -> EchoPacket {
        EchoPacket::new(22666, 7, V4_PAYLOAD.to_vec(), false)
    }

    #[test]
    fn test_new_sets_family_message_type() {
        let v4 = v4_packet();
        assert_eq!(v4.message_type, 8);
        assert_eq!(v4.code, 0);
        let v6 = EchoPacket::new(0xda25, 9, V6_PAYLOAD.to_vec(), true);
        assert_eq!(v6.message_type, 128);
        assert_eq!(v6.code, 0);
    }

    #[test]
    fn test_known_ipv4_checksum() {
        assert_eq!(v4_packet().checksum(), 0x7044);
    }

    #[test]
    fn test_known_ipv4_wire_image() {
        assert_eq!(v4_packet().encode(), V4_WIRE.to_vec());
    }

    #[test]
    fn test_encoded_ipv4_packet_sums_to_zero() {
        assert_eq!(checksum(&v4_packet().encode()), 0);
    }

    #[test]
    fn test_ipv6_checksum_is_left_to_the_stack() {
        let packet = EchoPacket::new(0xda25, 9, V6_PAYLOAD.to_vec(), true);
        let wire = packet.encode();
        assert_eq!(packet.checksum(), 0);
        assert_eq!(&wire[..8], &[0x80, 0x00, 0x00, 0x00, 0xda, 0x25, 0x00, 0x09]);
        assert_eq!(&wire[8..], &V6_PAYLOAD[..]);
    }

    #[test]
    fn test_decode_restores_fields() {
        let decoded = EchoPacket::decode(&V4_WIRE).unwrap();
        assert_eq!(decoded, v4_packet());

        let v6 = EchoPacket::new(0xda25, 9, V6_PAYLOAD.to_vec(), true);
        assert_eq!(EchoPacket::decode(&v6.encode()).unwrap(), v6);
    }

    #[test]
    fn test_decode_rejects_short_input() {
        let err = EchoPacket::decode(&V4_WIRE[..7]).unwrap_err();
        assert!(matches!(err, Error::MalformedPacket(_)));
        assert!(EchoPacket::decode(&V4_WIRE[..8]).unwrap().payload.is_empty());
    }

    #[test]
    fn test_checksum_pads_odd_input() {
        assert_eq!(checksum(&[0x01]), !0x0100);
        assert_eq!(checksum(&[0x01, 0x00]), checksum(&[0x01]));
    }

    #[test]
    fn test_checksum_folds_carries() {
        // 0xffff + 0x0001 = 0x10000, folded to 0x0001
        assert_eq!(checksum(&[0xff, 0xff, 0x00, 0x01]), !0x0001);
    }

    #[test]
    fn test_timestamped_request_layout() {
        let sent_at = UNIX_EPOCH + std::time::Duration::from_millis(1_500);
        let packet = EchoPacket::with_timestamp(1, 2, 64, false, sent_at);
        assert_eq!(packet.encode().len(), 64);
        assert_eq!(packet.timestamp(), Some(1.5));
        assert!(packet.payload[TIMESTAMP_LEN..]
            .iter()
            .all(|byte| *byte == PAYLOAD_FILLER));
    }

    #[test]
    fn test_timestamped_request_never_drops_the_timestamp() {
        let packet = EchoPacket::with_timestamp(1, 2, 4, true, UNIX_EPOCH);
        assert_eq!(packet.payload.len(), TIMESTAMP_LEN);
        assert_eq!(packet.timestamp(), Some(0.0));
    }
}
