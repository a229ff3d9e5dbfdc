use std::{
    future::Future,
    io,
    mem::MaybeUninit,
    net::{IpAddr, SocketAddr},
};

use afpacket::tokio::RawPacketStream;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tokio::io::{unix::AsyncFd, AsyncReadExt, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::resolver::{AddressDescriptor, AddressFamily, SocketKind};

/// A raw packet socket owned by a single worker.
///
/// The socket is closed when the channel is dropped.
pub(crate) trait PacketChannel: Send {
    fn send(&mut self, packet: &[u8]) -> impl Future<Output = io::Result<()>> + Send;

    /// Waits until a packet is readable and reads it, returning its length and source address
    /// when the socket reports one.
    fn recv(
        &mut self,
        buf: &mut [u8],
    ) -> impl Future<Output = io::Result<(usize, Option<IpAddr>)>> + Send;
}

/// Raw ICMP (or ICMPv6) socket sending to a single target.
#[derive(Debug)]
pub(crate) struct IcmpSocket {
    inner: AsyncFd<Socket>,
    target: SockAddr,
}

impl IcmpSocket {
    pub(crate) fn open(addr: &AddressDescriptor) -> Result<Self> {
        if addr.kind != SocketKind::Raw {
            return Err(Error::Opaque(
                format!("{} is not a raw socket target", addr.endpoint).into(),
            ));
        }
        let domain = match addr.family {
            AddressFamily::Ipv4 => Domain::IPV4,
            AddressFamily::Ipv6 => Domain::IPV6,
        };
        let protocol = Protocol::from(i32::from(addr.protocol));
        let socket =
            Socket::new(domain, Type::RAW, Some(protocol)).map_err(Error::socket_creation)?;
        socket.set_nonblocking(true)?;
        Ok(Self {
            inner: AsyncFd::new(socket)?,
            target: SockAddr::from(SocketAddr::new(addr.ip(), 0)),
        })
    }
}

impl PacketChannel for IcmpSocket {
    async fn send(&mut self, packet: &[u8]) -> io::Result<()> {
        loop {
            let mut guard = self.inner.writable().await?;
            match guard.try_io(|inner| inner.get_ref().send_to(packet, &self.target)) {
                Ok(sent) => return sent.map(|_| ()),
                Err(_would_block) => continue,
            }
        }
    }

    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<(usize, Option<IpAddr>)> {
        loop {
            let mut guard = self.inner.readable().await?;
            match guard.try_io(|inner| inner.get_ref().recv_from_into_buf(buf)) {
                Ok(received) => return received,
                Err(_would_block) => continue,
            }
        }
    }
}

/// Allows `recv_from` into an initialised `&mut [u8]`, which `socket2::Socket` does not offer.
trait RecvFrom {
    fn recv_from_into_buf(&self, buf: &mut [u8]) -> io::Result<(usize, Option<IpAddr>)>;
}

impl RecvFrom for Socket {
    // Safety: `recv_from` never writes uninitialised bytes into `buf`.
    #[allow(unsafe_code)]
    fn recv_from_into_buf(&self, buf: &mut [u8]) -> io::Result<(usize, Option<IpAddr>)> {
        let buf = unsafe { &mut *(std::ptr::from_mut::<[u8]>(buf) as *mut [MaybeUninit<u8>]) };
        self.recv_from(buf)
            .map(|(size, addr)| (size, addr.as_socket().map(|addr| addr.ip())))
    }
}

/// Link layer socket bound to a network interface, used for ARP.
pub(crate) struct LinkSocket {
    stream: RawPacketStream,
}

impl LinkSocket {
    pub(crate) fn open(interface_name: &str) -> Result<Self> {
        let mut stream = RawPacketStream::new().map_err(Error::socket_creation)?;
        stream.bind(interface_name).map_err(|err| {
            Error::Opaque(format!("failed to bind interface to stream, reason {}", err).into())
        })?;
        Ok(Self { stream })
    }
}

impl PacketChannel for LinkSocket {
    async fn send(&mut self, packet: &[u8]) -> io::Result<()> {
        self.stream.write_all(packet).await
    }

    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<(usize, Option<IpAddr>)> {
        let read_bytes = self.stream.read(buf).await?;
        Ok((read_bytes, None))
    }
}


#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, SocketAddr};

    use super::*;

    #[test]
    fn test_icmp_socket_rejects_stream_targets() {
        let target = AddressDescriptor::stream(SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 80));
        let err = IcmpSocket::open(&target).unwrap_err();
        assert!(matches!(err, Error::Opaque(_)));
    }
}
