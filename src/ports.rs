use std::{collections::BTreeMap, io, net::IpAddr, time::Duration};

use tokio::net::TcpStream;

use crate::error::{Error, Result};
use crate::resolver::AddressDescriptor;

/// Outcome of the TCP checks of one host, by port. `Ok(())` means the port accepted a connection.
#[derive(Debug)]
pub struct PortReport {
    pub host: IpAddr,
    pub ports: BTreeMap<u16, Result<()>>,
}

impl PortReport {
    pub(crate) fn new(host: IpAddr) -> Self {
        Self {
            host,
            ports: BTreeMap::new(),
        }
    }

    pub fn is_open(&self, port: u16) -> bool {
        matches!(self.ports.get(&port), Some(Ok(())))
    }
}

pub(crate) async fn check_port(target: AddressDescriptor, timeout: Duration) -> Result<()> {
    let addr = target.endpoint;
    let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| {
            Error::Io(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("connection to {} timed out", addr),
            ))
        })??;
    drop(stream);
    Ok(())
}
