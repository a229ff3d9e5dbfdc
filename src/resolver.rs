use std::{
    collections::HashMap,
    future::Future,
    net::{IpAddr, SocketAddr},
};

use crate::constants::{ICMPV4_PROTOCOL, ICMPV6_PROTOCOL, TCP_PROTOCOL};
use crate::error::{Error, Result};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => AddressFamily::Ipv4,
            IpAddr::V6(_) => AddressFamily::Ipv6,
        }
    }

    /// IANA protocol number of the ICMP flavour used with this family.
    pub fn icmp_protocol(self) -> u8 {
        match self {
            AddressFamily::Ipv4 => ICMPV4_PROTOCOL,
            AddressFamily::Ipv6 => ICMPV6_PROTOCOL,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum SocketKind {
    Raw,
    Stream,
}

/// A resolved probe target.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct AddressDescriptor {
    pub family: AddressFamily,
    pub kind: SocketKind,
    pub protocol: u8,
    pub endpoint: SocketAddr,
}

impl AddressDescriptor {
    /// Descriptor for ICMP probing of `addr`.
    pub fn raw(addr: IpAddr) -> Self {
        let family = AddressFamily::of(&addr);
        Self {
            family,
            kind: SocketKind::Raw,
            protocol: family.icmp_protocol(),
            endpoint: SocketAddr::new(addr, 0),
        }
    }

    /// Descriptor for a TCP connection to `addr`.
    pub fn stream(addr: SocketAddr) -> Self {
        Self {
            family: AddressFamily::of(&addr.ip()),
            kind: SocketKind::Stream,
            protocol: TCP_PROTOCOL,
            endpoint: addr,
        }
    }

    pub fn ip(&self) -> IpAddr {
        self.endpoint.ip()
    }
}

/// Resolves host identifiers (names or literal addresses) into probe targets.
///
/// Implementations must return exactly one entry per input host. An empty address
/// list is allowed and is reported by the caller as a resolution failure.
pub trait Resolver: Send + Sync {
    fn resolve(
        &self,
        hosts: &[String],
        family: Option<AddressFamily>,
    ) -> impl Future<Output = HashMap<String, Result<Vec<AddressDescriptor>>>> + Send;
}

/// Resolves every host concurrently through the operating system resolver.
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemResolver;

impl SystemResolver {
    pub fn new() -> Self {
        Self
    }

    async fn resolve_one(
        host: &str,
        family: Option<AddressFamily>,
    ) -> Result<Vec<AddressDescriptor>> {
        let addrs = tokio::net::lookup_host((host, 0))
            .await
            .map_err(|err| Error::resolution(host, err))?;
        Ok(addrs
            .map(|addr| AddressDescriptor::raw(addr.ip()))
            .filter(|addr| family.map_or(true, |family| addr.family == family))
            .collect())
    }
}

impl Resolver for SystemResolver {
    async fn resolve(
        &self,
        hosts: &[String],
        family: Option<AddressFamily>,
    ) -> HashMap<String, Result<Vec<AddressDescriptor>>> {
        let lookups = hosts.iter().map(|host| async move {
            let resolved = Self::resolve_one(host, family).await;
            if let Err(err) = &resolved {
                log::debug!("{}", err);
            }
            (host.clone(), resolved)
        });
        futures::future::join_all(lookups).await.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr};

    use super::*;

    #[test]
    fn test_raw_descriptor_follows_family() {
        let v4 = AddressDescriptor::raw(IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(v4.family, AddressFamily::Ipv4);
        assert_eq!(v4.protocol, 1);
        assert_eq!(v4.kind, SocketKind::Raw);

        let v6 = AddressDescriptor::raw(IpAddr::V6(Ipv6Addr::LOCALHOST));
        assert_eq!(v6.family, AddressFamily::Ipv6);
        assert_eq!(v6.protocol, 58);
    }

    #[tokio::test]
    async fn test_resolves_literal_addresses() {
        let hosts = vec!["127.0.0.1".to_string(), "::1".to_string()];
        let resolved = SystemResolver::new().resolve(&hosts, None).await;
        assert_eq!(resolved.len(), 2);
        let v4 = resolved["127.0.0.1"].as_ref().unwrap();
        assert_eq!(v4[0].ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
        let v6 = resolved["::1"].as_ref().unwrap();
        assert_eq!(v6[0].ip(), IpAddr::V6(Ipv6Addr::LOCALHOST));
    }

    #[tokio::test]
    async fn test_family_filter_drops_other_family() {
        let hosts = vec!["::1".to_string()];
        let resolved = SystemResolver::new()
            .resolve(&hosts, Some(AddressFamily::Ipv4))
            .await;
        assert!(resolved["::1"].as_ref().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unresolvable_host_is_reported_per_host() {
        let hosts = vec!["no-such-host.invalid".to_string(), "127.0.0.1".to_string()];
        let resolved = SystemResolver::new().resolve(&hosts, None).await;
        assert!(matches!(
            resolved["no-such-host.invalid"],
            Err(Error::Resolution { .. })
        ));
        assert!(resolved["127.0.0.1"].is_ok());
    }
}
