use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    time::Duration,
};

use pnet::{datalink, util::MacAddr};

use crate::dispatch::{dispatch, join_tasks, resolve_targets};
use crate::error::{Error, Result};
use crate::params::{ArpConfig, RunParameters};
use crate::ports::{check_port, PortReport};
use crate::probe::{ping_worker, ProbeResult};
use crate::request::{arp_worker, ArpSender};
use crate::resolver::{AddressDescriptor, AddressFamily, Resolver, SystemResolver};

/// Entry point for probing many hosts at once.
///
/// Every operation resolves its hosts through the client's [`Resolver`], probes each
/// resolvable host in its own task and returns one outcome per distinct host, keyed
/// by the host exactly as it was given. Hosts that cannot be resolved get their
/// resolution error as outcome; they never abort the run.
///
/// # Example
/// ```no_run
/// use async_probe::{Client, RunParametersBuilder};
/// use std::time::Duration;
///
/// let params = RunParametersBuilder::new()
///     .with_count(3)
///     .with_timeout(Duration::from_secs(2))
///     .build()
///     .expect("invalid parameters");
/// tokio_test::block_on(async {
///     let client = Client::new();
///     let outcomes = client.ping(["127.0.0.1", "example.com"], params).await;
///     for (host, outcome) in outcomes {
///         println!("{}: {:?}", host, outcome);
///     }
/// })
/// ```
#[derive(Debug, Default)]
pub struct Client<R = SystemResolver> {
    resolver: R,
}

impl Client<SystemResolver> {
    pub fn new() -> Self {
        Self {
            resolver: SystemResolver::new(),
        }
    }
}

impl<R: Resolver> Client<R> {
    /// Creates a client resolving hosts through `resolver`.
    pub fn with_resolver(resolver: R) -> Self {
        Self { resolver }
    }

    /// Sends ICMP echo requests to every host and collects round trip statistics.
    ///
    /// Each host is probed from its own raw socket, so this requires privileges
    /// (root or `CAP_NET_RAW`); without them every resolvable host reports
    /// [`Error::Permission`].
    pub async fn ping<I, S>(
        &self,
        hosts: I,
        params: RunParameters,
    ) -> HashMap<String, Result<ProbeResult>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let hosts = collect_hosts(hosts);
        dispatch(&hosts, &self.resolver, None, move |addr| ping_worker(addr, params)).await
    }

    /// Asks every host for its hardware address with a broadcast ARP request.
    ///
    /// A host that does not answer within the timeout maps to `Ok(None)`. Hosts are
    /// resolved to IPv4 addresses only, so a host with no IPv4 address (an IPv6 literal
    /// included) maps to [`Error::Resolution`].
    ///
    /// # Example
    /// ```no_run
    /// use async_probe::{ArpConfigBuilder, Client};
    ///
    /// let config = ArpConfigBuilder::new("eth0")
    ///     .with_source("192.168.1.100")
    ///     .build()
    ///     .expect("invalid ARP configuration");
    /// tokio_test::block_on(async {
    ///     let client = Client::new();
    ///     let outcomes = client.arp(["192.168.1.1"], &config).await.unwrap();
    ///     println!("{:?}", outcomes);
    /// })
    /// ```
    ///
    /// # Errors
    /// Returns an error if the source does not resolve to an IPv4 address, or if the
    /// interface does not exist or has no hardware address.
    pub async fn arp<I, S>(
        &self,
        hosts: I,
        config: &ArpConfig,
    ) -> Result<HashMap<String, Result<Option<MacAddr>>>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sender = self.arp_sender(config).await?;
        let timeout = config.timeout;
        let hosts = collect_hosts(hosts);
        Ok(dispatch(
            &hosts,
            &self.resolver,
            Some(AddressFamily::Ipv4),
            move |target| arp_worker(target, sender.clone(), timeout),
        )
        .await)
    }

    async fn arp_sender(&self, config: &ArpConfig) -> Result<ArpSender> {
        let source = [config.source.clone()];
        let resolved = self
            .resolver
            .resolve(&source, Some(AddressFamily::Ipv4))
            .await
            .remove(&config.source)
            .unwrap_or_else(|| {
                Err(Error::resolution(
                    &config.source,
                    "resolver returned no entry",
                ))
            })?;
        let ip = match resolved.first().map(|addr| addr.ip()) {
            Some(IpAddr::V4(ip)) => ip,
            _ => return Err(Error::resolution(&config.source, "no IPv4 address")),
        };
        Ok(ArpSender {
            interface_name: config.interface_name.clone(),
            mac: interface_mac(&config.interface_name)?,
            ip,
        })
    }

    /// Tries a TCP connection to every listed port of every host.
    ///
    /// Ports are checked concurrently, one task per host and port.
    pub async fn check_ports(
        &self,
        hosts_ports: &HashMap<String, Vec<u16>>,
        timeout: Duration,
    ) -> HashMap<String, Result<PortReport>> {
        let hosts: Vec<String> = hosts_ports.keys().cloned().collect();
        let (targets, mut outcomes) = resolve_targets(&hosts, &self.resolver, None).await;

        let mut reports = HashMap::with_capacity(targets.len());
        let mut tasks = Vec::new();
        for (host, addr) in targets {
            for &port in &hosts_ports[&host] {
                let target = AddressDescriptor::stream(SocketAddr::new(addr.ip(), port));
                let task = tokio::spawn(check_port(target, timeout));
                tasks.push(((host.clone(), port), task));
            }
            reports.insert(host, PortReport::new(addr.ip()));
        }
        for ((host, port), outcome) in join_tasks(tasks).await {
            if let Some(report) = reports.get_mut(&host) {
                report.ports.insert(port, outcome);
            }
        }

        outcomes.extend(reports.into_iter().map(|(host, report)| (host, Ok(report))));
        outcomes
    }
}

fn collect_hosts<I, S>(hosts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    hosts.into_iter().map(Into::into).collect()
}

fn interface_mac(interface_name: &str) -> Result<MacAddr> {
    let interface = datalink::interfaces()
        .into_iter()
        .find(|iface| iface.name == interface_name)
        .ok_or_else(|| Error::Opaque(format!("interface {} not found", interface_name).into()))?;
    interface.mac.ok_or_else(|| {
        Error::Opaque(format!("interface {} does not have mac address", interface_name).into())
    })
}
