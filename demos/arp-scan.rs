use async_probe::{ArpConfigBuilder, Client};
use clap::Parser;
use ipnet::Ipv4Net;
use pnet::datalink;
use std::time::{Duration, Instant};
use std::{io::Write, net::IpAddr};

/// Simple example to show ARP request capabilities: asks every host of the interface subnet
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Network interface name to send and receive ARP messages
    #[arg(short, long)]
    iface: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    let interface = datalink::interfaces()
        .into_iter()
        .find(|iface| iface.name == args.iface)
        .ok_or_else(|| format!("interface {} not found", args.iface))
        .unwrap();
    let net = interface
        .ips
        .iter()
        .find(|net| net.is_ipv4())
        .and_then(|net| match net.ip() {
            IpAddr::V4(ipv4) => Ipv4Net::new(ipv4, net.prefix()).ok(),
            IpAddr::V6(_) => None,
        })
        .ok_or("interface does not have an IPv4 network")
        .unwrap();

    let config = ArpConfigBuilder::new(&args.iface)
        .with_source(&net.addr().to_string())
        .with_timeout(Duration::from_millis(500))
        .build()
        .unwrap();
    let hosts: Vec<String> = net.hosts().map(|ip| ip.to_string()).collect();

    let start = Instant::now();
    let outcomes = Client::new().arp(hosts, &config).await.unwrap();
    let scan_duration = start.elapsed();

    let mut found: Vec<_> = outcomes
        .into_iter()
        .filter_map(|(host, outcome)| Some((host, outcome.ok()??)))
        .collect();
    found.sort_by(|a, b| a.0.cmp(&b.0));

    {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "Found hosts:").unwrap();
        for (host, mac) in found {
            writeln!(stdout, "{} is at {}", host, mac).unwrap();
        }
        writeln!(stdout, "Scan took {:?}", scan_duration).unwrap();
    }
}
