use async_probe::{Client, RunParametersBuilder};
use clap::Parser;
use std::io::Write;
use std::time::Duration;

/// Simple example to show ICMP probing capabilities (requires raw socket privileges)
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Hosts (names or addresses) to ping
    #[arg(required = true)]
    hosts: Vec<String>,
    /// Number of echo requests per host
    #[arg(short, long, default_value_t = 4)]
    count: usize,
    /// Seconds to wait for each reply
    #[arg(short = 'W', long, default_value_t = 2)]
    timeout: u64,
    /// Stop after this many seconds regardless of the count
    #[arg(short = 'w', long)]
    deadline: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    let mut builder = RunParametersBuilder::new()
        .with_count(args.count)
        .with_timeout(Duration::from_secs(args.timeout));
    if let Some(deadline) = args.deadline {
        builder = builder.with_deadline(Duration::from_secs(deadline));
    }
    let params = builder.build().unwrap();

    let outcomes = Client::new().ping(args.hosts.clone(), params).await;

    {
        let mut stdout = std::io::stdout().lock();
        for host in &args.hosts {
            match &outcomes[host] {
                Ok(result) => writeln!(
                    stdout,
                    "{} ({}): {}/{} received, {}% loss, min/avg/max {:?}/{:?}/{:?} s",
                    host,
                    result.host,
                    result.received,
                    result.sent,
                    result.packet_loss,
                    result.min,
                    result.avg,
                    result.max
                )
                .unwrap(),
                Err(err) => writeln!(stdout, "{}: {}", host, err).unwrap(),
            }
        }
    }
}
