use std::{
    net::IpAddr,
    time::{SystemTime, UNIX_EPOCH},
};

use tokio::time::Instant;

use crate::echo::EchoPacket;
use crate::error::Result;
use crate::params::RunParameters;
use crate::resolver::AddressDescriptor;
use crate::response::{wait_for_reply, EchoMatcher};
use crate::socket::{IcmpSocket, PacketChannel};

/// Round trip statistics of one host.
///
/// Latencies are in seconds and are `None` when no reply was received.
#[derive(Clone, PartialEq, Debug)]
pub struct ProbeResult {
    pub host: IpAddr,
    pub sent: usize,
    pub received: usize,
    pub min: Option<f64>,
    pub avg: Option<f64>,
    pub max: Option<f64>,
    /// Percentage of unanswered requests, truncated to an integer.
    pub packet_loss: usize,
}

impl ProbeResult {
    pub(crate) fn from_samples(host: IpAddr, sent: usize, samples: &[f64]) -> Self {
        let received = samples.len();
        let min = samples.iter().copied().reduce(f64::min);
        let max = samples.iter().copied().reduce(f64::max);
        let avg = (received > 0).then(|| samples.iter().sum::<f64>() / received as f64);
        Self {
            host,
            sent,
            received,
            min,
            avg,
            max,
            packet_loss: 100 - (received * 100).checked_div(sent).unwrap_or(0),
        }
    }
}

/// Pings one host for a whole run on its own raw socket.
pub(crate) async fn ping_worker(
    addr: AddressDescriptor,
    params: RunParameters,
) -> Result<ProbeResult> {
    let mut socket = IcmpSocket::open(&addr)?;
    run_rounds(&mut socket, addr.ip(), params).await
}

/// Identifier tagging every request of a worker.
///
/// Derived from the clock, so workers started in the same microsecond modulo 2^16 collide;
/// replies are matched on the source address too.
fn session_identifier() -> u16 {
    let micros = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_micros())
        .unwrap_or_default();
    (micros & 0xffff) as u16
}

pub(crate) async fn run_rounds<C: PacketChannel>(
    channel: &mut C,
    host: IpAddr,
    params: RunParameters,
) -> Result<ProbeResult> {
    let deadline = params.deadline.map(|deadline| Instant::now() + deadline);
    let identifier = session_identifier();
    log::debug!("pinging {} with identifier {}", host, identifier);

    let mut sent = 0;
    let mut samples = Vec::with_capacity(params.count);
    for round in 0..params.count {
        let round_started = Instant::now();
        let sequence = (round & 0xffff) as u16;
        let request = EchoPacket::with_timestamp(
            identifier,
            sequence,
            params.packet_size,
            host.is_ipv6(),
            SystemTime::now(),
        );
        channel.send(&request.encode()).await?;
        sent += 1;

        let matcher = EchoMatcher {
            host,
            identifier,
            sequence,
        };
        match wait_for_reply(channel, &matcher, params.timeout).await? {
            Some(sample) => samples.push(sample),
            None => log::trace!("no reply from {} for sequence {}", host, sequence),
        }

        if deadline.is_some_and(|deadline| deadline <= Instant::now()) {
            log::debug!("deadline reached for {} after {} rounds", host, sent);
            break;
        }

        let round_time = round_started.elapsed();
        if round_time < params.interval {
            tokio::time::sleep(params.interval - round_time).await;
        }
    }

    let result = ProbeResult::from_samples(host, sent, &samples);
    log::debug!(
        "{}: {} sent, {} received, {}% loss",
        host,
        result.sent,
        result.received,
        result.packet_loss
    );
    Ok(result)
}
