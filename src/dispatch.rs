use std::{
    collections::{HashMap, HashSet},
    future::Future,
};

use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::resolver::{AddressDescriptor, AddressFamily, Resolver};

/// Resolves `hosts` once, splitting them into probe targets and settled resolution failures.
///
/// Duplicate hosts are only kept once. Each target is bound to the first resolved address.
pub(crate) async fn resolve_targets<R, T>(
    hosts: &[String],
    resolver: &R,
    family: Option<AddressFamily>,
) -> (Vec<(String, AddressDescriptor)>, HashMap<String, Result<T>>)
where
    R: Resolver,
{
    let mut seen = HashSet::with_capacity(hosts.len());
    let hosts: Vec<String> = hosts
        .iter()
        .filter(|host| seen.insert(host.as_str()))
        .cloned()
        .collect();

    let mut resolved = resolver.resolve(&hosts, family).await;
    let mut targets = Vec::with_capacity(hosts.len());
    let mut failures = HashMap::new();
    for host in hosts {
        let outcome = match resolved.remove(&host) {
            Some(Ok(addrs)) => addrs
                .first()
                .copied()
                .ok_or_else(|| Error::resolution(&host, "no usable address")),
            Some(Err(err)) => Err(err),
            None => Err(Error::resolution(&host, "resolver returned no entry")),
        };
        match outcome {
            Ok(addr) => targets.push((host, addr)),
            Err(err) => {
                log::debug!("not probing {}: {}", host, err);
                failures.insert(host, Err(err));
            }
        }
    }
    (targets, failures)
}

/// Awaits every spawned task; a task that panicked or was cancelled fails on its own.
pub(crate) async fn join_tasks<K, T>(
    tasks: Vec<(K, JoinHandle<Result<T>>)>,
) -> Vec<(K, Result<T>)> {
    let (keys, handles): (Vec<_>, Vec<_>) = tasks.into_iter().unzip();
    let joined = futures::future::join_all(handles).await;
    keys.into_iter()
        .zip(joined)
        .map(|(key, joined)| {
            let outcome = joined.unwrap_or_else(|err| {
                log::warn!("probe task failed: {}", err);
                Err(Error::Opaque(
                    format!("probe task failed, reason: {}", err).into(),
                ))
            });
            (key, outcome)
        })
        .collect()
}

/// Runs `worker` concurrently for every resolvable host and merges all outcomes.
///
/// The returned map holds exactly one entry per distinct host: either the worker's
/// outcome or the reason the host could not be resolved.
pub(crate) async fn dispatch<R, W, Fut, T>(
    hosts: &[String],
    resolver: &R,
    family: Option<AddressFamily>,
    worker: W,
) -> HashMap<String, Result<T>>
where
    R: Resolver,
    W: Fn(AddressDescriptor) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let (targets, mut outcomes) = resolve_targets(hosts, resolver, family).await;
    let tasks = targets
        .into_iter()
        .map(|(host, addr)| (host, tokio::spawn(worker(addr))))
        .collect();
    outcomes.extend(join_tasks(tasks).await);
    outcomes
}
