//! Target expression parsing.
//!
//! A sweep target is a single IPv4 address, a range (`10.0.0.5-20` or
//! `10.0.0.5-10.0.0.20`), or CIDR notation (`10.0.0.0/24`).

use anyhow::{Context, Result, bail};
use ipnetwork::Ipv4Network;
use std::net::Ipv4Addr;

/// Hard ceiling on how many candidate addresses one sweep will consider.
pub const MAX_SWEEP_HOSTS: usize = 1024;

/// Expand a target expression into the ordered candidate address list.
pub fn expand_target(target: &str) -> Result<Vec<Ipv4Addr>> {
    let target = target.trim();
    if target.is_empty() {
        bail!("empty sweep target");
    }

    let mut candidates = if target.contains('/') {
        expand_cidr(target)?
    } else if let Some((start, end)) = target.split_once('-') {
        expand_range(start, end)?
    } else {
        vec![
            target
                .parse::<Ipv4Addr>()
                .with_context(|| format!("invalid target address '{target}'"))?,
        ]
    };

    if candidates.len() > MAX_SWEEP_HOSTS {
        tracing::warn!(
            "Target '{}' expands beyond {} hosts; limiting the sweep to the first {}",
            target,
            MAX_SWEEP_HOSTS,
            MAX_SWEEP_HOSTS
        );
        candidates.truncate(MAX_SWEEP_HOSTS);
    }

    Ok(candidates)
}

fn expand_cidr(target: &str) -> Result<Vec<Ipv4Addr>> {
    let network: Ipv4Network = target
        .parse()
        .with_context(|| format!("invalid CIDR target '{target}'"))?;

    // Skip the network and broadcast addresses on real subnets; bound the
    // iteration so a huge prefix cannot balloon memory before the cap.
    let candidates = network
        .iter()
        .filter(|ip| {
            network.prefix() >= 31 || (*ip != network.network() && *ip != network.broadcast())
        })
        .take(MAX_SWEEP_HOSTS + 1)
        .collect();

    Ok(candidates)
}

fn expand_range(start: &str, end: &str) -> Result<Vec<Ipv4Addr>> {
    let first: Ipv4Addr = start
        .trim()
        .parse()
        .with_context(|| format!("invalid range start '{start}'"))?;

    // The end is either a full address or just the final octet
    let end = end.trim();
    let last: Ipv4Addr = if end.contains('.') {
        end.parse()
            .with_context(|| format!("invalid range end '{end}'"))?
    } else {
        let octet: u8 = end
            .parse()
            .with_context(|| format!("invalid range end '{end}'"))?;
        let [a, b, c, _] = first.octets();
        Ipv4Addr::new(a, b, c, octet)
    };

    if u32::from(last) < u32::from(first) {
        bail!("range end {last} precedes range start {first}");
    }

    Ok((u32::from(first)..=u32::from(last))
        .map(Ipv4Addr::from)
        .take(MAX_SWEEP_HOSTS + 1)
        .collect())
}
