//! nmap invocation and output parsing.
//!
//! nmap is treated as a black box: it either produces a report we can
//! parse or the probe fails for that host. Implementing the scanning
//! protocol itself is out of scope.

use anyhow::{Context, Result, bail};
use std::net::Ipv4Addr;
use std::process::Output;

use super::quiet_command;

/// What one `nmap -T4 -F` run could tell us about a host.
#[derive(Debug, Default)]
pub struct ProbeReport {
    pub os: Option<String>,
    pub ports: Vec<String>,
    pub mac: Option<String>,
}

/// Check whether the nmap binary is on PATH.
pub(crate) fn nmap_available() -> bool {
    quiet_command("nmap")
        .arg("-V")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Discover live hosts with an nmap ping scan (`-sn`).
pub async fn ping_scan(candidates: &[Ipv4Addr]) -> Result<Vec<String>> {
    let args: Vec<String> = candidates.iter().map(|ip| ip.to_string()).collect();

    let output = run_nmap(move |cmd| {
        cmd.args(["-sn", "-T4"]).args(&args);
    })
    .await?;

    Ok(parse_ping_scan(&String::from_utf8_lossy(&output.stdout)))
}

/// Probe one host for open ports (fast port set) and, optionally, an OS match.
pub async fn probe_host(ip: &str, detect_os: bool) -> Result<ProbeReport> {
    let ip_owned = ip.to_string();

    let output = run_nmap(move |cmd| {
        cmd.args(["-T4", "-F"]);
        if detect_os {
            cmd.arg("-O");
        }
        cmd.arg(&ip_owned);
    })
    .await?;

    Ok(parse_probe_output(&String::from_utf8_lossy(&output.stdout)))
}

async fn run_nmap<F>(configure: F) -> Result<Output>
where
    F: FnOnce(&mut std::process::Command) + Send + 'static,
{
    let output = tokio::task::spawn_blocking(move || {
        let mut cmd = quiet_command("nmap");
        configure(&mut cmd);
        cmd.output()
    })
    .await
    .context("nmap task panicked")?
    .context("failed to run nmap")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("nmap exited with {}: {}", output.status, stderr.trim());
    }

    Ok(output)
}

/// Extract the live addresses from `-sn` output.
///
/// Report lines look like either of:
/// `Nmap scan report for 10.0.0.5`
/// `Nmap scan report for printer.lan (10.0.0.9)`
fn parse_ping_scan(output: &str) -> Vec<String> {
    let mut hosts = Vec::new();

    for line in output.lines() {
        let Some(rest) = line.trim().strip_prefix("Nmap scan report for ") else {
            continue;
        };
        let candidate = match rest.rfind('(') {
            Some(start) => rest[start + 1..].trim_end_matches(')'),
            None => rest,
        };
        let candidate = candidate.trim();
        if candidate.parse::<std::net::IpAddr>().is_ok() {
            hosts.push(candidate.to_string());
        }
    }

    hosts
}

/// Extract open ports, the MAC address, and an OS guess from probe output.
fn parse_probe_output(output: &str) -> ProbeReport {
    let mut report = ProbeReport::default();

    for line in output.lines() {
        let line = line.trim();

        // e.g. "22/tcp   open  ssh"
        let mut fields = line.split_whitespace();
        if let (Some(port_proto), Some(state)) = (fields.next(), fields.next()) {
            if state == "open" {
                if let Some((port, proto)) = port_proto.split_once('/') {
                    if proto == "tcp" && port.chars().all(|c| c.is_ascii_digit()) {
                        let service = fields.next().unwrap_or("unknown");
                        report.ports.push(format!("{port} ({service})"));
                        continue;
                    }
                }
            }
        }

        // e.g. "MAC Address: 08:00:27:4B:2C:11 (Oracle VirtualBox virtual NIC)"
        if let Some(rest) = line.strip_prefix("MAC Address: ") {
            if let Some(mac) = rest.split_whitespace().next() {
                report.mac = Some(mac.to_string());
            }
            continue;
        }

        // "OS details:" is the confident match; "Running:" is the coarser guess
        if let Some(rest) = line.strip_prefix("OS details: ") {
            report.os = Some(rest.trim().to_string());
        } else if report.os.is_none() {
            if let Some(rest) = line.strip_prefix("Running: ") {
                report.os = Some(rest.trim().to_string());
            }
        }
    }

    report
}
