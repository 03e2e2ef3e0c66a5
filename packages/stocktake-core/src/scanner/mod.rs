//! Network scanning module.
//!
//! Provides host discovery and per-host fingerprint collection using:
//! - nmap ping scan (with a batched system-ping fallback)
//! - nmap port/OS probe
//! - ARP table reading
//! - Reverse DNS hostname resolution
//! - MAC OUI manufacturer lookup
//! - Remote management query (Windows CIM, when available)

pub mod arp;
pub mod capabilities;
pub mod hostname;
pub mod management;
pub mod oui;
mod ping;
mod probe;
pub mod targets;

pub use capabilities::{ScanCapabilities, detect_capabilities};
pub use management::{ManagementCredentials, ManagementProbe, ManagementReport};

use crate::UNKNOWN;
use anyhow::{Result, bail};
use std::process::Command;

#[cfg(target_os = "windows")]
const CREATE_NO_WINDOW: u32 = 0x08000000;

/// Create a Command that hides the console window on Windows.
pub(crate) fn quiet_command(program: &str) -> Command {
    let mut cmd = Command::new(program);
    #[cfg(target_os = "windows")]
    {
        use std::os::windows::process::CommandExt;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
    cmd
}

/// Everything the sweep could observe about one live host.
///
/// Attributes default to [`UNKNOWN`] (empty for `ports`) and are filled in
/// best-effort by whichever collectors are available. The struct lives only
/// for the duration of one host's trip through the pipeline.
#[derive(Debug, Clone)]
pub struct HostFingerprint {
    pub ip: String,
    pub hostname: String,
    pub os: String,
    pub cpu: String,
    pub ram: String,
    pub storage: String,
    pub free_storage: String,
    pub bios_version: String,
    pub domain_workgroup: String,
    pub logged_in_user: String,
    pub uptime: String,
    pub mac: String,
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
    pub ports: Vec<String>,
}

impl HostFingerprint {
    /// A fingerprint with every attribute at its sentinel default.
    pub fn unknown(ip: &str) -> Self {
        Self {
            ip: ip.to_string(),
            hostname: UNKNOWN.to_string(),
            os: UNKNOWN.to_string(),
            cpu: UNKNOWN.to_string(),
            ram: UNKNOWN.to_string(),
            storage: UNKNOWN.to_string(),
            free_storage: UNKNOWN.to_string(),
            bios_version: UNKNOWN.to_string(),
            domain_workgroup: UNKNOWN.to_string(),
            logged_in_user: UNKNOWN.to_string(),
            uptime: UNKNOWN.to_string(),
            mac: UNKNOWN.to_string(),
            manufacturer: UNKNOWN.to_string(),
            model: UNKNOWN.to_string(),
            serial_number: UNKNOWN.to_string(),
            ports: Vec::new(),
        }
    }
}

/// Collection knobs carried from the CLI into per-host fingerprinting.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectOptions {
    pub skip_os: bool,
    pub skip_arp: bool,
}

/// Discover live hosts for the given target (single IP, `a-b` range, or CIDR).
///
/// Uses `nmap -sn` when the tool is available, otherwise falls back to a
/// batched system-ping sweep over the expanded candidate list. Hosts are
/// returned in discovery order.
pub async fn discover(target: &str, caps: &ScanCapabilities) -> Result<Vec<String>> {
    tracing::info!("Start scan: {}", target);

    let candidates = targets::expand_target(target)?;

    let hosts = if caps.has_nmap {
        probe::ping_scan(&candidates).await?
    } else if caps.can_ping {
        tracing::warn!("nmap not found; falling back to system-ping discovery");
        ping::ping_sweep(&candidates).await
    } else {
        bail!("no discovery mechanism available: nmap is missing and ping failed the capability check");
    };

    tracing::info!("Hosts up: {}", hosts.len());
    Ok(hosts)
}

/// Collect a best-effort fingerprint for one host.
///
/// Each sub-collector is an independent fallible unit; a failure is logged
/// and leaves the corresponding attributes at their sentinel defaults. This
/// function never fails as a whole.
pub async fn collect_fingerprint(
    ip: &str,
    opts: &CollectOptions,
    caps: &ScanCapabilities,
    management: Option<&ManagementProbe>,
) -> HostFingerprint {
    tracing::info!("Scanning: {}", ip);
    let mut fingerprint = HostFingerprint::unknown(ip);

    if let Some(name) = hostname::reverse_lookup(ip).await {
        fingerprint.hostname = name;
    }

    if caps.has_nmap {
        match probe::probe_host(ip, !opts.skip_os && caps.can_detect_os).await {
            Ok(report) => {
                if let Some(os) = report.os {
                    fingerprint.os = os;
                }
                if let Some(mac) = report.mac {
                    fingerprint.mac = mac;
                }
                fingerprint.ports = report.ports;
            }
            Err(e) => tracing::warn!("Port probe failed for {}: {}", ip, e),
        }
    }

    // The probe only sees MACs on the local segment; the ARP table is the
    // fallback source.
    if fingerprint.mac == UNKNOWN && !opts.skip_arp && caps.can_read_arp {
        if let Some(mac) = arp::lookup_mac(ip).await {
            fingerprint.mac = mac;
        }
    }

    if fingerprint.mac != UNKNOWN {
        if let Some(org) = oui::lookup_manufacturer(&fingerprint.mac) {
            fingerprint.manufacturer = org;
        }
    }

    if let Some(probe) = management {
        match probe.query(ip).await {
            Ok(report) => merge_management(&mut fingerprint, report),
            Err(e) => tracing::warn!("Management query failed for {}: {}", ip, e),
        }
    }

    fingerprint
}

/// Fold a management report into the fingerprint, field by field.
/// Absent or blank values leave the existing attribute untouched.
fn merge_management(fingerprint: &mut HostFingerprint, report: ManagementReport) {
    fn apply(slot: &mut String, value: Option<String>) {
        if let Some(v) = value {
            let v = v.trim();
            if !v.is_empty() {
                *slot = v.to_string();
            }
        }
    }

    apply(&mut fingerprint.os, report.os);
    apply(&mut fingerprint.cpu, report.cpu);
    apply(&mut fingerprint.ram, report.ram);
    apply(&mut fingerprint.storage, report.storage);
    apply(&mut fingerprint.free_storage, report.free_storage);
    apply(&mut fingerprint.bios_version, report.bios_version);
    apply(&mut fingerprint.domain_workgroup, report.domain_workgroup);
    apply(&mut fingerprint.logged_in_user, report.logged_in_user);
    apply(&mut fingerprint.uptime, report.uptime);
    apply(&mut fingerprint.manufacturer, report.manufacturer);
    apply(&mut fingerprint.model, report.model);
    apply(&mut fingerprint.serial_number, report.serial_number);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_fingerprint_defaults() {
        let fp = HostFingerprint::unknown("10.0.0.7");
        assert_eq!(fp.ip, "10.0.0.7");
        assert_eq!(fp.os, UNKNOWN);
        assert_eq!(fp.mac, UNKNOWN);
        assert!(fp.ports.is_empty());
    }

    #[test]
    fn management_merge_keeps_defaults_for_blank_fields() {
        let mut fp = HostFingerprint::unknown("10.0.0.7");
        let report = ManagementReport {
            os: Some("Microsoft Windows 11 Pro 10.0.22631".to_string()),
            cpu: Some("  ".to_string()),
            ram: None,
            ..ManagementReport::default()
        };
        merge_management(&mut fp, report);
        assert_eq!(fp.os, "Microsoft Windows 11 Pro 10.0.22631");
        assert_eq!(fp.cpu, UNKNOWN);
        assert_eq!(fp.ram, UNKNOWN);
    }
}
