//! Capability detection for the collection subsystems.
//!
//! Tool availability and privileges differ per machine: nmap may be
//! missing, ICMP may need elevation, OS detection (`-O`) always does.
//! Capabilities are checked once at startup so the pipeline can skip an
//! absent subsystem outright instead of suppressing its failures per host.

use serde::{Deserialize, Serialize};

/// What the current process is able to collect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanCapabilities {
    pub can_ping: bool,
    pub has_nmap: bool,
    pub can_read_arp: bool,
    pub can_detect_os: bool,
    pub is_elevated: bool,
    pub warning: Option<String>,
}

/// Detect capabilities based on installed tools and current privileges.
pub async fn detect_capabilities() -> ScanCapabilities {
    let elevated = is_elevated();
    let can_ping = loopback_ping_works().await;
    let has_nmap = super::probe::nmap_available();

    // nmap refuses -O without raw socket privileges
    let can_detect_os = has_nmap && elevated;

    let mut missing = Vec::new();
    if !has_nmap {
        missing.push("nmap not found (port and OS data unavailable)");
    } else if !can_detect_os {
        missing.push("not elevated (OS detection unavailable)");
    }
    if !can_ping {
        missing.push("ping unavailable");
    }

    let warning = if missing.is_empty() {
        None
    } else {
        Some(missing.join("; "))
    };

    ScanCapabilities {
        can_ping,
        has_nmap,
        can_read_arp: true,
        can_detect_os,
        is_elevated: elevated,
        warning,
    }
}

/// Check if the current process is running with elevated privileges.
pub fn is_elevated() -> bool {
    #[cfg(unix)]
    {
        unsafe { libc::geteuid() == 0 }
    }

    #[cfg(target_os = "windows")]
    {
        use super::quiet_command;

        match quiet_command("whoami").args(["/groups"]).output() {
            Ok(output) => {
                let output_str = String::from_utf8_lossy(&output.stdout);
                output_str.contains("S-1-16-12288") || output_str.contains("High Mandatory Level")
            }
            Err(_) => false,
        }
    }

    #[cfg(not(any(unix, target_os = "windows")))]
    {
        false
    }
}

/// Test whether the system ping command works at all.
async fn loopback_ping_works() -> bool {
    super::ping::ping_host("127.0.0.1").await
}
