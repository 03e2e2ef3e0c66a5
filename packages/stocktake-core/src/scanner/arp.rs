//! ARP table reading using system commands.
//!
//! The ARP table is the MAC source of last resort: the port probe only
//! reports MACs for hosts on the local segment, and ARP only knows hosts
//! the kernel has recently exchanged traffic with (the discovery sweep
//! warms it up).

use super::quiet_command;
use anyhow::Result;
use std::collections::HashMap;

/// Read the system ARP table as an ip -> MAC map.
pub async fn arp_table() -> Result<HashMap<String, String>> {
    let output = tokio::task::spawn_blocking(|| {
        #[cfg(target_os = "windows")]
        return quiet_command("arp").args(["-a"]).output();

        #[cfg(target_os = "macos")]
        return quiet_command("arp").args(["-a", "-n"]).output();

        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        quiet_command("arp").args(["-n"]).output()
    })
    .await??;

    let text = String::from_utf8_lossy(&output.stdout);

    #[cfg(target_os = "windows")]
    return Ok(parse_arp_windows(&text));

    #[cfg(target_os = "macos")]
    return Ok(parse_arp_macos(&text));

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    Ok(parse_arp_linux(&text))
}

/// Look up the MAC for a single address in the ARP table.
pub async fn lookup_mac(ip: &str) -> Option<String> {
    match arp_table().await {
        Ok(table) => table.get(ip).cloned(),
        Err(e) => {
            tracing::debug!("ARP table read failed: {}", e);
            None
        }
    }
}

fn plausible_mac(mac: &str) -> bool {
    mac.len() == 17 && mac != "00:00:00:00:00:00"
}

/// `arp -a` on Windows: `  10.0.0.1        aa-bb-cc-dd-ee-ff     dynamic`
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
fn parse_arp_windows(text: &str) -> HashMap<String, String> {
    let mut table = HashMap::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("Interface") || line.contains("Internet Address") {
            continue;
        }

        let mut fields = line.split_whitespace();
        if let (Some(ip), Some(mac)) = (fields.next(), fields.next()) {
            if ip.parse::<std::net::IpAddr>().is_ok() && mac.contains('-') {
                let mac = mac.replace('-', ":").to_uppercase();
                if plausible_mac(&mac) {
                    table.entry(ip.to_string()).or_insert(mac);
                }
            }
        }
    }

    table
}

/// `arp -n` on Linux: `10.0.0.1  ether  aa:bb:cc:dd:ee:ff  C  eth0`
#[cfg_attr(any(target_os = "windows", target_os = "macos"), allow(dead_code))]
fn parse_arp_linux(text: &str) -> HashMap<String, String> {
    let mut table = HashMap::new();

    for line in text.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            continue;
        }
        let (ip, mac) = (fields[0], fields[2]);

        if ip.parse::<std::net::IpAddr>().is_ok() && mac.contains(':') {
            let mac = mac.to_uppercase();
            if plausible_mac(&mac) {
                table.entry(ip.to_string()).or_insert(mac);
            }
        }
    }

    table
}

/// `arp -a -n` on macOS: `? (10.0.0.1) at aa:bb:cc:dd:ee:ff on en0 ifscope [ethernet]`
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn parse_arp_macos(text: &str) -> HashMap<String, String> {
    let mut table = HashMap::new();

    for line in text.lines() {
        let Some(open) = line.find('(') else { continue };
        let Some(close) = line.find(')') else { continue };
        let ip = &line[open + 1..close];
        if ip.parse::<std::net::IpAddr>().is_err() {
            continue;
        }

        let Some(at) = line.find(" at ") else { continue };
        let Some(mac) = line[at + 4..].split_whitespace().next() else {
            continue;
        };
        if mac == "(incomplete)" || !mac.contains(':') {
            continue;
        }

        let mac = mac.to_uppercase();
        if plausible_mac(&mac) {
            table.entry(ip.to_string()).or_insert(mac);
        }
    }

    table
}
