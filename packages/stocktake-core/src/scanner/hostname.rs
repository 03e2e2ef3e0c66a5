//! Reverse DNS hostname resolution via system resolvers.

use super::quiet_command;
use tokio::time::{Duration, timeout};

#[cfg(target_os = "windows")]
const LOOKUP_TIMEOUT: Duration = Duration::from_millis(5000);
#[cfg(not(target_os = "windows"))]
const LOOKUP_TIMEOUT: Duration = Duration::from_millis(2000);

/// Resolve the PTR name for an address, if any resolver knows one.
pub async fn reverse_lookup(ip: &str) -> Option<String> {
    let ip_owned = ip.to_string();

    let task = tokio::task::spawn_blocking(move || resolve_blocking(&ip_owned));

    match timeout(LOOKUP_TIMEOUT, task).await {
        Ok(joined) => joined.ok().flatten(),
        Err(_) => None,
    }
}

#[cfg(not(target_os = "windows"))]
fn resolve_blocking(ip: &str) -> Option<String> {
    // Method 1: getent hosts (nsswitch-aware)
    if let Ok(output) = quiet_command("getent").args(["hosts", ip]).output() {
        if output.status.success() {
            let out = String::from_utf8_lossy(&output.stdout);
            if let Some(hostname) = out.split_whitespace().nth(1) {
                if !hostname.is_empty() {
                    return Some(hostname.to_string());
                }
            }
        }
    }

    // Method 2: host command
    if let Ok(output) = quiet_command("host").arg(ip).output() {
        if output.status.success() {
            let out = String::from_utf8_lossy(&output.stdout);
            if let Some(hostname) = out.split("pointer").nth(1) {
                let hostname = hostname.trim().trim_end_matches('.');
                if !hostname.is_empty() {
                    return Some(hostname.to_string());
                }
            }
        }
    }

    None
}

#[cfg(target_os = "windows")]
fn resolve_blocking(ip: &str) -> Option<String> {
    let output = quiet_command("powershell")
        .args([
            "-NoProfile",
            "-ExecutionPolicy",
            "Bypass",
            "-Command",
            &format!(
                "try {{ (Resolve-DnsName -Name '{}' -Type PTR -ErrorAction Stop).NameHost }} catch {{ }}",
                ip
            ),
        ])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let out = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if out.is_empty() || out.contains("error") || out.contains(ip) {
        return None;
    }
    Some(out)
}
