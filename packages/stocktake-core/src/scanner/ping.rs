//! Ping sweep using the system ping command.
//!
//! Fallback discovery path for machines without nmap installed.

use super::quiet_command;
use std::net::Ipv4Addr;

/// How many hosts are probed concurrently per batch.
const BATCH_SIZE: usize = 50;

/// Sweep the candidate list with the system ping command.
///
/// Returns the responding addresses in candidate order. Individual ping
/// failures are treated as "host down", never as sweep errors.
pub async fn ping_sweep(candidates: &[Ipv4Addr]) -> Vec<String> {
    let total = candidates.len();
    tracing::info!("Pinging {} candidate hosts", total);

    let mut live = Vec::new();
    let mut completed = 0;

    for batch in candidates.chunks(BATCH_SIZE) {
        let mut handles = Vec::with_capacity(batch.len());

        for ip in batch {
            let ip_str = ip.to_string();
            handles.push(tokio::spawn(async move {
                if ping_host(&ip_str).await { Some(ip_str) } else { None }
            }));
        }

        for handle in handles {
            if let Ok(Some(ip)) = handle.await {
                live.push(ip);
            }
        }

        completed += batch.len();
        tracing::debug!(
            "Ping progress: {}/{} hosts checked, {} responding",
            completed,
            total,
            live.len()
        );
    }

    live
}

/// Ping a single host once; true iff it answered.
pub async fn ping_host(ip: &str) -> bool {
    let ip_owned = ip.to_string();

    let result = tokio::task::spawn_blocking(move || {
        #[cfg(target_os = "windows")]
        let output = quiet_command("ping")
            .args(["-n", "1", "-w", "1000", &ip_owned])
            .output();

        #[cfg(not(target_os = "windows"))]
        let output = quiet_command("ping")
            .args(["-c", "1", "-W", "1", &ip_owned])
            .output();

        match output {
            Ok(output) => {
                #[cfg(target_os = "windows")]
                {
                    // Windows ping can exit 0 on an unreachable host
                    let text = String::from_utf8_lossy(&output.stdout).to_lowercase();
                    output.status.success()
                        && text.contains("reply from")
                        && !text.contains("destination host unreachable")
                }

                #[cfg(not(target_os = "windows"))]
                {
                    output.status.success()
                }
            }
            Err(_) => false,
        }
    })
    .await;

    result.unwrap_or(false)
}
