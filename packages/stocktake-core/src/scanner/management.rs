//! Remote management query (Windows CIM over PowerShell).
//!
//! The management subsystem is optional equipment: it exists only on
//! Windows hosts with remote credentials configured. `ManagementProbe::
//! acquire` models that as a capability handle: when it returns `None`
//! the pipeline skips the step entirely rather than failing per host.
//!
//! The query itself is one fallible unit: it either produces a full
//! [`ManagementReport`] or fails with a single logged error; individual
//! absent fields come back as `None` and leave the fingerprint's sentinel
//! defaults in place.

use anyhow::Result;
use serde::Deserialize;

#[cfg(target_os = "windows")]
use anyhow::{Context, bail};

/// Remote query credentials, sourced from configuration; never from
/// source literals.
#[derive(Clone, Deserialize)]
pub struct ManagementCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for ManagementCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagementCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// What one management query could report. Every field is optional;
/// blanks are resolved against the fingerprint's defaults by the caller.
#[derive(Debug, Default)]
pub struct ManagementReport {
    pub os: Option<String>,
    pub cpu: Option<String>,
    pub ram: Option<String>,
    pub storage: Option<String>,
    pub free_storage: Option<String>,
    pub bios_version: Option<String>,
    pub domain_workgroup: Option<String>,
    pub logged_in_user: Option<String>,
    pub uptime: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
}

/// Handle for the remote management capability.
#[derive(Debug)]
pub struct ManagementProbe {
    #[cfg_attr(not(target_os = "windows"), allow(dead_code))]
    credentials: ManagementCredentials,
}

impl ManagementProbe {
    /// Acquire the management capability, if this platform and
    /// configuration support it.
    pub fn acquire(credentials: Option<ManagementCredentials>) -> Option<Self> {
        #[cfg(target_os = "windows")]
        {
            match credentials {
                Some(credentials) => Some(Self { credentials }),
                None => {
                    tracing::info!(
                        "Management queries disabled: no credentials configured (see config.toml [management])"
                    );
                    None
                }
            }
        }

        #[cfg(not(target_os = "windows"))]
        {
            if credentials.is_some() {
                tracing::info!("Management queries are only available on Windows agents; skipping");
            }
            None
        }
    }

    /// Query one host. Fails as a whole; never partially raises.
    #[cfg(target_os = "windows")]
    pub async fn query(&self, ip: &str) -> Result<ManagementReport> {
        let script = build_query_script(ip, &self.credentials);

        let output = tokio::task::spawn_blocking(move || {
            super::quiet_command("powershell")
                .args(["-NoProfile", "-ExecutionPolicy", "Bypass", "-Command", &script])
                .output()
        })
        .await
        .context("management query task panicked")?
        .context("failed to run powershell")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("management query exited with {}: {}", output.status, stderr.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_report(&stdout)
    }

    #[cfg(not(target_os = "windows"))]
    pub async fn query(&self, _ip: &str) -> Result<ManagementReport> {
        anyhow::bail!("management queries are not available on this platform")
    }
}

/// One CIM round trip emitting a single pipe-delimited record.
#[cfg(target_os = "windows")]
fn build_query_script(ip: &str, credentials: &ManagementCredentials) -> String {
    format!(
        r#"
$ErrorActionPreference = 'Stop'
$sec = ConvertTo-SecureString '{password}' -AsPlainText -Force
$cred = New-Object System.Management.Automation.PSCredential('{username}', $sec)
$session = New-CimSession -ComputerName '{ip}' -Credential $cred

$os = Get-CimInstance -CimSession $session -ClassName Win32_OperatingSystem
$cs = Get-CimInstance -CimSession $session -ClassName Win32_ComputerSystem
$bios = Get-CimInstance -CimSession $session -ClassName Win32_BIOS
$cpu = Get-CimInstance -CimSession $session -ClassName Win32_Processor | Select-Object -First 1
$product = Get-CimInstance -CimSession $session -ClassName Win32_ComputerSystemProduct
$disks = Get-CimInstance -CimSession $session -ClassName Win32_LogicalDisk -Filter 'DriveType=3'

$total = [math]::Round(($disks | Measure-Object -Property Size -Sum).Sum / 1GB)
$free = [math]::Round(($disks | Measure-Object -Property FreeSpace -Sum).Sum / 1GB)
$ram = [math]::Round($cs.TotalPhysicalMemory / 1GB)
$uptime = ((Get-Date) - $os.LastBootUpTime).ToString('d\.hh\:mm\:ss')

Write-Output ("{{0}}|{{1}}|{{2}}|{{3}}|{{4}}|{{5}}|{{6}}|{{7}}|{{8}}|{{9}}|{{10}}|{{11}}" -f `
    "$($os.Caption) $($os.Version)", $cpu.Name, $ram, $total, $free, `
    $bios.SMBIOSBIOSVersion, $cs.Domain, $cs.UserName, $uptime, `
    $cs.Manufacturer, $product.Name, $product.IdentifyingNumber)

Remove-CimSession -CimSession $session
"#,
        password = credentials.password.replace('\'', "''"),
        username = credentials.username.replace('\'', "''"),
        ip = ip,
    )
}

#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
fn parse_report(stdout: &str) -> Result<ManagementReport> {
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|l| l.matches('|').count() == 11)
        .ok_or_else(|| anyhow::anyhow!("management query produced no record"))?;

    let mut fields = line.split('|').map(|f| {
        let f = f.trim();
        if f.is_empty() {
            None
        } else {
            Some(f.to_string())
        }
    });

    Ok(ManagementReport {
        os: fields.next().flatten(),
        cpu: fields.next().flatten(),
        ram: fields.next().flatten(),
        storage: fields.next().flatten(),
        free_storage: fields.next().flatten(),
        bios_version: fields.next().flatten(),
        domain_workgroup: fields.next().flatten(),
        logged_in_user: fields.next().flatten(),
        uptime: fields.next().flatten(),
        manufacturer: fields.next().flatten(),
        model: fields.next().flatten(),
        serial_number: fields.next().flatten(),
    })
}
