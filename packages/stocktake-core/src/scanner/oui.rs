//! MAC OUI (Organizationally Unique Identifier) manufacturer lookup.
//!
//! Uses the IEEE OUI database to fill the fingerprint's manufacturer field
//! when nothing better (e.g. a management query) is available.

/// Lookup the manufacturer name registered for a MAC address prefix.
pub fn lookup_manufacturer(mac: &str) -> Option<String> {
    let normalized = normalize_mac(mac)?;

    match oui_data::lookup(&normalized) {
        Some(record) => Some(record.organization().to_string()),
        None => {
            tracing::debug!("OUI lookup for {}: not found in database", mac);
            None
        }
    }
}

/// Normalize a MAC address to the format XX:XX:XX:XX:XX:XX
fn normalize_mac(mac: &str) -> Option<String> {
    let cleaned: String = mac.replace([':', '-', '.'], "").to_uppercase();

    if cleaned.len() < 6 || !cleaned.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let padded = if cleaned.len() < 12 {
        format!("{:0<12}", cleaned)
    } else {
        cleaned[..12].to_string()
    };

    Some(format!(
        "{}:{}:{}:{}:{}:{}",
        &padded[0..2],
        &padded[2..4],
        &padded[4..6],
        &padded[6..8],
        &padded[8..10],
        &padded[10..12]
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_accepts_common_separators() {
        assert_eq!(
            normalize_mac("08-00-27-4b-2c-11").as_deref(),
            Some("08:00:27:4B:2C:11")
        );
        assert_eq!(
            normalize_mac("0800.274b.2c11").as_deref(),
            Some("08:00:27:4B:2C:11")
        );
    }

    #[test]
    fn normalize_rejects_junk() {
        assert!(normalize_mac("Unknown").is_none());
        assert!(normalize_mac("08:00").is_none());
        assert!(normalize_mac("").is_none());
    }

    #[test]
    fn known_virtualization_prefix_resolves() {
        let org = lookup_manufacturer("00:50:56:12:34:56");
        assert!(org.is_some_and(|o| o.contains("VMware")));
    }
}
