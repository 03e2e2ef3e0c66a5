//! The asset record posted to the inventory API.
//!
//! A flat, camelCase wire object. The lifecycle and financial columns are
//! part of the inventory schema but are never observable from a network
//! sweep, so this pipeline always emits them empty for manual completion.

use crate::classify::Classification;
use crate::scanner::HostFingerprint;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub asset_id: String,
    pub group: String,
    pub asset_type: String,
    pub brand_model: String,
    pub serial_number: String,
    pub assigned_to: String,
    pub ip_address: String,
    pub mac_address: String,
    pub os_firmware: String,
    pub cpu: String,
    pub ram: String,
    pub storage: String,
    pub port_details: String,
    pub power_consumption: String,
    pub purchase_date: String,
    pub warranty_expiry: String,
    pub eol: String,
    pub maintenance_expiry: String,
    pub cost: String,
    pub depreciation: String,
    pub residual_value: String,
    pub status: String,
    pub condition: String,
    pub usage_purpose: String,
    pub access_level: String,
    pub license_key: String,
    pub compliance_status: String,
    pub documentation: String,
    pub remarks: String,
    pub last_audit_date: String,
    pub disposed_date: String,
    pub replacement_plan: String,
}

impl AssetRecord {
    /// Build the upload payload from a collected fingerprint, its
    /// classification, and the allocated asset ID.
    pub fn compose(
        fingerprint: &HostFingerprint,
        classification: &Classification,
        asset_id: String,
    ) -> Self {
        Self {
            asset_id,
            group: classification.group.to_string(),
            asset_type: classification.asset_type.to_string(),
            brand_model: format!("{} {}", fingerprint.manufacturer, fingerprint.model)
                .trim()
                .to_string(),
            serial_number: fingerprint.serial_number.clone(),
            assigned_to: fingerprint.logged_in_user.clone(),
            ip_address: fingerprint.ip.clone(),
            mac_address: fingerprint.mac.clone(),
            os_firmware: fingerprint.os.clone(),
            cpu: fingerprint.cpu.clone(),
            ram: fingerprint.ram.clone(),
            storage: fingerprint.storage.clone(),
            port_details: fingerprint.ports.join(", "),
            power_consumption: String::new(),
            purchase_date: String::new(),
            warranty_expiry: String::new(),
            eol: String::new(),
            maintenance_expiry: String::new(),
            cost: String::new(),
            depreciation: String::new(),
            residual_value: String::new(),
            status: String::new(),
            condition: String::new(),
            usage_purpose: String::new(),
            access_level: String::new(),
            license_key: String::new(),
            compliance_status: String::new(),
            documentation: String::new(),
            remarks: String::new(),
            last_audit_date: String::new(),
            disposed_date: String::new(),
            replacement_plan: String::new(),
        }
    }
}
