//! OS / model string classification into inventory groups.
//!
//! Pure, ordered substring rules: the first hit wins, and anything
//! unrecognized lands in the desktop default. The asset type doubles as
//! the ID allocator's partition key.

/// Inventory placement for one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub group: &'static str,
    pub asset_type: &'static str,
}

const WINDOWS: Classification = Classification {
    group: "Windows",
    asset_type: "PC",
};
const SERVER: Classification = Classification {
    group: "Servers & Infra",
    asset_type: "Server",
};
const MOBILE: Classification = Classification {
    group: "Mobile Device",
    asset_type: "Mobile Phones",
};

const SERVER_OS_HINTS: &[&str] = &["linux", "ubuntu", "debian", "centos", "rhel"];
const MOBILE_OS_HINTS: &[&str] = &["ios", "android"];
const VIRTUAL_MODEL_HINTS: &[&str] = &["vmware", "hyper-v"];

/// Map an OS string and a hardware model string to (group, asset type).
pub fn classify(os: &str, model: &str) -> Classification {
    let os = os.to_lowercase();
    let model = model.to_lowercase();

    if os.contains("windows") {
        return WINDOWS;
    }
    if SERVER_OS_HINTS.iter().any(|hint| os.contains(hint)) {
        return SERVER;
    }
    if MOBILE_OS_HINTS.iter().any(|hint| os.contains(hint)) {
        return MOBILE;
    }
    // A hypervisor model is a server even when OS detection came up empty
    if VIRTUAL_MODEL_HINTS.iter().any(|hint| model.contains(hint)) {
        return SERVER;
    }

    WINDOWS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ubuntu_is_a_server() {
        let class = classify("Ubuntu 22.04", "");
        assert_eq!(class.group, "Servers & Infra");
        assert_eq!(class.asset_type, "Server");
    }

    #[test]
    fn hypervisor_model_wins_without_os() {
        let class = classify("", "VMware Virtual Platform");
        assert_eq!(class.group, "Servers & Infra");
        assert_eq!(class.asset_type, "Server");
    }

    #[test]
    fn windows_desktop() {
        let class = classify("Windows 11 Pro", "");
        assert_eq!(class.group, "Windows");
        assert_eq!(class.asset_type, "PC");
    }

    #[test]
    fn windows_beats_model_hints() {
        let class = classify("Microsoft Windows Server 2022", "VMware Virtual Platform");
        assert_eq!(class, WINDOWS);
    }

    #[test]
    fn phones_by_os() {
        assert_eq!(classify("Apple iOS 17", "").asset_type, "Mobile Phones");
        assert_eq!(classify("Android 14", "").group, "Mobile Device");
    }

    #[test]
    fn unrecognized_defaults_to_pc() {
        let class = classify("Unknown", "Unknown");
        assert_eq!(class, WINDOWS);
    }
}
