//! MAC-vendor lookup collaborator.

use std::sync::OnceLock;

use mac_oui::Oui;
use pnet::util::MacAddr;

use lanscope_common::network::host::DeviceType;

static OUI_DB: OnceLock<Oui> = OnceLock::new();

/// Retrieves or initializes the **Organizationally unique identifier**
/// database.
fn get_oui_db() -> &'static Oui {
    OUI_DB.get_or_init(|| Oui::default().expect("failed to load OUI database"))
}

/// Pluggable vendor lookup. Misses and stale data are expected and
/// non-fatal; callers treat `None` as "no evidence".
pub trait VendorLookup: Send + Sync {
    fn vendor(&self, mac: MacAddr) -> Option<String>;
}

/// Lookup backed by the bundled IEEE OUI registry.
pub struct MacOuiRepo;

impl VendorLookup for MacOuiRepo {
    fn vendor(&self, mac: MacAddr) -> Option<String> {
        let db = get_oui_db();
        let mac_str = mac.to_string();
        match db.lookup_by_mac(&mac_str) {
            Ok(Some(entry)) => Some(entry.company_name.clone()),
            _ => None,
        }
    }
}

/// Vendors whose OUI ranges are dominated by handheld devices.
const MOBILE_VENDORS: &[&str] = &["apple", "samsung", "xiaomi", "oneplus", "oppo", "vivo"];

/// A coarse classification hint from the vendor name alone. The topology
/// analyzer treats this as the weakest evidence tier.
pub fn vendor_device_hint(vendor: &str) -> Option<DeviceType> {
    let lower = vendor.to_lowercase();
    MOBILE_VENDORS
        .iter()
        .any(|v| lower.contains(v))
        .then_some(DeviceType::Mobile)
}
