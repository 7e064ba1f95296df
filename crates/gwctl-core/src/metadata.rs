// ── Internal ACL metadata ──
//
// Private key/value cache stored alongside an ACL on the gateway. It keeps
// the display names of remoted apps, keyed `<deviceId>_<APPIDHEX><suffix>`,
// so names survive while an app is not announcing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::model::RemotedApp;

pub const APP_NAME_SUFFIX: &str = "_appName";
pub const DEVICE_NAME_SUFFIX: &str = "_deviceName";

/// Key prefix identifying one remoted app inside the metadata map.
pub fn key_prefix(device_id: &str, app_id: &Uuid) -> String {
    format!("{device_id}_{:X}", app_id.simple())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InternalMetadata(BTreeMap<String, String>);

impl InternalMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn app_name(&self, prefix: &str) -> Option<&str> {
        self.get(&format!("{prefix}{APP_NAME_SUFFIX}"))
    }

    pub fn device_name(&self, prefix: &str) -> Option<&str> {
        self.get(&format!("{prefix}{DEVICE_NAME_SUFFIX}"))
    }

    pub fn set_app_name(&mut self, prefix: &str, app_name: impl Into<String>) {
        self.0.insert(format!("{prefix}{APP_NAME_SUFFIX}"), app_name.into());
    }

    pub fn set_device_name(&mut self, prefix: &str, device_name: impl Into<String>) {
        self.0
            .insert(format!("{prefix}{DEVICE_NAME_SUFFIX}"), device_name.into());
    }

    /// Cached `(app_name, device_name)`, or `None` if either is missing or empty.
    pub fn display_names(&self, prefix: &str) -> Option<(&str, &str)> {
        let app_name = self.app_name(prefix).filter(|s| !s.is_empty())?;
        let device_name = self.device_name(prefix).filter(|s| !s.is_empty())?;
        Some((app_name, device_name))
    }

    /// Store the display names of an app being written to the gateway.
    pub fn remember(&mut self, app: &RemotedApp) {
        let prefix = key_prefix(&app.device_id, &app.app_id);
        self.set_app_name(&prefix, app.app_name.as_str());
        self.set_device_name(&prefix, app.device_name.as_str());
    }

    /// Bring the cached names for `prefix` in line with an announcement.
    ///
    /// Each name is compared (exact, case-sensitive) against the cached
    /// value, a missing entry counting as empty, and overwritten when it
    /// differs. Returns `true` if anything changed.
    pub fn metadata_updated(&mut self, prefix: &str, app_name: &str, device_name: &str) -> bool {
        let mut updated = false;

        if self.app_name(prefix).unwrap_or_default() != app_name {
            debug!(key = %prefix, app_name, "cached app name differs from announcement");
            self.set_app_name(prefix, app_name);
            updated = true;
        }

        if self.device_name(prefix).unwrap_or_default() != device_name {
            debug!(key = %prefix, device_name, "cached device name differs from announcement");
            self.set_device_name(prefix, device_name);
            updated = true;
        }

        updated
    }
}

impl From<BTreeMap<String, String>> for InternalMetadata {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const APP: &str = "6ba7b810-9dad-11d1-80b4-00c04fd430c8";

    fn app_id() -> Uuid {
        Uuid::parse_str(APP).unwrap()
    }

    #[test]
    fn key_prefix_is_device_and_upper_hex() {
        assert_eq!(
            key_prefix("dev1", &app_id()),
            "dev1_6BA7B8109DAD11D180B400C04FD430C8"
        );
    }

    #[test]
    fn display_names_require_both_entries() {
        let prefix = key_prefix("dev1", &app_id());
        let mut meta = InternalMetadata::new();
        meta.set_app_name(&prefix, "Lamp");
        assert_eq!(meta.display_names(&prefix), None);

        meta.set_device_name(&prefix, "");
        assert_eq!(meta.display_names(&prefix), None);

        meta.set_device_name(&prefix, "Kitchen");
        assert_eq!(meta.display_names(&prefix), Some(("Lamp", "Kitchen")));
    }

    #[test]
    fn only_the_changed_name_is_rewritten() {
        let prefix = key_prefix("dev1", &app_id());
        let mut meta = InternalMetadata::new();
        meta.set_app_name(&prefix, "Lamp");
        meta.set_device_name(&prefix, "Kitchen");

        assert!(meta.metadata_updated(&prefix, "Lamp", "Hallway"));
        assert_eq!(meta.app_name(&prefix), Some("Lamp"));
        assert_eq!(meta.device_name(&prefix), Some("Hallway"));
    }

    #[test]
    fn second_identical_announcement_is_not_an_update() {
        let prefix = key_prefix("dev1", &app_id());
        let mut meta = InternalMetadata::new();

        assert!(meta.metadata_updated(&prefix, "Lamp", "Kitchen"));
        assert!(!meta.metadata_updated(&prefix, "Lamp", "Kitchen"));
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let prefix = key_prefix("dev1", &app_id());
        let mut meta = InternalMetadata::new();
        meta.set_app_name(&prefix, "lamp");
        meta.set_device_name(&prefix, "Kitchen");

        assert!(meta.metadata_updated(&prefix, "Lamp", "Kitchen"));
        assert_eq!(meta.app_name(&prefix), Some("Lamp"));
    }

    #[test]
    fn remember_stores_both_names() {
        let mut meta = InternalMetadata::new();
        let app = RemotedApp::new("dev1", app_id(), "Lamp", "Kitchen", Vec::new());
        meta.remember(&app);
        assert_eq!(meta.len(), 2);
        let prefix = key_prefix("dev1", &app_id());
        assert_eq!(meta.display_names(&prefix), Some(("Lamp", "Kitchen")));
    }
}
