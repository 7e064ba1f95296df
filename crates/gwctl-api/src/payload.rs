// ── Structured payload records ──
//
// Already-unmarshaled shapes of the compound arguments exchanged with a
// gateway. These mirror the wire layout one-to-one; `gwctl-core` converts
// them into domain types.

use serde::{Deserialize, Serialize};

/// One `(objectPath, isPrefix, interfaceNames[])` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDescriptionRecord {
    pub object_path: String,
    pub is_prefix: bool,
    pub interfaces: Vec<String>,
}

impl ObjectDescriptionRecord {
    pub fn new(
        object_path: impl Into<String>,
        is_prefix: bool,
        interfaces: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            object_path: object_path.into(),
            is_prefix,
            interfaces: interfaces.into_iter().map(Into::into).collect(),
        }
    }
}

/// One `(deviceId, appId[16], rules[])` entry.
///
/// `app_id` is kept as raw bytes: a gateway may send an empty or truncated
/// id, and deciding what to do with it is the caller's business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotedAppRecord {
    pub device_id: String,
    pub app_id: Vec<u8>,
    pub rules: Vec<ObjectDescriptionRecord>,
}

/// One `(aclId, aclName, aclStatus, objectPath)` entry of `ListAcls`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclInfoRecord {
    pub id: String,
    pub name: String,
    pub status: u16,
    pub object_path: String,
}

/// One `(appId, friendlyName, objectPath, appVersion)` entry of `GetInstalledApps`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledAppRecord {
    pub app_id: String,
    pub friendly_name: String,
    pub object_path: String,
    pub app_version: String,
}
