// ── Wire-to-domain conversions ──
//
// Bridges the payload records of `gwctl_api` into canonical
// `gwctl_core::model` types and back. Rules read from a gateway are
// configured by definition; names and friendly labels are not on the wire
// and start out empty.

use gwctl_api::{AclInfoRecord, ObjectDescriptionRecord, RemotedAppRecord};
use tracing::warn;
use uuid::Uuid;

use crate::model::{
    AclInfo, AclStatus, RemotedApp, RuleInterface, RuleObjectDescription, RuleObjectPath,
};

// ── Helpers ────────────────────────────────────────────────────────

/// Decode a 16-byte app id. Anything else becomes the nil id, which the
/// engine treats as "no app id".
fn app_id_from_bytes(device_id: &str, bytes: &[u8]) -> Uuid {
    Uuid::from_slice(bytes).unwrap_or_else(|_| {
        warn!(device_id, len = bytes.len(), "remoted app id is not 16 bytes");
        Uuid::nil()
    })
}

// ── Object descriptions ────────────────────────────────────────────

impl From<ObjectDescriptionRecord> for RuleObjectDescription {
    fn from(record: ObjectDescriptionRecord) -> Self {
        let path = RuleObjectPath::new(record.object_path, "", record.is_prefix, false);
        let interfaces = record.interfaces.into_iter().map(RuleInterface::named).collect();
        RuleObjectDescription::configured(path, interfaces)
    }
}

impl From<&RuleObjectDescription> for ObjectDescriptionRecord {
    fn from(desc: &RuleObjectDescription) -> Self {
        ObjectDescriptionRecord::new(
            desc.path(),
            desc.object_path.is_prefix,
            desc.interface_names(),
        )
    }
}

pub fn rules_from_wire(records: Vec<ObjectDescriptionRecord>) -> Vec<RuleObjectDescription> {
    records.into_iter().map(Into::into).collect()
}

pub fn rules_to_wire(rules: &[RuleObjectDescription]) -> Vec<ObjectDescriptionRecord> {
    rules.iter().map(Into::into).collect()
}

// ── Remoted apps ───────────────────────────────────────────────────

impl From<RemotedAppRecord> for RemotedApp {
    fn from(record: RemotedAppRecord) -> Self {
        let app_id = app_id_from_bytes(&record.device_id, &record.app_id);
        RemotedApp::new(record.device_id, app_id, "", "", rules_from_wire(record.rules))
    }
}

impl From<&RemotedApp> for RemotedAppRecord {
    fn from(app: &RemotedApp) -> Self {
        RemotedAppRecord {
            device_id: app.device_id.clone(),
            app_id: app.app_id.as_bytes().to_vec(),
            rules: rules_to_wire(&app.rules),
        }
    }
}

pub fn apps_to_wire(apps: &[RemotedApp]) -> Vec<RemotedAppRecord> {
    apps.iter().map(Into::into).collect()
}

// ── ACL info ───────────────────────────────────────────────────────

/// A record without an id or object path cannot be addressed and is
/// rejected. An unknown status code is tolerated as `Inactive`.
impl TryFrom<AclInfoRecord> for AclInfo {
    type Error = gwctl_api::Error;

    fn try_from(record: AclInfoRecord) -> Result<Self, Self::Error> {
        if record.id.is_empty() {
            return Err(gwctl_api::Error::Malformed("ACL record has no id".into()));
        }
        if !record.object_path.starts_with('/') {
            return Err(gwctl_api::Error::Malformed(format!(
                "ACL {} has invalid object path '{}'",
                record.id, record.object_path
            )));
        }

        let status = AclStatus::from_repr(record.status).unwrap_or_else(|| {
            warn!(acl_id = %record.id, status = record.status, "unknown ACL status, assuming inactive");
            AclStatus::Inactive
        });
        Ok(AclInfo {
            id: record.id,
            name: record.name,
            status,
            object_path: record.object_path,
        })
    }
}
