use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::rule::RuleObjectDescription;

/// A third-party application the connector app reaches on the gateway's behalf.
///
/// Identity is the `(device_id, app_id)` pair; names are display metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotedApp {
    pub device_id: String,
    pub app_id: Uuid,
    pub app_name: String,
    pub device_name: String,
    pub rules: Vec<RuleObjectDescription>,
}

impl RemotedApp {
    pub fn new(
        device_id: impl Into<String>,
        app_id: Uuid,
        app_name: impl Into<String>,
        device_name: impl Into<String>,
        rules: Vec<RuleObjectDescription>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            app_id,
            app_name: app_name.into(),
            device_name: device_name.into(),
            rules,
        }
    }

    /// A nil app id stands for "no usable id was received".
    pub fn has_app_id(&self) -> bool {
        !self.app_id.is_nil()
    }

    /// Exact identity match on device id and the 16 app-id bytes.
    pub fn is_same_app(&self, device_id: &str, app_id: &Uuid) -> bool {
        self.device_id == device_id && self.app_id.as_bytes() == app_id.as_bytes()
    }

    /// Same identity and names, different rules.
    pub fn with_rules(&self, rules: Vec<RuleObjectDescription>) -> Self {
        Self {
            device_id: self.device_id.clone(),
            app_id: self.app_id,
            app_name: self.app_name.clone(),
            device_name: self.device_name.clone(),
            rules,
        }
    }

    /// Split off the rules, leaving an identity-only app behind.
    pub fn take_rules(&mut self) -> Vec<RuleObjectDescription> {
        std::mem::take(&mut self.rules)
    }
}
