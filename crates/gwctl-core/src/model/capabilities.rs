use serde::{Deserialize, Serialize};

use super::rule::RuleObjectDescription;

/// The declared maximum rule set of one connector app version.
///
/// Supplied by the manifest reader; the engine only ever reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestCapabilities {
    /// What the connector app may expose to its clients.
    pub exposed_services: Vec<RuleObjectDescription>,
    /// What the connector app may reach on remoted applications.
    pub remoted_services: Vec<RuleObjectDescription>,
}

impl ManifestCapabilities {
    pub fn new(
        exposed_services: Vec<RuleObjectDescription>,
        remoted_services: Vec<RuleObjectDescription>,
    ) -> Self {
        Self {
            exposed_services,
            remoted_services,
        }
    }

    /// Copy of the capabilities with both lists in manifest order.
    pub fn sorted(&self) -> Self {
        let mut exposed_services = self.exposed_services.clone();
        let mut remoted_services = self.remoted_services.clone();
        exposed_services.sort_by(|a, b| a.object_path.manifest_order(&b.object_path));
        remoted_services.sort_by(|a, b| a.object_path.manifest_order(&b.object_path));
        Self {
            exposed_services,
            remoted_services,
        }
    }
}
