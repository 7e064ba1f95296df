use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::remoted_app::RemotedApp;
use super::rule::RuleObjectDescription;

/// The working rule set attached to one ACL.
///
/// Owns every contained description and app; a fresh set is built on each
/// retrieve and each update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclRuleSet {
    pub exposed_services: Vec<RuleObjectDescription>,
    pub remoted_apps: Vec<RemotedApp>,
    pub metadata: BTreeMap<String, String>,
}

impl AclRuleSet {
    pub fn new(exposed_services: Vec<RuleObjectDescription>, remoted_apps: Vec<RemotedApp>) -> Self {
        Self {
            exposed_services,
            remoted_apps,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.exposed_services.is_empty() && self.remoted_apps.is_empty()
    }
}
