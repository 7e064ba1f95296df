use serde::{Deserialize, Serialize};

use super::acl_rules::AclRuleSet;
use super::status::AclResponseCode;

/// Outcome of an ACL write: the gateway's code plus whatever the
/// controller refused to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclWriteResponse {
    pub acl_id: String,
    pub response_code: AclResponseCode,
    /// Rules (or the rejected interfaces of partially valid rules) that
    /// did not match the manifest.
    pub invalid_rules: AclRuleSet,
    pub object_path: String,
}
