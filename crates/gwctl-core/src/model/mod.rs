// ── Domain model ──
//
// Canonical types for ACL rules, manifests, remoted apps and
// announcements. Everything the reconciliation engine reads or produces
// is defined here; wire records live in `gwctl-api`.

pub mod acl_info;
pub mod acl_rules;
pub mod announcement;
pub mod capabilities;
pub mod remoted_app;
pub mod rule;
pub mod status;
pub mod write_response;

// ── Re-exports ──────────────────────────────────────────────────────

pub use acl_info::AclInfo;
pub use acl_rules::AclRuleSet;
pub use announcement::{AboutData, AnnouncedObject, AnnouncementData};
pub use capabilities::ManifestCapabilities;
pub use remoted_app::RemotedApp;
pub use rule::{
    InterfaceSet, PathKey, RuleInterface, RuleObjectDescription, RuleObjectPath, merge_interfaces,
};
pub use status::{AclResponseCode, AclStatus};
pub use write_response::AclWriteResponse;
