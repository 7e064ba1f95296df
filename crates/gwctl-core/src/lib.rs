// gwctl-core: ACL reconciliation engine and gateway controller business logic.
//
// This crate sits between the bus seam (`gwctl-api`) and embedding
// applications. It owns the domain model, the reconciliation engine,
// the per-ACL orchestration and the controller context.

pub mod acl;
pub mod config;
pub mod connector;
pub mod controller;
pub mod convert;
pub mod error;
pub mod gateway;
pub mod metadata;
pub mod model;
pub mod reconcile;

// ── Primary re-exports ──────────────────────────────────────────────

pub use acl::Acl;
pub use config::ControllerConfig;
pub use connector::{ConnectorApp, SharedAcl};
pub use controller::{ControllerEvent, GatewayController};
pub use error::CoreError;
pub use gateway::Gateway;
pub use metadata::InternalMetadata;

// Re-export commonly used model types at the crate root.
pub use model::{
    AboutData, AclInfo, AclResponseCode, AclRuleSet, AclStatus, AclWriteResponse, AnnouncedObject,
    AnnouncementData, InterfaceSet, ManifestCapabilities, RemotedApp, RuleInterface,
    RuleObjectDescription, RuleObjectPath,
};
