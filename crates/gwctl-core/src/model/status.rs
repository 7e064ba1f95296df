// ── Status and response codes ──

use serde::{Deserialize, Serialize};
use strum::{Display, FromRepr};

/// Activation state of an ACL on its gateway.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, FromRepr, Serialize, Deserialize,
)]
#[repr(u16)]
pub enum AclStatus {
    #[default]
    Inactive = 0,
    Active = 1,
}

/// Application-level result of an ACL write.
///
/// `Invalid` doubles as the local sentinel handed back whenever a call
/// could not be completed at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromRepr, Serialize, Deserialize)]
#[repr(u16)]
pub enum AclResponseCode {
    Success = 0,
    Invalid = 1,
    RegisterError = 2,
    AclNotFound = 3,
    PersistenceError = 4,
    PolicyManagerError = 5,
    MetadataError = 6,
}

impl AclResponseCode {
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}
