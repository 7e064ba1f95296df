use serde::{Deserialize, Serialize};

use super::status::AclStatus;

/// Summary of one ACL as listed by its connector app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclInfo {
    pub id: String,
    pub name: String,
    pub status: AclStatus,
    pub object_path: String,
}
