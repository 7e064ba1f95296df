// ── Interface and method names ──
//
// Every remote operation the controller issues, and the bus interfaces
// they live on. Interface names are configurable so a controller can talk
// to gateways that publish the service under a different prefix.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

pub const DEFAULT_ACL_INTERFACE: &str = "org.alljoyn.gwagent.ctrl.Acl";
pub const DEFAULT_APP_INTERFACE: &str = "org.alljoyn.gwagent.ctrl.App";
pub const DEFAULT_APP_MGMT_INTERFACE: &str = "org.alljoyn.gwagent.ctrl.AppMgmt";
pub const DEFAULT_OBJECT_PATH_PREFIX: &str = "/gw";

/// Remote methods, named exactly as they appear on the bus.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, Serialize, Deserialize,
)]
pub enum Method {
    // ── ACL interface ───────────────────────────────────────────────
    ActivateAcl,
    DeactivateAcl,
    GetAcl,
    GetAclStatus,
    UpdateAcl,
    UpdateAclMetadata,
    UpdateCustomMetadata,

    // ── Connector app interface ─────────────────────────────────────
    ListAcls,
    CreateAcl,
    DeleteAcl,

    // ── App management interface ────────────────────────────────────
    GetInstalledApps,
}

impl Method {
    /// The interface a method is declared on.
    pub fn interface(self) -> Interface {
        match self {
            Self::ActivateAcl
            | Self::DeactivateAcl
            | Self::GetAcl
            | Self::GetAclStatus
            | Self::UpdateAcl
            | Self::UpdateAclMetadata
            | Self::UpdateCustomMetadata => Interface::Acl,
            Self::ListAcls | Self::CreateAcl | Self::DeleteAcl => Interface::App,
            Self::GetInstalledApps => Interface::AppMgmt,
        }
    }
}

/// Logical interfaces, resolved to bus names through [`ServiceNames`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Interface {
    Acl,
    App,
    AppMgmt,
}

/// Bus names of the gateway-management service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceNames {
    pub acl_interface: String,
    pub app_interface: String,
    pub app_mgmt_interface: String,
    /// Object path of the app-management object; connector apps live below it.
    pub object_path_prefix: String,
}

impl ServiceNames {
    pub fn interface_name(&self, interface: Interface) -> &str {
        match interface {
            Interface::Acl => &self.acl_interface,
            Interface::App => &self.app_interface,
            Interface::AppMgmt => &self.app_mgmt_interface,
        }
    }
}

impl Default for ServiceNames {
    fn default() -> Self {
        Self {
            acl_interface: DEFAULT_ACL_INTERFACE.into(),
            app_interface: DEFAULT_APP_INTERFACE.into(),
            app_mgmt_interface: DEFAULT_APP_MGMT_INTERFACE.into(),
            object_path_prefix: DEFAULT_OBJECT_PATH_PREFIX.into(),
        }
    }
}
