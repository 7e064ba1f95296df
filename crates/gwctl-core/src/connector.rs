// ── Connector apps ──
//
// A connector app installed on a gateway, and the registry of ACLs it
// owns. Each ACL sits behind its own async mutex so `retrieve`/`update`
// on one ACL never interleave.

use std::sync::Arc;

use dashmap::DashMap;
use gwctl_api::{Arg, BusTransport, InstalledAppRecord, Method, ProxyObject, Session};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::acl::{Acl, parse_response_code, prepare_write};
use crate::error::CoreError;
use crate::metadata::InternalMetadata;
use crate::model::{
    AclInfo, AclResponseCode, AclRuleSet, AclStatus, AclWriteResponse, ManifestCapabilities,
};

pub type SharedAcl = Arc<Mutex<Acl>>;

#[derive(Debug)]
pub struct ConnectorApp {
    gw_bus_name: String,
    app_id: String,
    friendly_name: String,
    object_path: String,
    app_version: String,
    acls: DashMap<String, SharedAcl>,
}

impl ConnectorApp {
    pub fn new(gw_bus_name: impl Into<String>, record: InstalledAppRecord) -> Self {
        Self {
            gw_bus_name: gw_bus_name.into(),
            app_id: record.app_id,
            friendly_name: record.friendly_name,
            object_path: record.object_path,
            app_version: record.app_version,
            acls: DashMap::new(),
        }
    }

    pub fn gw_bus_name(&self) -> &str {
        &self.gw_bus_name
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    pub fn object_path(&self) -> &str {
        &self.object_path
    }

    pub fn app_version(&self) -> &str {
        &self.app_version
    }

    pub fn acl(&self, acl_id: &str) -> Option<SharedAcl> {
        self.acls.get(acl_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Like [`acl`](Self::acl), failing with `AclNotFound`.
    pub fn require_acl(&self, acl_id: &str) -> Result<SharedAcl, CoreError> {
        self.acl(acl_id).ok_or_else(|| CoreError::AclNotFound {
            acl_id: acl_id.to_owned(),
        })
    }

    pub fn acl_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.acls.iter().map(|entry| entry.key().clone()).collect();
        ids.sort_unstable();
        ids
    }

    fn proxy<'s, T: BusTransport>(&'s self, session: &'s Session<'_, T>) -> ProxyObject<'s, T> {
        session.proxy(&self.gw_bus_name, &self.object_path)
    }

    /// List the app's ACLs and bring the registry in line with the list.
    ///
    /// ACLs still present keep their existing handle and cached state. A
    /// listing with an unaddressable record leaves the registry untouched.
    pub async fn retrieve_acls<T: BusTransport>(
        &self,
        session: &Session<'_, T>,
    ) -> Result<Vec<AclInfo>, CoreError> {
        let [infos] = self
            .proxy(session)
            .invoke::<1>(Method::ListAcls, Vec::new())
            .await?;
        let infos = infos
            .into_acl_infos()?
            .into_iter()
            .map(AclInfo::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CoreError::malformed(Method::ListAcls, e.to_string()))?;

        self.acls
            .retain(|id, _| infos.iter().any(|info| info.id == *id));
        for info in &infos {
            self.acls.entry(info.id.clone()).or_insert_with(|| {
                Arc::new(Mutex::new(Acl::new(self.gw_bus_name.as_str(), info.clone())))
            });
        }

        debug!(app_id = %self.app_id, acls = infos.len(), "retrieved ACL list");
        Ok(infos)
    }

    /// Validate `rules` and create a new ACL from the valid part.
    ///
    /// On success the ACL is registered, inactive, under the id the gateway
    /// assigned.
    pub async fn create_acl<T: BusTransport>(
        &self,
        session: &Session<'_, T>,
        name: &str,
        rules: AclRuleSet,
        capabilities: &ManifestCapabilities,
    ) -> Result<AclWriteResponse, CoreError> {
        let prepared = prepare_write(rules, capabilities, &InternalMetadata::new())?;
        let [code, acl_id, object_path] = self
            .proxy(session)
            .invoke::<3>(Method::CreateAcl, prepared.to_args(name))
            .await?;
        let code = parse_response_code(Method::CreateAcl, code)?;
        let acl_id = acl_id.into_string()?;
        let object_path = object_path.into_string()?;

        if code.is_success() {
            let info = AclInfo {
                id: acl_id.clone(),
                name: name.to_owned(),
                status: AclStatus::Inactive,
                object_path: object_path.clone(),
            };
            let acl = Acl::new(self.gw_bus_name.as_str(), info).with_internal_metadata(prepared.metadata);
            self.acls.insert(acl_id.clone(), Arc::new(Mutex::new(acl)));
            info!(app_id = %self.app_id, %acl_id, "ACL created");
        } else {
            warn!(app_id = %self.app_id, response = %code, "gateway rejected ACL creation");
        }

        Ok(AclWriteResponse {
            acl_id,
            response_code: code,
            invalid_rules: prepared.invalid,
            object_path,
        })
    }

    pub async fn delete_acl<T: BusTransport>(
        &self,
        session: &Session<'_, T>,
        acl_id: &str,
    ) -> Result<AclResponseCode, CoreError> {
        let [code] = self
            .proxy(session)
            .invoke::<1>(Method::DeleteAcl, vec![Arg::Str(acl_id.to_owned())])
            .await?;
        let code = parse_response_code(Method::DeleteAcl, code)?;

        if code.is_success() {
            self.acls.remove(acl_id);
            info!(app_id = %self.app_id, acl_id, "ACL deleted");
        } else {
            warn!(app_id = %self.app_id, acl_id, response = %code, "gateway refused ACL deletion");
        }
        Ok(code)
    }
}
