// ── ACL orchestrator ──
//
// One access control list of one connector app. Owns the ACL's cached
// state (status, internal metadata, last retrieved rules, last write
// response) and drives the gateway calls around the reconciliation
// engine. Callers serialize access per ACL; `ConnectorApp` hands each one
// out behind a `tokio::sync::Mutex`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use gwctl_api::{Arg, BusTransport, Method, ProxyObject, Session};
use tracing::{debug, debug_span, info, warn};

use crate::convert::{apps_to_wire, rules_from_wire, rules_to_wire};
use crate::error::CoreError;
use crate::metadata::InternalMetadata;
use crate::model::{
    AclInfo, AclResponseCode, AclRuleSet, AclStatus, AclWriteResponse, AnnouncementData,
    ManifestCapabilities, RemotedApp,
};
use crate::reconcile::{
    convert_exposed_services, convert_remoted_apps, extract_remoted_apps,
    validate_against_capabilities,
};

// ── Write preparation ───────────────────────────────────────────────

/// A rule set split into what will be sent and what was refused.
#[derive(Debug, Clone)]
pub(crate) struct PreparedWrite {
    pub valid: AclRuleSet,
    pub invalid: AclRuleSet,
    /// Internal metadata to send, with the names of every sent app.
    pub metadata: InternalMetadata,
}

impl PreparedWrite {
    /// `(name, exposedServices, remotedApps, internalMetadata, customMetadata)`.
    pub fn to_args(&self, name: &str) -> Vec<Arg> {
        vec![
            Arg::Str(name.to_owned()),
            Arg::ObjectDescriptions(rules_to_wire(&self.valid.exposed_services)),
            Arg::RemotedApps(apps_to_wire(&self.valid.remoted_apps)),
            Arg::Dict(self.metadata.as_map().clone()),
            Arg::Dict(self.valid.metadata.clone()),
        ]
    }
}

/// Validate `rules` against the manifest for transmission.
///
/// Exposed services and each remoted app's rules are validated
/// independently. An app is sent only if some of its rules survive;
/// refused rules are reported under the app they came from.
pub(crate) fn prepare_write(
    rules: AclRuleSet,
    capabilities: &ManifestCapabilities,
    metadata: &InternalMetadata,
) -> Result<PreparedWrite, CoreError> {
    let AclRuleSet {
        exposed_services,
        remoted_apps,
        metadata: custom,
    } = rules;

    let exposed = validate_against_capabilities(exposed_services, &capabilities.exposed_services);

    let mut metadata = metadata.clone();
    let mut valid_apps = Vec::new();
    let mut invalid_apps = Vec::new();

    for mut app in remoted_apps {
        if !app.has_app_id() {
            return Err(CoreError::OperationFailed {
                message: format!("remoted app on device {} has no app id", app.device_id),
            });
        }

        let checked = validate_against_capabilities(app.take_rules(), &capabilities.remoted_services);
        if !checked.invalid.is_empty() {
            invalid_apps.push(app.with_rules(checked.invalid));
        }
        if checked.valid.is_empty() {
            debug!(device_id = %app.device_id, app_id = %app.app_id, "no valid rules left for remoted app");
            continue;
        }

        metadata.remember(&app);
        valid_apps.push(RemotedApp {
            rules: checked.valid,
            ..app
        });
    }

    Ok(PreparedWrite {
        valid: AclRuleSet::new(exposed.valid, valid_apps).with_metadata(custom),
        invalid: AclRuleSet::new(exposed.invalid, invalid_apps),
        metadata,
    })
}

pub(crate) fn parse_response_code(method: Method, arg: Arg) -> Result<AclResponseCode, CoreError> {
    let raw = arg.into_u16()?;
    AclResponseCode::from_repr(raw)
        .ok_or_else(|| CoreError::malformed(method, format!("unknown response code {raw}")))
}

// ── Acl ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Acl {
    id: String,
    name: String,
    object_path: String,
    gw_bus_name: String,
    status: AclStatus,
    internal_metadata: InternalMetadata,
    last_write_response: Option<AclWriteResponse>,
    cached_rules: Option<AclRuleSet>,
    last_retrieved: Option<DateTime<Utc>>,
}

impl Acl {
    pub fn new(gw_bus_name: impl Into<String>, info: AclInfo) -> Self {
        Self {
            id: info.id,
            name: info.name,
            object_path: info.object_path,
            gw_bus_name: gw_bus_name.into(),
            status: info.status,
            internal_metadata: InternalMetadata::new(),
            last_write_response: None,
            cached_rules: None,
            last_retrieved: None,
        }
    }

    pub(crate) fn with_internal_metadata(mut self, metadata: InternalMetadata) -> Self {
        self.internal_metadata = metadata;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn object_path(&self) -> &str {
        &self.object_path
    }

    pub fn gw_bus_name(&self) -> &str {
        &self.gw_bus_name
    }

    pub fn status(&self) -> AclStatus {
        self.status
    }

    pub fn internal_metadata(&self) -> &InternalMetadata {
        &self.internal_metadata
    }

    /// Response of the last `update`, cleared when the next one starts.
    pub fn last_write_response(&self) -> Option<&AclWriteResponse> {
        self.last_write_response.as_ref()
    }

    /// Rules produced by the last successful `retrieve`.
    pub fn cached_rules(&self) -> Option<&AclRuleSet> {
        self.cached_rules.as_ref()
    }

    pub fn last_retrieved(&self) -> Option<DateTime<Utc>> {
        self.last_retrieved
    }

    /// Drop cached rules and the last write response.
    pub fn release(&mut self) {
        self.cached_rules = None;
        self.last_write_response = None;
    }

    fn proxy<'s, T: BusTransport>(&'s self, session: &'s Session<'_, T>) -> ProxyObject<'s, T> {
        session.proxy(&self.gw_bus_name, &self.object_path)
    }

    async fn call_for_code<T: BusTransport>(
        &self,
        session: &Session<'_, T>,
        method: Method,
        args: Vec<Arg>,
    ) -> Result<AclResponseCode, CoreError> {
        let [code] = self.proxy(session).invoke::<1>(method, args).await?;
        parse_response_code(method, code)
    }

    // ── Status ──────────────────────────────────────────────────────

    pub async fn activate<T: BusTransport>(
        &mut self,
        session: &Session<'_, T>,
    ) -> Result<AclResponseCode, CoreError> {
        self.set_status(session, Method::ActivateAcl, AclStatus::Active)
            .await
    }

    pub async fn deactivate<T: BusTransport>(
        &mut self,
        session: &Session<'_, T>,
    ) -> Result<AclResponseCode, CoreError> {
        self.set_status(session, Method::DeactivateAcl, AclStatus::Inactive)
            .await
    }

    async fn set_status<T: BusTransport>(
        &mut self,
        session: &Session<'_, T>,
        method: Method,
        target: AclStatus,
    ) -> Result<AclResponseCode, CoreError> {
        let code = self.call_for_code(session, method, Vec::new()).await?;
        if code.is_success() {
            self.status = target;
            info!(acl_id = %self.id, status = %target, "ACL status changed");
        } else {
            warn!(acl_id = %self.id, %method, response = %code, "gateway refused status change");
        }
        Ok(code)
    }

    /// Re-read the activation state from the gateway.
    pub async fn retrieve_status<T: BusTransport>(
        &mut self,
        session: &Session<'_, T>,
    ) -> Result<AclStatus, CoreError> {
        let [status] = self
            .proxy(session)
            .invoke::<1>(Method::GetAclStatus, Vec::new())
            .await?;
        let raw = status.into_u16()?;
        let status = AclStatus::from_repr(raw).ok_or_else(|| {
            CoreError::malformed(Method::GetAclStatus, format!("unknown ACL status {raw}"))
        })?;
        self.status = status;
        Ok(status)
    }

    // ── Metadata ────────────────────────────────────────────────────

    pub async fn update_custom_metadata<T: BusTransport>(
        &self,
        session: &Session<'_, T>,
        metadata: &BTreeMap<String, String>,
    ) -> Result<AclResponseCode, CoreError> {
        self.call_for_code(
            session,
            Method::UpdateCustomMetadata,
            vec![Arg::Dict(metadata.clone())],
        )
        .await
    }

    pub async fn update_acl_metadata<T: BusTransport>(
        &self,
        session: &Session<'_, T>,
        metadata: &BTreeMap<String, String>,
    ) -> Result<AclResponseCode, CoreError> {
        self.call_for_code(
            session,
            Method::UpdateAclMetadata,
            vec![Arg::Dict(metadata.clone())],
        )
        .await
    }

    // ── Rules ───────────────────────────────────────────────────────

    /// Fetch the ACL and reconcile it with the manifest and the apps
    /// currently announcing.
    ///
    /// Refreshes status, name and internal metadata on the way. When
    /// announcements changed a cached display name, the metadata is pushed
    /// back to the gateway; a failure there is only logged.
    pub async fn retrieve<T: BusTransport>(
        &mut self,
        session: &Session<'_, T>,
        capabilities: &ManifestCapabilities,
        announcements: &[AnnouncementData],
    ) -> Result<AclRuleSet, CoreError> {
        self.cached_rules = None;
        self.retrieve_status(session).await?;

        let [name, exposed, remoted, internal, custom] = self
            .proxy(session)
            .invoke::<5>(Method::GetAcl, Vec::new())
            .await?;
        let name = name.into_string()?;
        let exposed = rules_from_wire(exposed.into_object_descriptions()?);
        let stored_apps: Vec<RemotedApp> = remoted
            .into_remoted_apps()?
            .into_iter()
            .map(Into::into)
            .collect();
        let mut metadata = InternalMetadata::from(internal.into_dict()?);
        let custom = custom.into_dict()?;

        let span = debug_span!("reconcile", acl_id = %self.id);
        let (exposed_services, outcome) = span.in_scope(|| {
            let manifest = capabilities.sorted();
            let exposed_services = convert_exposed_services(&exposed, &manifest.exposed_services);
            let configurable = extract_remoted_apps(&manifest.remoted_services, announcements);
            let outcome = convert_remoted_apps(
                stored_apps,
                &manifest.remoted_services,
                configurable,
                &mut metadata,
            );
            (exposed_services, outcome)
        });

        self.name = name;
        self.internal_metadata = metadata;

        if outcome.metadata_updated && !self.internal_metadata.is_empty() {
            match self
                .update_acl_metadata(session, self.internal_metadata.as_map())
                .await
            {
                Ok(code) if code.is_success() => {
                    debug!(acl_id = %self.id, "pushed refreshed internal metadata");
                }
                Ok(code) => {
                    warn!(acl_id = %self.id, response = %code, "gateway rejected internal metadata");
                }
                Err(e) => {
                    warn!(acl_id = %self.id, error = %e, "failed to push internal metadata");
                }
            }
        }

        let rules = AclRuleSet::new(exposed_services, outcome.apps).with_metadata(custom);
        info!(
            acl_id = %self.id,
            exposed = rules.exposed_services.len(),
            remoted_apps = rules.remoted_apps.len(),
            "ACL retrieved"
        );
        self.cached_rules = Some(rules.clone());
        self.last_retrieved = Some(Utc::now());
        Ok(rules)
    }

    /// Validate `rules` against the manifest and write the valid part.
    ///
    /// The response lists every refused rule. Internal metadata is only
    /// committed locally when the gateway accepts the write.
    pub async fn update<T: BusTransport>(
        &mut self,
        session: &Session<'_, T>,
        rules: AclRuleSet,
        capabilities: &ManifestCapabilities,
    ) -> Result<AclWriteResponse, CoreError> {
        self.last_write_response = None;

        let prepared = prepare_write(rules, capabilities, &self.internal_metadata)?;
        let args = prepared.to_args(&self.name);
        let [code] = self.proxy(session).invoke::<1>(Method::UpdateAcl, args).await?;
        let code = parse_response_code(Method::UpdateAcl, code)?;

        if code.is_success() {
            info!(acl_id = %self.id, "ACL updated");
            self.internal_metadata = prepared.metadata;
        } else {
            warn!(acl_id = %self.id, response = %code, "gateway rejected ACL update");
        }

        let response = AclWriteResponse {
            acl_id: self.id.clone(),
            response_code: code,
            invalid_rules: prepared.invalid,
            object_path: self.object_path.clone(),
        };
        self.last_write_response = Some(response.clone());
        Ok(response)
    }
}
