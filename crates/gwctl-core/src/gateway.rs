// ── Gateways ──
//
// A gateway agent found on the bus and the connector apps installed on it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;
use gwctl_api::{BusTransport, Method, Session, SessionId};
use tracing::debug;

use crate::connector::ConnectorApp;
use crate::error::CoreError;

#[derive(Debug)]
pub struct Gateway {
    bus_name: String,
    device_name: String,
    app_name: String,
    /// Joined session id, 0 while none is joined.
    session_id: AtomicU32,
    apps: DashMap<String, Arc<ConnectorApp>>,
}

impl Gateway {
    pub fn new(
        bus_name: impl Into<String>,
        device_name: impl Into<String>,
        app_name: impl Into<String>,
    ) -> Self {
        Self {
            bus_name: bus_name.into(),
            device_name: device_name.into(),
            app_name: app_name.into(),
            session_id: AtomicU32::new(0),
            apps: DashMap::new(),
        }
    }

    pub fn bus_name(&self) -> &str {
        &self.bus_name
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// The session joined with this gateway, if any.
    pub fn session_id(&self) -> Option<SessionId> {
        match self.session_id.load(Ordering::Acquire) {
            0 => None,
            id => Some(id),
        }
    }

    pub(crate) fn set_session_id(&self, id: SessionId) {
        self.session_id.store(id, Ordering::Release);
    }

    pub fn connector_app(&self, app_id: &str) -> Option<Arc<ConnectorApp>> {
        self.apps.get(app_id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn require_connector_app(&self, app_id: &str) -> Result<Arc<ConnectorApp>, CoreError> {
        self.connector_app(app_id)
            .ok_or_else(|| CoreError::ConnectorAppNotFound {
                app_id: app_id.to_owned(),
            })
    }

    pub fn connector_apps(&self) -> Vec<Arc<ConnectorApp>> {
        let mut apps: Vec<_> = self.apps.iter().map(|entry| Arc::clone(entry.value())).collect();
        apps.sort_by(|a, b| a.app_id().cmp(b.app_id()));
        apps
    }

    /// List the installed connector apps and rebuild the registry.
    ///
    /// An app that is still installed at the same object path keeps its
    /// existing handle, and with it its ACL registry.
    pub async fn retrieve_connector_apps<T: BusTransport>(
        &self,
        session: &Session<'_, T>,
    ) -> Result<Vec<Arc<ConnectorApp>>, CoreError> {
        let names = session.names();
        let [apps] = session
            .proxy(&self.bus_name, &names.object_path_prefix)
            .invoke::<1>(Method::GetInstalledApps, Vec::new())
            .await?;
        let records = apps.into_installed_apps()?;

        let mut listed = Vec::with_capacity(records.len());
        for record in records {
            let keep = self
                .connector_app(&record.app_id)
                .filter(|app| app.object_path() == record.object_path);
            listed.push(
                keep.unwrap_or_else(|| Arc::new(ConnectorApp::new(self.bus_name.as_str(), record))),
            );
        }

        self.apps
            .retain(|app_id, _| listed.iter().any(|app| app.app_id() == app_id));
        for app in &listed {
            self.apps.insert(app.app_id().to_owned(), Arc::clone(app));
        }

        debug!(bus_name = %self.bus_name, apps = listed.len(), "retrieved connector apps");
        Ok(listed)
    }
}
