// ── Live announcements ──
//
// What an application broadcasts about itself: identity fields from its
// about data and the object paths/interfaces it implements. Read-only
// input to a single reconciliation pass.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity fields of an announcing application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AboutData {
    pub device_id: String,
    /// `None` when the announcement carried no decodable app id.
    pub app_id: Option<Uuid>,
    pub app_name: String,
    pub device_name: String,
}

/// One announced object and the interfaces it implements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncedObject {
    pub path: String,
    pub interfaces: Vec<String>,
}

impl AnnouncedObject {
    pub fn new(path: impl Into<String>, interfaces: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            path: path.into(),
            interfaces: interfaces.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementData {
    pub port: u16,
    pub about: AboutData,
    pub objects: Vec<AnnouncedObject>,
}

impl AnnouncementData {
    pub fn new(port: u16, about: AboutData, objects: Vec<AnnouncedObject>) -> Self {
        Self {
            port,
            about,
            objects,
        }
    }

    /// The announced app id, if present and not nil.
    pub fn app_id(&self) -> Option<Uuid> {
        self.about.app_id.filter(|id| !id.is_nil())
    }
}
