// ── Rule building blocks ──
//
// An ACL rule names an object path (exact or prefix) and the bus
// interfaces permitted on it. Interfaces are identified by name only:
// friendly name and the secured flag are display metadata.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

// ── RuleInterface ───────────────────────────────────────────────────

/// One bus interface. Equality, ordering and hashing use `name` alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleInterface {
    pub name: String,
    pub friendly_name: String,
    pub secured: bool,
}

impl RuleInterface {
    pub fn new(name: impl Into<String>, friendly_name: impl Into<String>, secured: bool) -> Self {
        Self {
            name: name.into(),
            friendly_name: friendly_name.into(),
            secured,
        }
    }

    /// An interface known only by name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, "", false)
    }

    /// Whether this entry carries display metadata the other one lacks.
    fn is_richer_than(&self, other: &Self) -> bool {
        !self.friendly_name.is_empty() && other.friendly_name.is_empty()
    }
}

impl PartialEq for RuleInterface {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for RuleInterface {}

impl PartialOrd for RuleInterface {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RuleInterface {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl Hash for RuleInterface {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl Borrow<str> for RuleInterface {
    fn borrow(&self) -> &str {
        &self.name
    }
}

/// Set of interfaces keyed by name.
pub type InterfaceSet = BTreeSet<RuleInterface>;

/// Union `incoming` into `target`.
///
/// On a name collision the entry already present is kept, unless the
/// incoming one carries a friendly name and the present one does not.
pub fn merge_interfaces(target: &mut InterfaceSet, incoming: impl IntoIterator<Item = RuleInterface>) {
    for iface in incoming {
        let replace = target
            .get(iface.name.as_str())
            .is_some_and(|present| iface.is_richer_than(present));
        if replace {
            target.replace(iface);
        } else {
            target.insert(iface);
        }
    }
}

// ── RuleObjectPath ──────────────────────────────────────────────────

/// An object-path pattern.
///
/// `is_prefix` makes the path cover itself and everything below it.
/// `prefix_allowed` only has meaning on manifest rules: it says whether a
/// matching client rule may declare itself a prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleObjectPath {
    pub path: String,
    pub friendly_name: String,
    pub is_prefix: bool,
    pub prefix_allowed: bool,
}

impl RuleObjectPath {
    pub fn new(
        path: impl Into<String>,
        friendly_name: impl Into<String>,
        is_prefix: bool,
        prefix_allowed: bool,
    ) -> Self {
        Self {
            path: path.into(),
            friendly_name: friendly_name.into(),
            is_prefix,
            prefix_allowed,
        }
    }

    /// An exact (non-prefix) path with no friendly name.
    pub fn exact(path: impl Into<String>) -> Self {
        Self::new(path, "", false, false)
    }

    /// A prefix path with no friendly name.
    pub fn prefix(path: impl Into<String>) -> Self {
        Self::new(path, "", true, false)
    }

    pub fn key(&self) -> PathKey {
        PathKey {
            path: self.path.clone(),
            is_prefix: self.is_prefix,
        }
    }

    /// Manifest ordering: lexicographic by path, and for equal paths the
    /// exact entry before the prefix entry.
    pub fn manifest_order(&self, other: &Self) -> Ordering {
        self.path
            .cmp(&other.path)
            .then(self.is_prefix.cmp(&other.is_prefix))
    }
}

/// Identity of an object path for keyed collections.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathKey {
    pub path: String,
    pub is_prefix: bool,
}

// ── RuleObjectDescription ───────────────────────────────────────────

/// An object path together with the interfaces granted on it.
///
/// `configured == false` marks a capability the manifest offers but no
/// stored rule exercises yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleObjectDescription {
    pub object_path: RuleObjectPath,
    pub interfaces: InterfaceSet,
    pub configured: bool,
}

impl RuleObjectDescription {
    pub fn new(object_path: RuleObjectPath, interfaces: InterfaceSet, configured: bool) -> Self {
        Self {
            object_path,
            interfaces,
            configured,
        }
    }

    pub fn configured(object_path: RuleObjectPath, interfaces: InterfaceSet) -> Self {
        Self::new(object_path, interfaces, true)
    }

    pub fn unconfigured(object_path: RuleObjectPath, interfaces: InterfaceSet) -> Self {
        Self::new(object_path, interfaces, false)
    }

    pub fn path(&self) -> &str {
        &self.object_path.path
    }

    pub fn interface_names(&self) -> impl Iterator<Item = &str> {
        self.interfaces.iter().map(|i| i.name.as_str())
    }
}
