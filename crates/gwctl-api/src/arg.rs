// ── Method arguments and replies ──
//
// `Arg` is the closed set of argument shapes the gateway protocol uses.
// Accessors consume the argument and fail with `Error::ArgType` when the
// shape is wrong, so reply decoding reads as a flat sequence of `?`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::method::Method;
use crate::payload::{AclInfoRecord, InstalledAppRecord, ObjectDescriptionRecord, RemotedAppRecord};

/// A single, already-unmarshaled method argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Arg {
    U16(u16),
    Str(String),
    ObjectPath(String),
    Dict(BTreeMap<String, String>),
    ObjectDescriptions(Vec<ObjectDescriptionRecord>),
    RemotedApps(Vec<RemotedAppRecord>),
    AclInfos(Vec<AclInfoRecord>),
    InstalledApps(Vec<InstalledAppRecord>),
}

impl Arg {
    /// Short name of the argument shape, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::U16(_) => "u16",
            Self::Str(_) => "string",
            Self::ObjectPath(_) => "object path",
            Self::Dict(_) => "dictionary",
            Self::ObjectDescriptions(_) => "object descriptions",
            Self::RemotedApps(_) => "remoted apps",
            Self::AclInfos(_) => "acl infos",
            Self::InstalledApps(_) => "installed apps",
        }
    }

    fn mismatch(&self, expected: &'static str) -> Error {
        Error::ArgType {
            expected,
            got: self.kind(),
        }
    }

    pub fn into_u16(self) -> Result<u16, Error> {
        match self {
            Self::U16(v) => Ok(v),
            other => Err(other.mismatch("u16")),
        }
    }

    /// Strings and object paths are interchangeable on the read side.
    pub fn into_string(self) -> Result<String, Error> {
        match self {
            Self::Str(s) | Self::ObjectPath(s) => Ok(s),
            other => Err(other.mismatch("string")),
        }
    }

    pub fn into_dict(self) -> Result<BTreeMap<String, String>, Error> {
        match self {
            Self::Dict(d) => Ok(d),
            other => Err(other.mismatch("dictionary")),
        }
    }

    pub fn into_object_descriptions(self) -> Result<Vec<ObjectDescriptionRecord>, Error> {
        match self {
            Self::ObjectDescriptions(v) => Ok(v),
            other => Err(other.mismatch("object descriptions")),
        }
    }

    pub fn into_remoted_apps(self) -> Result<Vec<RemotedAppRecord>, Error> {
        match self {
            Self::RemotedApps(v) => Ok(v),
            other => Err(other.mismatch("remoted apps")),
        }
    }

    pub fn into_acl_infos(self) -> Result<Vec<AclInfoRecord>, Error> {
        match self {
            Self::AclInfos(v) => Ok(v),
            other => Err(other.mismatch("acl infos")),
        }
    }

    pub fn into_installed_apps(self) -> Result<Vec<InstalledAppRecord>, Error> {
        match self {
            Self::InstalledApps(v) => Ok(v),
            other => Err(other.mismatch("installed apps")),
        }
    }
}

/// The ordered reply arguments of one method call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub args: Vec<Arg>,
}

impl Reply {
    pub fn new(args: Vec<Arg>) -> Self {
        Self { args }
    }

    /// Destructure the reply into exactly `N` arguments.
    ///
    /// A reply with any other arity is a contract violation by the gateway
    /// and fails the whole call.
    pub fn into_exact<const N: usize>(self, method: Method) -> Result<[Arg; N], Error> {
        <[Arg; N]>::try_from(self.args).map_err(|args| Error::UnexpectedArity {
            method,
            expected: N,
            got: args.len(),
        })
    }
}

impl From<Vec<Arg>> for Reply {
    fn from(args: Vec<Arg>) -> Self {
        Self::new(args)
    }
}
