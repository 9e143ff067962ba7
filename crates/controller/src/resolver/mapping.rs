//! Group/kind keys and concrete resource mappings.

use std::fmt;

/// API group plus kind, the version-independent identity of a resource type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKind {
    pub group: String,
    pub kind: String,
}

impl GroupKind {
    pub fn new(group: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            kind: kind.into(),
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            f.write_str(&self.kind)
        } else {
            write!(f, "{}.{}", self.kind, self.group)
        }
    }
}

/// One concrete resource able to serve a scale subresource for a group/kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleMapping {
    pub group: String,
    pub version: String,
    pub kind: String,
    /// Plural resource name, e.g. `deployments`.
    pub resource: String,
    pub namespaced: bool,
}

impl ScaleMapping {
    pub fn group_kind(&self) -> GroupKind {
        GroupKind::new(&self.group, &self.kind)
    }

    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// `resource.group`, or just `resource` for the core group.
    pub fn group_resource(&self) -> String {
        if self.group.is_empty() {
            self.resource.clone()
        } else {
            format!("{}.{}", self.resource, self.group)
        }
    }
}

/// Split an `apiVersion` into `(group, version)`.
///
/// `""` and `"/"` yield two empty strings, `"v1"` is the core group, and
/// `"apps/v1"` splits on the slash. More than one slash is an error.
pub fn parse_group_version(api_version: &str) -> Result<(String, String), &'static str> {
    if api_version.is_empty() || api_version == "/" {
        return Ok((String::new(), String::new()));
    }
    match api_version.matches('/').count() {
        0 => Ok((String::new(), api_version.to_string())),
        1 => {
            let (group, version) = api_version
                .split_once('/')
                .ok_or("unexpected GroupVersion string")?;
            Ok((group.to_string(), version.to_string()))
        }
        _ => Err("unexpected GroupVersion string"),
    }
}
