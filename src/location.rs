use std::fmt;

use reqwest::Url;
use serde::{Deserialize, Serialize};

/// A reference identifier exactly as declared in a document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(String);

impl Location {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Absolute locations carry their own HTTP scheme
    pub fn is_absolute(&self) -> bool {
        self.0.starts_with("http://") || self.0.starts_with("https://")
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Location {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Location {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Location {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Where the traversal starts and how relative references are resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootContext {
    pub root_location: Location,
    pub root_host: Option<String>,
    pub file_mode: bool,
}

impl RootContext {
    /// Root given as a URL; relative references resolve against its host
    pub fn from_url(root: impl Into<String>) -> Self {
        let root_location = Location::new(root);
        let root_host = root_host(root_location.as_str());
        Self {
            root_location,
            root_host,
            file_mode: false,
        }
    }

    /// Root given as a local file; there is no host to resolve against
    pub fn from_file(path: impl Into<String>) -> Self {
        Self {
            root_location: Location::new(path),
            root_host: None,
            file_mode: true,
        }
    }

    /// Target URL for a location that is neither aliased nor absolute
    pub fn host_relative(&self, location: &Location) -> Option<String> {
        self.root_host
            .as_ref()
            .map(|host| format!("{}{}", host, location.as_str()))
    }
}

/// Scheme and authority of an HTTP(S) URL, without a trailing slash
pub fn root_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_detection() {
        assert!(Location::from("http://redfish.dmtf.org/schemas/v1/Resource_v1.xml").is_absolute());
        assert!(Location::from("https://example.com/a.xml").is_absolute());
        assert!(!Location::from("/redfish/v1/Schemas/Resource_v1.xml").is_absolute());
        assert!(!Location::from("Resource_v1.xml").is_absolute());
    }

    #[test]
    fn test_location_equality_is_case_sensitive() {
        assert_ne!(Location::from("/a/B.xml"), Location::from("/a/b.xml"));
    }

    #[test]
    fn test_root_host_from_metadata_url() {
        assert_eq!(
            root_host("http://192.168.1.10/redfish/v1/$metadata"),
            Some("http://192.168.1.10".to_string())
        );
        assert_eq!(
            root_host("https://bmc.example.com:8443/redfish/v1/$metadata"),
            Some("https://bmc.example.com:8443".to_string())
        );
    }

    #[test]
    fn test_root_host_rejects_non_http() {
        assert_eq!(root_host("/local/path/metadata.xml"), None);
        assert_eq!(root_host("file:///tmp/metadata.xml"), None);
    }

    #[test]
    fn test_host_relative_resolution() {
        let context = RootContext::from_url("http://localhost:8000/redfish/v1/$metadata");
        let target = context.host_relative(&Location::from("/redfish/v1/Schemas/Chassis_v1.xml"));

        assert_eq!(
            target.as_deref(),
            Some("http://localhost:8000/redfish/v1/Schemas/Chassis_v1.xml")
        );
    }

    #[test]
    fn test_file_mode_has_no_host() {
        let context = RootContext::from_file("tests/metadata.xml");

        assert!(context.file_mode);
        assert_eq!(context.host_relative(&Location::from("/redfish/v1/X.xml")), None);
    }
}
