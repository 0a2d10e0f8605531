//! Alias table: local files standing in for remote schema locations.
//!
//! The alias file is a JSON object mapping a location to a local path. A key
//! containing exactly one `*` pairs with a glob pattern value; every file the
//! pattern matches becomes one alias, with the file name substituted for `*`:
//!
//! ```json
//! {
//!   "http://redfish.dmtf.org/schemas/v1/*": "./schemas/*.xml",
//!   "http://redfish.dmtf.org/schemas/v1/Resource_v1.xml": "./local/Resource_v1.xml"
//! }
//! ```

use globset::{GlobBuilder, GlobMatcher};
use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::location::Location;

const GLOB_CHARS: &[char] = &['*', '?', '[', '{'];

/// Mapping from location to local file, with wildcards already expanded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    entries: HashMap<Location, PathBuf>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, location: impl Into<Location>, path: impl Into<PathBuf>) {
        self.entries.insert(location.into(), path.into());
    }

    pub fn get(&self, location: &Location) -> Option<&Path> {
        self.entries.get(location).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read and expand an alias file
    pub async fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::AliasFileNotFound {
                path: path.to_path_buf(),
            },
            _ => ConfigError::Io(e),
        })?;

        let raw: BTreeMap<String, String> = serde_json::from_str(&content)?;
        Self::expand(raw).await
    }

    /// Expand raw alias entries; wildcard keys produce one alias per matching file
    pub async fn expand(raw: BTreeMap<String, String>) -> ConfigResult<Self> {
        let mut table = Self::new();

        for (key, value) in raw {
            match key.matches('*').count() {
                0 => table.insert(key, value),
                1 => {
                    let matches = glob_files(&value).await?;
                    if matches.is_empty() {
                        warn!(pattern = %value, "alias pattern matched no files");
                    }
                    for file in matches {
                        let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
                            continue;
                        };
                        let expanded = key.replacen('*', name, 1);
                        debug!(alias = %expanded, path = %file.display(), "expanded alias");
                        table.insert(expanded, file);
                    }
                }
                _ => {
                    return Err(ConfigError::InvalidAlias {
                        key,
                        reason: "wildcard keys may contain only one '*'".to_string(),
                    });
                }
            }
        }

        Ok(table)
    }
}

/// Files matching a glob pattern, sorted by path
pub async fn glob_files(pattern: &str) -> ConfigResult<Vec<PathBuf>> {
    let base = glob_base(pattern);
    let strip_current_dir = base == Path::new(".") && !pattern.starts_with("./");
    let matcher = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| ConfigError::InvalidGlob {
            pattern: pattern.to_string(),
            details: e.to_string(),
        })?
        .compile_matcher();

    let mut files = Vec::new();
    match fs::metadata(&base).await {
        Ok(metadata) if metadata.is_dir() => {
            collect_matches(&base, &matcher, strip_current_dir, &mut files).await?;
        }
        Ok(_) => {
            if matcher.is_match(&base) {
                files.push(base);
            }
        }
        Err(_) => return Ok(files),
    }

    files.sort();
    Ok(files)
}

/// Leading components of a pattern that contain no glob syntax
fn glob_base(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    for component in Path::new(pattern).components() {
        if let Component::Normal(part) = component
            && part.to_string_lossy().contains(GLOB_CHARS)
        {
            break;
        }
        base.push(component);
    }
    if base.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        base
    }
}

/// Recursive helper walking a directory and collecting matching files
fn collect_matches<'a>(
    dir: &'a Path,
    matcher: &'a GlobMatcher,
    strip_current_dir: bool,
    files: &'a mut Vec<PathBuf>,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = ConfigResult<()>> + Send + 'a>> {
    Box::pin(async move {
        let mut read_dir = fs::read_dir(dir).await?;

        while let Some(entry) = read_dir.next_entry().await? {
            let mut entry_path = entry.path();
            if strip_current_dir && let Ok(relative) = entry_path.strip_prefix(".") {
                entry_path = relative.to_path_buf();
            }
            let file_type = entry.file_type().await?;

            if file_type.is_dir() {
                collect_matches(&entry_path, matcher, strip_current_dir, files).await?;
            } else if file_type.is_file() && matcher.is_match(&entry_path) {
                files.push(entry_path);
            }
        }

        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, "<edmx:Edmx/>").unwrap();
        path
    }

    #[test]
    fn test_glob_base() {
        assert_eq!(glob_base("schemas/*.xml"), PathBuf::from("schemas"));
        assert_eq!(glob_base("/tmp/a/b/*.xml"), PathBuf::from("/tmp/a/b"));
        assert_eq!(glob_base("*.xml"), PathBuf::from("."));
        assert_eq!(glob_base("schemas/v1/Resource.xml"), PathBuf::from("schemas/v1/Resource.xml"));
    }

    #[tokio::test]
    async fn test_glob_files_matches_single_directory() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "Resource_v1.xml");
        touch(temp_dir.path(), "Chassis_v1.xml");
        touch(temp_dir.path(), "notes.txt");
        touch(temp_dir.path(), "nested/Deep_v1.xml");

        let pattern = format!("{}/*.xml", temp_dir.path().display());
        let files = glob_files(&pattern).await.unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Chassis_v1.xml", "Resource_v1.xml"]);
    }

    #[tokio::test]
    async fn test_expand_wildcard_alias() {
        let temp_dir = TempDir::new().unwrap();
        let resource = touch(temp_dir.path(), "Resource_v1.xml");
        touch(temp_dir.path(), "Chassis_v1.xml");

        let mut raw = BTreeMap::new();
        raw.insert(
            "http://redfish.dmtf.org/schemas/v1/*".to_string(),
            format!("{}/*.xml", temp_dir.path().display()),
        );

        let table = AliasTable::expand(raw).await.unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.get(&Location::from("http://redfish.dmtf.org/schemas/v1/Resource_v1.xml")),
            Some(resource.as_path())
        );
    }

    #[tokio::test]
    async fn test_plain_alias_is_kept_verbatim() {
        let mut raw = BTreeMap::new();
        raw.insert("http://baduri".to_string(), "none".to_string());

        let table = AliasTable::expand(raw).await.unwrap();
        assert_eq!(table.get(&Location::from("http://baduri")), Some(Path::new("none")));
    }

    #[tokio::test]
    async fn test_reject_multiple_wildcards() {
        let mut raw = BTreeMap::new();
        raw.insert("http://host/*/*".to_string(), "*.xml".to_string());

        match AliasTable::expand(raw).await.unwrap_err() {
            ConfigError::InvalidAlias { key, .. } => assert_eq!(key, "http://host/*/*"),
            other => panic!("Expected InvalidAlias, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_alias_file() {
        let temp_dir = TempDir::new().unwrap();
        let local = touch(temp_dir.path(), "Resource_v1.xml");
        let alias_path = temp_dir.path().join("alias.json");
        let content = serde_json::json!({
            "http://redfish.dmtf.org/schemas/v1/Resource_v1.xml": local.display().to_string()
        });
        std::fs::write(&alias_path, content.to_string()).unwrap();

        let table = AliasTable::load(&alias_path).await.unwrap();
        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn test_load_missing_alias_file() {
        let result = AliasTable::load(Path::new("/nonexistent/alias.json")).await;

        assert!(matches!(
            result.unwrap_err(),
            ConfigError::AliasFileNotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_load_malformed_alias_file() {
        let temp_dir = TempDir::new().unwrap();
        let alias_path = temp_dir.path().join("alias.json");
        std::fs::write(&alias_path, "{ not json").unwrap();

        let result = AliasTable::load(&alias_path).await;
        assert!(matches!(result.unwrap_err(), ConfigError::JsonParsing(_)));
    }
}
