use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::alias::AliasTable;
use crate::cache::DocumentCache;
use crate::document::Document;
use crate::error::{LoadError, LoadResult};
use crate::http_client::{DocumentFetcher, FetchedDocument};
use crate::location::{Location, RootContext};
use crate::tags::{TagCheckMode, validate_tags};

/// Loader behaviour that is not part of the transport
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    /// Suspicious tags fail the load (`Strict`) or are only reported
    pub tag_mode: TagCheckMode,
    /// Continue with network resolution when an alias target is missing
    pub alias_fallback: bool,
    /// Maximum number of parsed remote documents kept in memory
    pub cache_capacity: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            tag_mode: TagCheckMode::Strict,
            alias_fallback: false,
            cache_capacity: 1000,
        }
    }
}

/// How a document was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    Alias(PathBuf),
    Remote(String),
    File(PathBuf),
}

/// A successfully loaded document with advisory diagnostics
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub document: Arc<Document>,
    pub source: DocumentSource,
    /// Tags reported in advisory mode; always empty in strict mode
    pub suspicious_tags: Vec<String>,
}

/// Resolves locations to parsed, tag-checked documents
pub struct DocumentLoader {
    aliases: Arc<AliasTable>,
    root: RootContext,
    fetcher: Arc<dyn DocumentFetcher>,
    cache: DocumentCache,
    config: LoaderConfig,
}

impl DocumentLoader {
    pub fn new(
        aliases: Arc<AliasTable>,
        root: RootContext,
        fetcher: Arc<dyn DocumentFetcher>,
        config: LoaderConfig,
    ) -> Self {
        Self {
            aliases,
            root,
            cache: DocumentCache::new(config.cache_capacity),
            fetcher,
            config,
        }
    }

    pub fn root(&self) -> &RootContext {
        &self.root
    }

    /// Load the root document: a local file in file mode, otherwise a normal location
    pub async fn load_root(&self) -> LoadResult<LoadedDocument> {
        if self.root.file_mode {
            let path = Path::new(self.root.root_location.as_str());
            let document = read_local(path).await.map_err(|e| match e {
                LoadError::AliasTargetMissing { path, .. } => LoadError::AliasRead {
                    path,
                    details: "file does not exist".to_string(),
                },
                other => other,
            })?;
            return self.finish(
                self.root.root_location.as_str(),
                Arc::new(document),
                DocumentSource::File(path.to_path_buf()),
            );
        }

        let location = self.root.root_location.clone();
        self.load(&location).await
    }

    /// Resolve and load one location.
    ///
    /// Precedence: alias table, then absolute fetch, then host-relative fetch.
    /// A relative location without a root host fails without any network call.
    pub async fn load(&self, location: &Location) -> LoadResult<LoadedDocument> {
        if let Some(path) = self.aliases.get(location) {
            match read_local(path).await {
                Ok(document) => {
                    return self.finish(
                        location.as_str(),
                        Arc::new(document),
                        DocumentSource::Alias(path.to_path_buf()),
                    );
                }
                Err(LoadError::AliasTargetMissing { .. }) if self.config.alias_fallback => {
                    warn!(%location, path = %path.display(), "alias target missing, falling back to network");
                }
                Err(LoadError::AliasTargetMissing { path, .. }) => {
                    return Err(LoadError::AliasTargetMissing {
                        location: location.to_string(),
                        path,
                    });
                }
                Err(error) => return Err(error),
            }
        }

        let url = self.resolve_remote(location)?;
        let fetcher = Arc::clone(&self.fetcher);
        let target = url.clone();
        let document = self
            .cache
            .get_or_load(&url, || async move {
                let fetched = fetcher.fetch(&target).await?;
                check_response(fetched)
            })
            .await?;

        self.finish(location.as_str(), document, DocumentSource::Remote(url))
    }

    /// URL to GET for a location that is not served from the alias table
    pub fn resolve_remote(&self, location: &Location) -> LoadResult<String> {
        if location.is_absolute() {
            return Ok(location.to_string());
        }
        self.root
            .host_relative(location)
            .ok_or_else(|| LoadError::UnresolvableInFileMode {
                location: location.to_string(),
            })
    }

    fn finish(
        &self,
        location: &str,
        document: Arc<Document>,
        source: DocumentSource,
    ) -> LoadResult<LoadedDocument> {
        let report = validate_tags(&document);
        if report.is_ok() {
            return Ok(LoadedDocument {
                document,
                source,
                suspicious_tags: Vec::new(),
            });
        }

        match self.config.tag_mode {
            TagCheckMode::Strict => Err(LoadError::SuspiciousTags {
                location: location.to_string(),
                tags: report.suspicious_tags,
            }),
            TagCheckMode::Advisory => {
                warn!(location, tags = ?report.suspicious_tags, "suspicious tags");
                Ok(LoadedDocument {
                    document,
                    source,
                    suspicious_tags: report.suspicious_tags,
                })
            }
        }
    }
}

async fn read_local(path: &Path) -> LoadResult<Document> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LoadError::AliasTargetMissing {
                location: String::new(),
                path: path.to_path_buf(),
            },
            _ => LoadError::AliasRead {
                path: path.to_path_buf(),
                details: e.to_string(),
            },
        })?;

    debug!(path = %path.display(), "read local document");
    Document::parse(&content, &path.display().to_string())
}

/// Apply the success criteria for a fetched schema document
pub fn check_response(fetched: FetchedDocument) -> LoadResult<Document> {
    if !matches!(fetched.status, 200 | 204) {
        return Err(LoadError::Fetch {
            url: fetched.url,
            status: Some(fetched.status),
            cause: "unexpected status".to_string(),
        });
    }

    let content_type = fetched.content_type.unwrap_or_default();
    if !content_type.contains("xml") {
        return Err(LoadError::ContentTypeMismatch {
            url: fetched.url,
            status: fetched.status,
            content_type,
        });
    }

    if fetched.body.trim().is_empty() {
        return Err(LoadError::EmptyBody {
            url: fetched.url,
            status: fetched.status,
        });
    }

    Document::parse(&fetched.body, &fetched.url)
}
