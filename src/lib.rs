//! # schema-refcheck Library
//!
//! Follows `edmx:Reference` links from a root OData CSDL document (a Redfish
//! `$metadata` service document or a local file) and reports every referenced
//! schema that cannot be resolved.
//!
//! Locations resolve through a local alias table first, then an absolute
//! fetch, then a fetch relative to the root host. Traversal is breadth-first
//! with bounded concurrent fetches per round; each location is attempted once.

pub mod alias;
pub mod cache;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod http_client;
pub mod loader;
pub mod location;
pub mod output;
pub mod references;
pub mod tags;
pub mod traversal;

pub use alias::AliasTable;
pub use cache::DocumentCache;
pub use cli::{Cli, OutputFormat, VerbosityLevel};
pub use config::{Config, ConfigManager, EnvProvider, SystemEnvProvider};
pub use document::{Document, Element, Node};
pub use error::{CheckerError, ConfigError, LoadError};
pub use http_client::{AsyncHttpClient, DocumentFetcher, FetchedDocument, HttpClientConfig};
pub use loader::{DocumentLoader, DocumentSource, LoadedDocument, LoaderConfig, check_response};
pub use location::{Location, RootContext};
pub use output::{Reporter, exit_code, exit_code_for_error, write_reference_dump};
pub use references::{MalformedReference, ReferenceEntry, extract_references};
pub use tags::{TagCheckMode, TagReport, validate_tags};
pub use traversal::{
    LocationOutcome, MissingReference, ProgressCallback, SuspiciousTags, TraversalConfig,
    TraversalEngine, TraversalPhase, TraversalProgress, TraversalResult,
};
