use std::path::{Path, PathBuf};
use std::sync::Arc;

use schema_refcheck::{
    AliasTable, DocumentFetcher, DocumentLoader, LoaderConfig, RootContext, TraversalConfig,
    TraversalEngine,
};

/// Minimal CSDL document declaring the given references
pub fn schema_xml(references: &[&str]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<edmx:Edmx xmlns:edmx="http://docs.oasis-open.org/odata/ns/edmx" Version="4.0">
"#,
    );
    for uri in references {
        xml.push_str(&format!(
            "  <edmx:Reference Uri=\"{}\">\n    <edmx:Include Namespace=\"{}\"/>\n  </edmx:Reference>\n",
            uri,
            namespace_of(uri)
        ));
    }
    xml.push_str(
        r#"  <edmx:DataServices>
    <Schema xmlns="http://docs.oasis-open.org/odata/ns/edm" Namespace="Service"/>
  </edmx:DataServices>
</edmx:Edmx>
"#,
    );
    xml
}

fn namespace_of(uri: &str) -> String {
    uri.rsplit('/')
        .next()
        .unwrap_or(uri)
        .trim_end_matches(".xml")
        .to_string()
}

/// Write a schema document into `dir`
pub fn write_schema(dir: &Path, name: &str, references: &[&str]) -> PathBuf {
    write_file(dir, name, &schema_xml(references))
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

/// Directory of the checked-in schema fixtures
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Engine over a fetcher with explicit aliases and loader settings
pub fn build_engine(
    fetcher: Arc<dyn DocumentFetcher>,
    root: RootContext,
    aliases: AliasTable,
    config: LoaderConfig,
) -> TraversalEngine {
    let loader = DocumentLoader::new(Arc::new(aliases), root, fetcher, config);
    TraversalEngine::new(
        Arc::new(loader),
        TraversalConfig {
            max_concurrent_fetches: 4,
        },
    )
}

/// Engine rooted at a URL with no aliases and default loader settings
pub fn url_engine(fetcher: Arc<dyn DocumentFetcher>, root: &str) -> TraversalEngine {
    build_engine(
        fetcher,
        RootContext::from_url(root),
        AliasTable::new(),
        LoaderConfig::default(),
    )
}
