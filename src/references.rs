use serde::Serialize;
use tracing::warn;

use crate::document::{Document, Element};
use crate::location::Location;

/// Qualified name of the element declaring an outbound reference
pub const REFERENCE_TAG: &str = "edmx:Reference";

/// Attribute holding the referenced location
pub const URI_ATTRIBUTE: &str = "Uri";

/// An outbound reference together with an owned copy of its declaring element
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceEntry {
    pub uri: Option<Location>,
    pub element: Element,
}

/// A reference element that had no `Uri` attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedReference {
    /// Document the element was found in
    pub source: Location,
    /// 1-based position among the reference elements of that document
    pub ordinal: usize,
}

/// Extract every reference declared in `document`, in document order.
///
/// Duplicates are kept. Entries without a `Uri` are returned with `uri: None`.
pub fn extract_references(document: &Document) -> Vec<ReferenceEntry> {
    document
        .elements_by_name(REFERENCE_TAG)
        .enumerate()
        .map(|(index, element)| {
            let uri = element.attribute(URI_ATTRIBUTE).map(Location::from);
            if uri.is_none() {
                warn!(
                    ordinal = index + 1,
                    "{} element has no {} attribute", REFERENCE_TAG, URI_ATTRIBUTE
                );
            }
            ReferenceEntry {
                uri,
                element: element.clone(),
            }
        })
        .collect()
}
