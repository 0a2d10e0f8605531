//! Detection of element names that differ from the schema vocabulary only in case.

use serde::{Deserialize, Serialize};

use crate::document::Document;

/// Qualified names every CSDL document is built from
pub const EXPECTED_TAGS: &[&str] = &[
    "edmx:Edmx",
    "edmx:Reference",
    "edmx:Include",
    "edmx:DataServices",
    "Schema",
    "EntityContainer",
];

/// Whether suspicious tags block loading or are only reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagCheckMode {
    #[default]
    Strict,
    Advisory,
}

/// Outcome of scanning a document's element names
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagReport {
    pub suspicious_tags: Vec<String>,
}

impl TagReport {
    pub fn is_ok(&self) -> bool {
        self.suspicious_tags.is_empty()
    }
}

/// Scan every element and collect names that look like an entry of
/// [`EXPECTED_TAGS`] without matching it exactly. First-seen order, no duplicates.
pub fn validate_tags(document: &Document) -> TagReport {
    let mut suspicious_tags: Vec<String> = Vec::new();

    for element in document.elements() {
        let name = element.name();
        let collides = EXPECTED_TAGS
            .iter()
            .any(|expected| *expected != name && resembles(expected, name));

        if collides && !suspicious_tags.iter().any(|seen| seen == name) {
            suspicious_tags.push(name.to_string());
        }
    }

    TagReport { suspicious_tags }
}

/// Equal ignoring ASCII case, or an unprefixed name that matches the local
/// part of a prefixed entry (`Reference` for `edmx:Reference`).
fn resembles(expected: &str, name: &str) -> bool {
    if expected.eq_ignore_ascii_case(name) {
        return true;
    }
    match expected.split_once(':') {
        Some((_, local)) => !name.contains(':') && local.eq_ignore_ascii_case(name),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Document {
        Document::parse(xml, "test").unwrap()
    }

    #[test]
    fn test_valid_document_has_no_suspicious_tags() {
        let document = parse(
            r#"<edmx:Edmx Version="4.0">
                 <edmx:Reference Uri="a.xml"><edmx:Include Namespace="A"/></edmx:Reference>
                 <edmx:DataServices><Schema Namespace="B"><EntityContainer Name="C"/></Schema></edmx:DataServices>
               </edmx:Edmx>"#,
        );

        let report = validate_tags(&document);
        assert!(report.is_ok());
    }

    #[test]
    fn test_wrong_case_reference_is_suspicious() {
        let document = parse(
            r#"<edmx:Edmx>
                 <edmx:Reference Uri="a.xml"/>
                 <reference Uri="b.xml"/>
               </edmx:Edmx>"#,
        );

        let report = validate_tags(&document);
        assert!(!report.is_ok());
        assert_eq!(report.suspicious_tags, vec!["reference"]);
    }

    #[test]
    fn test_lowercase_prefixed_names_are_suspicious() {
        let document = parse(r#"<edmx:edmx><edmx:dataservices/></edmx:edmx>"#);

        let report = validate_tags(&document);
        assert_eq!(report.suspicious_tags, vec!["edmx:edmx", "edmx:dataservices"]);
    }

    #[test]
    fn test_duplicates_are_reported_once_in_first_seen_order() {
        let document = parse(
            r#"<edmx:Edmx>
                 <SCHEMA/><edmx:include/><SCHEMA/><edmx:include/>
               </edmx:Edmx>"#,
        );

        let report = validate_tags(&document);
        assert_eq!(report.suspicious_tags, vec!["SCHEMA", "edmx:include"]);
    }

    #[test]
    fn test_miscased_prefix_and_missing_prefix_are_suspicious() {
        let document = parse(
            r#"<edmx:Edmx>
                 <edmx:Reference Uri="/ok.xml"/>
                 <Edmx:Reference Uri="/typo-prefix.xml"/>
                 <EDMX:Reference Uri="/typo-upper.xml"/>
                 <Reference Uri="/no-prefix.xml"/>
               </edmx:Edmx>"#,
        );

        let report = validate_tags(&document);
        assert!(!report.is_ok());
        assert_eq!(
            report.suspicious_tags,
            vec!["Edmx:Reference", "EDMX:Reference", "Reference"]
        );
    }

    #[test]
    fn test_unprefixed_schema_names_are_expected() {
        let document = parse(r#"<edmx:DataServices><Schema><EntityContainer/></Schema></edmx:DataServices>"#);

        assert!(validate_tags(&document).is_ok());
    }

    #[test]
    fn test_unrelated_names_are_ignored() {
        let document = parse(r#"<Root><EntityType Name="X"/><property/></Root>"#);

        assert!(validate_tags(&document).is_ok());
    }
}
