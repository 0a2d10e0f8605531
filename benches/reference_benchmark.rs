use divan::Bencher;
use schema_refcheck::{Document, extract_references, validate_tags};

fn main() {
    divan::main();
}

/// A `$metadata`-sized document with `count` reference elements
fn metadata(count: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<edmx:Edmx xmlns:edmx="http://docs.oasis-open.org/odata/ns/edmx" Version="4.0">
"#,
    );
    for i in 0..count {
        xml.push_str(&format!(
            r#"  <edmx:Reference Uri="http://redfish.dmtf.org/schemas/v1/Schema{i}_v1.xml">
    <edmx:Include Namespace="Schema{i}"/>
    <edmx:Include Namespace="Schema{i}.v1_0_0"/>
  </edmx:Reference>
"#
        ));
    }
    xml.push_str(
        r#"  <edmx:DataServices>
    <Schema xmlns="http://docs.oasis-open.org/odata/ns/edm" Namespace="Service">
      <EntityContainer Name="Service"/>
    </Schema>
  </edmx:DataServices>
</edmx:Edmx>"#,
    );
    xml
}

#[divan::bench(args = [10, 100, 1000])]
fn parse_document(bencher: Bencher, count: usize) {
    let xml = metadata(count);

    bencher.bench_local(move || Document::parse(&xml, "metadata").expect("Failed to parse"));
}

#[divan::bench(args = [10, 100, 1000])]
fn extract(bencher: Bencher, count: usize) {
    let document = Document::parse(&metadata(count), "metadata").unwrap();

    bencher.bench_local(move || extract_references(&document));
}

#[divan::bench(args = [10, 100, 1000])]
fn check_tags(bencher: Bencher, count: usize) {
    let document = Document::parse(&metadata(count), "metadata").unwrap();

    bencher.bench_local(move || validate_tags(&document));
}

#[divan::bench]
fn pretty_print_reference(bencher: Bencher) {
    let document = Document::parse(&metadata(1), "metadata").unwrap();
    let entry = extract_references(&document).remove(0);

    bencher.bench_local(move || entry.element.to_pretty_xml().unwrap());
}
