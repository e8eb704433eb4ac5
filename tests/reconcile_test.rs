use biblio_harvester::pipeline::processing::conflation::verify_unique_dois;
use biblio_harvester::pipeline::processing::filter::PublisherFilter;
use biblio_harvester::{reconcile, reconcile_with_report, PipelineOptions, Source};
use serde_json::{json, Value};

fn openalex_work(short_id: &str, doi: Value) -> Value {
    json!({
        "id": format!("https://openalex.org/{}", short_id),
        "doi": doi,
        "title": format!("Work {}", short_id),
        "authorships": [{"author": {"display_name": "Maurice Blanchot"}}],
        "publication_year": 1955,
        "publication_date": "1955-01-01",
        "type": "article",
        "cited_by_count": 1,
        "concepts": []
    })
}

fn crossref_work(doi: &str) -> Value {
    json!({
        "DOI": doi,
        "title": [format!("Crossref {}", doi)],
        "author": [{"given": "Maurice", "family": "Blanchot"}],
        "publisher": "Gallimard",
        "type": "journal-article",
        "published-print": {"date-parts": [[1955, 3]]}
    })
}

fn hal_doc(docid: i64) -> Value {
    json!({
        "docid": docid,
        "title_s": [format!("Document {}", docid)],
        "authFullName_s": ["Jean Dupont"],
        "publicationDateY_i": 2010,
        "docType_s": "ART",
        "uri_s": format!("https://hal.science/hal-{:08}", docid)
    })
}

#[test]
fn test_empty_inputs_give_empty_output() {
    assert!(reconcile(vec![], vec![], vec![]).is_empty());
}

#[test]
fn test_doi_variants_merge_into_one_record() {
    let works = reconcile(
        vec![openalex_work("W1", json!("HTTPS://DOI.ORG/10.1/ABC "))],
        vec![crossref_work("10.1/abc")],
        vec![],
    );

    assert_eq!(works.len(), 1);
    assert_eq!(works[0].doi.as_deref(), Some("10.1/abc"));
    assert_eq!(works[0].source_db, "Crossref, OpenAlex");
    // OpenAlex is the most trusted source for the title
    assert_eq!(works[0].title.as_deref(), Some("Work W1"));
}

#[test]
fn test_priority_backfill_and_max_citations() {
    let mut openalex = openalex_work("W1", json!("10.1/x"));
    openalex["cited_by_count"] = json!(9);
    let mut crossref = crossref_work("10.1/x");
    crossref["publisher"] = json!("X");
    crossref["is-referenced-by-count"] = json!(5);

    let works = reconcile(vec![openalex], vec![crossref], vec![]);
    assert_eq!(works.len(), 1);
    assert_eq!(works[0].publisher.as_deref(), Some("X"));
    assert_eq!(works[0].citation_count, Some(9));
}

#[test]
fn test_subjects_union_and_longest_author_list() {
    let mut openalex = openalex_work("W1", json!("10.1/s"));
    openalex["concepts"] = json!([{"display_name": "A"}, {"display_name": "B"}]);
    let mut crossref = crossref_work("10.1/s");
    crossref["subject"] = json!(["B", "C"]);
    crossref["author"] = json!([
        {"given": "Maurice", "family": "Blanchot"},
        {"given": "Georges", "family": "Bataille"},
        {"given": "Emmanuel", "family": "Levinas"}
    ]);

    let works = reconcile(vec![openalex], vec![crossref], vec![]);
    assert_eq!(works[0].subjects, vec!["A", "B", "C"]);
    assert_eq!(works[0].authors.len(), 3);
    assert_eq!(works[0].authors[2].full_name, "Emmanuel Levinas");
}

#[test]
fn test_abstract_rebuilt_from_inverted_index() {
    let mut openalex = openalex_work("W1", Value::Null);
    openalex["abstract_inverted_index"] = json!({"a": [1], "quick": [0]});

    let works = reconcile(vec![openalex], vec![], vec![]);
    assert_eq!(works[0].abstract_text.as_deref(), Some("quick a"));
}

#[test]
fn test_records_without_doi_pass_through_in_order() {
    let works = reconcile(
        vec![
            openalex_work("W1", Value::Null),
            openalex_work("W2", json!("10.1/merged")),
            openalex_work("W3", Value::Null),
        ],
        vec![crossref_work("10.1/merged")],
        vec![hal_doc(7), hal_doc(3)],
    );

    assert_eq!(works.len(), 5);
    assert_eq!(works[0].doi.as_deref(), Some("10.1/merged"));

    let passthrough: Vec<_> = works[1..].iter().map(|w| w.title.clone().unwrap_or_default()).collect();
    assert_eq!(passthrough, vec!["Work W1", "Work W3", "Document 7", "Document 3"]);
    assert!(works[3..].iter().all(|w| w.source_db == Source::Hal.label()));
}

#[test]
fn test_intra_source_duplicates_collapse_before_merge() {
    let output = reconcile_with_report(
        vec![
            openalex_work("W1", json!("10.1/a")),
            openalex_work("W1", json!("10.1/a")),
            json!({"id": "not-an-openalex-id", "doi": "10.1/z"}),
        ],
        vec![crossref_work("10.1/a"), crossref_work("10.1/a"), crossref_work("10.1/b")],
        vec![hal_doc(1), hal_doc(1), json!({"title_s": ["no docid"]})],
        &PipelineOptions::default(),
    );

    let sources = &output.report.sources;
    assert_eq!(sources[0].duplicates_removed, 1);
    assert_eq!(sources[0].unparsable.len(), 1);
    assert_eq!(sources[1].duplicates_removed, 1);
    assert_eq!(sources[2].duplicates_removed, 1);
    assert_eq!(sources[2].unparsable.len(), 1);

    // 10.1/a merged, 10.1/b alone, one HAL document
    assert_eq!(output.works.len(), 3);
    assert_eq!(output.report.reconcile.merged_groups, 1);
    assert!(verify_unique_dois(&output.works).is_ok());
}

#[test]
fn test_publisher_filter_only_touches_crossref() {
    let options = PipelineOptions {
        publisher_filter: Some(PublisherFilter::default()),
        ..Default::default()
    };
    let mut kept = crossref_work("10.1/kept");
    kept["publisher"] = json!("Presses Universitaires");
    let mut dropped = crossref_work("10.1/dropped");
    dropped["publisher"] = json!("Acme Widgets");

    let output = reconcile_with_report(
        vec![openalex_work("W1", json!("10.1/oa"))],
        vec![kept, dropped],
        vec![hal_doc(1)],
        &options,
    );

    let dois: Vec<_> = output.works.iter().filter_map(|w| w.doi.as_deref()).collect();
    assert_eq!(dois, vec!["10.1/kept", "10.1/oa"]);
    assert_eq!(output.report.sources[1].filtered_out, 1);
    assert_eq!(output.works.len(), 3);
}

#[test]
fn test_output_serializes_absent_fields_as_null() {
    let works = reconcile(vec![], vec![], vec![hal_doc(5)]);
    let value = serde_json::to_value(&works[0]).unwrap();

    assert!(value["doi"].is_null());
    assert!(value["publisher"].is_null());
    assert!(value["citation_count"].is_null());
    assert_eq!(value["subjects"], json!([]));
    assert_eq!(value["year"], json!(2010));
    assert!(value.get("abstract").is_some());
}
