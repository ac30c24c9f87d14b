//! End-to-end import of exported appeal documents.
//!
//! Guarantees exercised here:
//! - An exported graph imports cleanly into an empty store and keeps its
//!   shape regardless of the id offset.
//! - Tracked references follow the id mapping, including onto records that
//!   already existed in the target.
//! - References to records missing from the document are reported, or
//!   rejected in strict mode.
//! - Malformed documents and missing dependencies leave the target as it was.
//! - Export, import and re-export reproduce the same document.

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use sjx_core::{
    diff_documents, same_reference_shape, Exchange, ExchangeConfig, ExchangeError,
};
use sjx_document::Document;
use sjx_import::{ImportError, DEFAULT_ID_OFFSET};
use sjx_schema::{EntityType, Record};
use sjx_store::MemoryStore;
use sjx_test_utils::{
    appeal_store, record, APPEAL_UUID, ATTORNEY_ID, HEARING_COORDINATOR_ID, JUDGE_ID,
};
use std::sync::Arc;

fn exchange(config: ExchangeConfig) -> Exchange {
    Exchange::appeals(config.with_seed(17)).unwrap()
}

fn exported(exchange: &Exchange) -> Document {
    let source = appeal_store();
    exchange.exporter(&source).export_by_uuid(APPEAL_UUID).unwrap()
}

fn target(exchange: &Exchange) -> MemoryStore {
    MemoryStore::with_schema(Arc::new(exchange.schema().clone()))
}

fn task<'a>(store: &'a MemoryStore, original_id: i64) -> &'a Record {
    let id = original_id + DEFAULT_ID_OFFSET;
    store
        .all("Task")
        .iter()
        .find(|r| r.id() == Some(id))
        .unwrap_or_else(|| panic!("task {id} not imported"))
}

/// Copy of `document` with the records of one type filtered
fn without(document: &Document, entity_type: &str, keep: impl Fn(&Record) -> bool) -> Document {
    let (metadata, mut records) = document.clone().into_parts();
    let kept: Vec<Record> = records
        .get(entity_type)
        .iter()
        .filter(|r| keep(r))
        .cloned()
        .collect();
    records.insert(EntityType::new(entity_type), kept);
    Document::new(metadata, records)
}

#[test]
fn imports_cleanly_into_empty_store() {
    let exchange = exchange(ExchangeConfig::new());
    let document = exported(&exchange);
    let mut store = target(&exchange);

    let report = exchange
        .importer()
        .import_document(&document, &mut store)
        .unwrap();

    assert!(report.is_clean(), "{:?}", report.warnings);
    assert_eq!(report.total_created(), document.records().total());
    assert_eq!(report.total_reused(), 0);
    assert!(report.skipped_types.is_empty());
    for (entity_type, rows) in document.records().iter() {
        assert_eq!(store.count(entity_type.as_str()), rows.len(), "{entity_type}");
    }

    // Every imported id sits above the offset
    for (entity_type, rows) in store.to_record_set().iter() {
        for row in rows {
            assert!(row.id().unwrap() > DEFAULT_ID_OFFSET, "{}", row.describe(entity_type));
        }
    }
}

#[test]
fn tracked_references_follow_the_mapping() {
    let exchange = exchange(ExchangeConfig::new());
    let document = exported(&exchange);
    let mut store = target(&exchange);
    let report = exchange
        .importer()
        .import_document(&document, &mut store)
        .unwrap();
    let mapping = &report.id_mapping;

    let attorney_task = task(&store, 106);
    assert_eq!(attorney_task.get_i64("assigned_by_id"), mapping.get("User", JUDGE_ID));
    assert_eq!(attorney_task.get_i64("assigned_to_id"), mapping.get("User", ATTORNEY_ID));
    assert_eq!(attorney_task.get_i64("appeal_id"), mapping.get("Appeal", 1));
    assert_eq!(attorney_task.get_i64("parent_id"), Some(105 + DEFAULT_ID_OFFSET));

    let schedule_task = task(&store, 104);
    assert_eq!(
        schedule_task.get_i64("assigned_by_id"),
        mapping.get("User", HEARING_COORDINATOR_ID)
    );
    assert_eq!(schedule_task.get_i64("assigned_to_id"), mapping.get("Organization", 23));

    let remand = &store.all("CavcRemand")[0];
    assert_eq!(remand.get_i64("source_appeal_id"), mapping.get("Appeal", 2));
    assert_eq!(remand.get("decision_issue_ids"), Some(&json!([1 + DEFAULT_ID_OFFSET])));

    let membership = &store.all("OrganizationsUser")[0];
    assert_eq!(membership.get_i64("user_id"), mapping.get("User", JUDGE_ID));
    assert_eq!(membership.get_i64("organization_id"), mapping.get("Organization", 22));
}

#[test]
fn shape_does_not_depend_on_offset() {
    let low = exchange(ExchangeConfig::new());
    let high = exchange(ExchangeConfig::new().with_id_offset(7_000_000_000));
    let document = exported(&low);

    let mut a = target(&low);
    let mut b = target(&high);
    low.importer().import_document(&document, &mut a).unwrap();
    high.importer().import_document(&document, &mut b).unwrap();

    assert!(same_reference_shape(
        &a.to_record_set(),
        &b.to_record_set(),
        low.schema()
    ));
    assert!(b.all("Appeal").iter().all(|r| r.id().unwrap() > 7_000_000_000));
}

#[test]
fn existing_user_is_reused() {
    let exchange = exchange(ExchangeConfig::new());
    let document = exported(&exchange);
    let judge_css_id = document
        .records()
        .find("User", JUDGE_ID)
        .and_then(|u| u.get_str("css_id"))
        .unwrap()
        .to_string();

    let mut store = target(&exchange);
    store
        .seed("User", [record(json!({"id": 500, "css_id": judge_css_id}))])
        .unwrap();

    let report = exchange
        .importer()
        .import_document(&document, &mut store)
        .unwrap();

    assert!(report.is_clean(), "{:?}", report.warnings);
    assert_eq!(report.reused_count("User"), 1);
    assert_eq!(report.created_count("User"), 4);
    assert_eq!(store.count("User"), 5);
    assert_eq!(report.id_mapping.get("User", JUDGE_ID), Some(500));
    assert_eq!(task(&store, 105).get_i64("assigned_to_id"), Some(500));
    assert_eq!(store.all("HearingDay")[0].get_i64("judge_id"), Some(500));
}

#[test]
fn reference_outside_document_is_reported() {
    let exchange = exchange(ExchangeConfig::new());
    let document = without(&exported(&exchange), "User", |u| u.id() != Some(ATTORNEY_ID));
    let mut store = target(&exchange);

    let report = exchange
        .importer()
        .import_document(&document, &mut store)
        .unwrap();

    assert_eq!(report.warnings.len(), 1, "{:?}", report.warnings);
    let warning = &report.warnings[0];
    assert_eq!(warning.entity_type.as_str(), "Task");
    assert_eq!(warning.original_id, 106);
    assert_eq!(warning.field, "assigned_to_id");
    assert_eq!(warning.value, ATTORNEY_ID);
    assert_eq!(task(&store, 106).get_i64("assigned_to_id"), Some(ATTORNEY_ID));
}

#[test]
fn strict_mode_rejects_reference_outside_document() {
    let exchange = exchange(ExchangeConfig::new().with_strict_references(true));
    let document = without(&exported(&exchange), "User", |u| u.id() != Some(ATTORNEY_ID));
    let mut store = target(&exchange);

    let err = store
        .transaction(|tx| exchange.importer().import_document(&document, tx))
        .unwrap_err();

    assert!(
        matches!(&err, ExchangeError::Import(ImportError::UnresolvedReference(r)) if r.field == "assigned_to_id"),
        "{err}"
    );
    assert!(store.is_empty());
}

#[test]
fn record_without_id_writes_nothing() {
    let exchange = exchange(ExchangeConfig::new());
    let json = exported(&exchange).to_json(false).unwrap();
    let mut value: Value = serde_json::from_str(&json).unwrap();
    value["Task"][0].as_object_mut().unwrap().remove("id");
    let broken = serde_json::to_string(&value).unwrap();

    let mut store = target(&exchange);
    let err = exchange.importer().import_json(&broken, &mut store).unwrap_err();

    assert!(err.is_malformed_document(), "{err}");
    assert!(store.is_empty());
}

#[test]
fn missing_dependency_rolls_back() {
    let exchange = exchange(ExchangeConfig::new());
    let document = exported(&exchange);
    let (metadata, mut records) = document.into_parts();
    let mut timer = records.get("TaskTimer")[0].clone();
    timer.set("task_id", 999);
    records.insert(EntityType::new("TaskTimer"), vec![timer]);
    let document = Document::new(metadata, records);

    let mut store = target(&exchange);
    let err = store
        .transaction(|tx| exchange.importer().import_document(&document, tx))
        .unwrap_err();

    assert!(err.is_missing_dependency(), "{err}");
    assert!(store.is_empty());
    assert!(store.callbacks_fired().is_empty());
}

#[test]
fn unregistered_types_are_skipped() {
    let exchange = exchange(ExchangeConfig::new());
    let (metadata, mut records) = exported(&exchange).into_parts();
    records.insert(
        EntityType::new("LegacyAppeal"),
        vec![record(json!({"id": 1, "vacols_id": "123"}))],
    );
    let document = Document::new(metadata, records);

    let mut store = target(&exchange);
    let report = exchange
        .importer()
        .import_document(&document, &mut store)
        .unwrap();

    assert_eq!(report.skipped_types, vec![EntityType::new("LegacyAppeal")]);
    assert_eq!(store.count("LegacyAppeal"), 0);
    assert_eq!(store.count("Appeal"), 2);
}

#[test]
fn reexport_of_import_matches_export() {
    let exchange = exchange(ExchangeConfig::new());
    let document = exported(&exchange);
    let mut store = target(&exchange);
    exchange
        .importer()
        .import_document(&document, &mut store)
        .unwrap();

    let admin = Exchange::appeals(ExchangeConfig::new().with_sanitize(false)).unwrap();
    let reexported = admin.exporter(&store).export_by_uuid(APPEAL_UUID).unwrap();

    let differences = diff_documents(&document, &reexported, exchange.expected_differences());
    assert!(
        differences.is_empty(),
        "{}",
        differences
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    );
}

#[test]
fn json_import_matches_document_import() {
    let exchange = exchange(ExchangeConfig::new());
    let document = exported(&exchange);
    let json = document.to_json(true).unwrap();

    let mut from_document = target(&exchange);
    let mut from_json = target(&exchange);
    exchange
        .importer()
        .import_document(&document, &mut from_document)
        .unwrap();
    let report = exchange.importer().import_json(&json, &mut from_json).unwrap();

    assert_eq!(report.total_created(), document.records().total());
    assert_eq!(from_document.to_record_set(), from_json.to_record_set());
}
