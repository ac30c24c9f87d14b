//! Testing utilities for SJX workspace
//!
//! Fixture stores holding appeal graphs with fixed ids.

#![allow(missing_docs)]

use serde_json::{json, Value};
use sjx_schema::Record;
use sjx_store::MemoryStore;

/// Appeal the standard fixture is exported from
pub const APPEAL_UUID: &str = "3f2c7e3a-9d41-4c5b-8e6f-0a1b2c3d4e5f";
/// Appeal the standard appeal was remanded from by the CAVC
pub const SOURCE_APPEAL_UUID: &str = "7b8e1f20-5c3d-4a6e-9f01-2b3c4d5e6f70";
/// Appeal of another veteran, never part of the standard export
pub const UNRELATED_APPEAL_UUID: &str = "c0ffee00-1234-4abc-8def-001122334455";

pub const FILE_NUMBER: &str = "123456789";
/// Shared by the veteran and their person record
pub const SHARED_SSN: &str = "123-45-6789";
pub const VETERAN_PARTICIPANT_ID: &str = "600001";
pub const CLAIMANT_PARTICIPANT_ID: &str = "600002";

pub const JUDGE_CSS_ID: &str = "BVAJUDGE";
pub const ATTORNEY_CSS_ID: &str = "BVAATTY";

pub const APPEAL_ID: i64 = 1;
pub const SOURCE_APPEAL_ID: i64 = 2;
pub const JUDGE_ID: i64 = 13;
pub const ATTORNEY_ID: i64 = 14;
pub const HEARING_COORDINATOR_ID: i64 = 15;

pub fn record(value: Value) -> Record {
    Record::from_value(value).unwrap()
}

fn seed(store: &mut MemoryStore, entity_type: &str, rows: Vec<Value>) {
    store
        .seed(entity_type, rows.into_iter().map(record))
        .unwrap();
}

fn user(id: i64, css_id: &str, full_name: &str) -> Value {
    json!({
        "id": id,
        "css_id": css_id,
        "full_name": full_name,
        "email": format!("{}@va.gov", css_id.to_lowercase()),
        "display_name": format!("{css_id} (VACO)"),
        "station_id": "101",
        "status": "active",
    })
}

fn task(id: i64, appeal_id: i64, kind: &str, assigned_to: (&str, i64), parent_id: Option<i64>) -> Value {
    json!({
        "id": id,
        "type": kind,
        "appeal_id": appeal_id,
        "appeal_type": "Appeal",
        "assigned_to_id": assigned_to.1,
        "assigned_to_type": assigned_to.0,
        "assigned_by_id": null,
        "cancelled_by_id": null,
        "parent_id": parent_id,
        "status": "assigned",
        "instructions": [],
    })
}

/// Source store with one fully populated appeal graph
///
/// Appeal 1 was remanded from appeal 2 by the CAVC; both belong to the same
/// veteran. Appeal 3 belongs to another veteran and shares nothing with them.
#[must_use]
pub fn appeal_store() -> MemoryStore {
    let mut store = MemoryStore::new();

    seed(&mut store, "Appeal", vec![
        json!({"id": APPEAL_ID, "uuid": APPEAL_UUID, "veteran_file_number": FILE_NUMBER,
               "docket_type": "direct_review", "stream_type": "court_remand",
               "stream_docket_number": "240101-1"}),
        json!({"id": SOURCE_APPEAL_ID, "uuid": SOURCE_APPEAL_UUID, "veteran_file_number": FILE_NUMBER,
               "docket_type": "direct_review", "stream_type": "original",
               "stream_docket_number": "200101-1"}),
        json!({"id": 3, "uuid": UNRELATED_APPEAL_UUID, "veteran_file_number": "987654321",
               "docket_type": "evidence_submission", "stream_type": "original",
               "stream_docket_number": "230505-7"}),
    ]);

    seed(&mut store, "Veteran", vec![
        json!({"id": 1, "file_number": FILE_NUMBER, "ssn": SHARED_SSN, "first_name": "Robert",
               "middle_name": "Q", "last_name": "Smith", "participant_id": VETERAN_PARTICIPANT_ID}),
        json!({"id": 2, "file_number": "987654321", "ssn": "222-33-4444", "first_name": "Alice",
               "middle_name": "B", "last_name": "Jones", "participant_id": "600099"}),
    ]);

    seed(&mut store, "AppealIntake", vec![
        json!({"id": 1, "detail_id": APPEAL_ID, "detail_type": "Appeal", "user_id": 12,
               "veteran_file_number": FILE_NUMBER, "completion_status": "success"}),
    ]);

    seed(&mut store, "Claimant", vec![
        json!({"id": 1, "decision_review_id": APPEAL_ID, "decision_review_type": "Appeal",
               "participant_id": CLAIMANT_PARTICIPANT_ID, "type": "DependentClaimant"}),
        json!({"id": 2, "decision_review_id": SOURCE_APPEAL_ID, "decision_review_type": "Appeal",
               "participant_id": VETERAN_PARTICIPANT_ID, "type": "VeteranClaimant"}),
    ]);

    seed(&mut store, "Person", vec![
        json!({"id": 1, "participant_id": VETERAN_PARTICIPANT_ID, "ssn": SHARED_SSN,
               "first_name": "Robert", "middle_name": "Q", "last_name": "Smith",
               "date_of_birth": "1960-05-01", "email_address": "robert.smith@example.com"}),
        json!({"id": 2, "participant_id": CLAIMANT_PARTICIPANT_ID, "ssn": "987-65-4321",
               "first_name": "Mary", "middle_name": null, "last_name": "Smith",
               "date_of_birth": "1962-11-23", "email_address": "mary.smith@example.com"}),
        json!({"id": 3, "participant_id": "600099", "ssn": "222-33-4444",
               "first_name": "Alice", "middle_name": "B", "last_name": "Jones",
               "date_of_birth": "1970-01-01", "email_address": null}),
    ]);

    seed(&mut store, "User", vec![
        user(11, "CAVCLIT", "Carla Litigation"),
        user(12, "INTAKEUSR", "Ian Intake"),
        user(JUDGE_ID, JUDGE_CSS_ID, "Judith Judge"),
        user(ATTORNEY_ID, ATTORNEY_CSS_ID, "Arthur Attorney"),
        user(HEARING_COORDINATOR_ID, "HEARCOORD", "Hannah Coordinator"),
        user(99, "VSOREP", "Victor Rep"),
    ]);

    seed(&mut store, "Organization", vec![
        json!({"id": 21, "type": "Bva", "name": "Board of Veterans' Appeals", "url": "bva"}),
        json!({"id": 22, "type": "JudgeTeam", "name": "Judge Team 13", "url": "judge-team-13"}),
        json!({"id": 23, "type": "HearingsManagement", "name": "Hearings Management",
               "url": "hearings-management"}),
        json!({"id": 24, "type": "Vso", "name": "Some VSO", "url": "some-vso"}),
    ]);

    seed(&mut store, "OrganizationsUser", vec![
        json!({"id": 31, "organization_id": 22, "user_id": JUDGE_ID, "admin": true}),
        json!({"id": 32, "organization_id": 23, "user_id": HEARING_COORDINATOR_ID, "admin": false}),
        json!({"id": 33, "organization_id": 24, "user_id": 99, "admin": false}),
    ]);

    let mut schedule = task(104, APPEAL_ID, "ScheduleHearingTask", ("Organization", 23), Some(103));
    schedule["assigned_by_id"] = json!(HEARING_COORDINATOR_ID);
    let mut judge = task(105, APPEAL_ID, "JudgeAssignTask", ("User", JUDGE_ID), Some(101));
    judge["assigned_by_id"] = json!(HEARING_COORDINATOR_ID);
    let mut attorney = task(106, APPEAL_ID, "AttorneyTask", ("User", ATTORNEY_ID), Some(105));
    attorney["assigned_by_id"] = json!(JUDGE_ID);
    attorney["instructions"] = json!(["Draft a decision granting the knee claim"]);
    let mut source_root = task(201, SOURCE_APPEAL_ID, "RootTask", ("Organization", 21), None);
    source_root["status"] = json!("completed");

    seed(&mut store, "Task", vec![
        task(101, APPEAL_ID, "RootTask", ("Organization", 21), None),
        task(102, APPEAL_ID, "DistributionTask", ("Organization", 21), Some(101)),
        task(103, APPEAL_ID, "HearingTask", ("Organization", 21), Some(102)),
        schedule,
        judge,
        attorney,
        source_root,
        task(301, 3, "RootTask", ("Organization", 21), None),
    ]);

    seed(&mut store, "TaskTimer", vec![
        json!({"id": 1, "task_id": 104, "submitted_at": "2024-03-01T12:00:00Z"}),
    ]);

    seed(&mut store, "DecisionIssue", vec![
        json!({"id": 1, "decision_review_id": SOURCE_APPEAL_ID, "decision_review_type": "Appeal",
               "disposition": "denied", "description": "Service connection for knee condition",
               "decision_text": "Service connection for the left knee is denied",
               "participant_id": VETERAN_PARTICIPANT_ID, "benefit_type": "compensation"}),
    ]);

    seed(&mut store, "RequestIssue", vec![
        json!({"id": 1, "decision_review_id": SOURCE_APPEAL_ID, "decision_review_type": "Appeal",
               "notes": "Veteran reports chronic pain", "contested_issue_description": "Left knee",
               "nonrating_issue_description": "Knee pain since service",
               "contested_decision_issue_id": null, "vacols_sequence_id": 3,
               "benefit_type": "compensation"}),
        json!({"id": 2, "decision_review_id": APPEAL_ID, "decision_review_type": "Appeal",
               "notes": null, "contested_issue_description": "Left knee remand",
               "contested_decision_issue_id": 1, "benefit_type": "compensation"}),
    ]);

    seed(&mut store, "RequestDecisionIssue", vec![
        json!({"id": 1, "request_issue_id": 1, "decision_issue_id": 1}),
    ]);

    seed(&mut store, "CavcRemand", vec![
        json!({"id": 1, "source_appeal_id": SOURCE_APPEAL_ID, "remand_appeal_id": APPEAL_ID,
               "created_by_id": 11, "updated_by_id": 11, "decision_issue_ids": [1],
               "cavc_docket_number": "21-1234", "cavc_judge_full_name": "Clerk",
               "instructions": "Remanded for a new examination"}),
    ]);

    seed(&mut store, "HearingDay", vec![
        json!({"id": 41, "created_by_id": HEARING_COORDINATOR_ID,
               "updated_by_id": HEARING_COORDINATOR_ID, "judge_id": JUDGE_ID,
               "bva_poc": "Pat Point", "notes": "Room 3", "request_type": "V",
               "scheduled_for": "2024-03-01"}),
    ]);

    seed(&mut store, "Hearing", vec![
        json!({"id": 51, "appeal_id": APPEAL_ID, "hearing_day_id": 41,
               "created_by_id": HEARING_COORDINATOR_ID, "updated_by_id": HEARING_COORDINATOR_ID,
               "judge_id": JUDGE_ID, "bva_poc": "Pat Point", "military_service": "Army 1980-1984",
               "notes": "Veteran testified", "representative_name": "Victor Rep",
               "summary": "Testimony about knee", "witness": "Mary Smith",
               "disposition": "held"}),
    ]);

    seed(&mut store, "VirtualHearing", vec![
        json!({"id": 61, "hearing_id": 51, "hearing_type": "Hearing",
               "created_by_id": HEARING_COORDINATOR_ID, "updated_by_id": HEARING_COORDINATOR_ID,
               "alias": "BVA0000123", "alias_with_host": "BVA0000123@care.va.gov",
               "appellant_email": "robert.smith@example.com", "conference_id": 7_654_321,
               "guest_hearing_link": "https://care.va.gov/guest/BVA0000123",
               "host_hearing_link": "https://care.va.gov/host/BVA0000123",
               "guest_pin": 1_234_567, "host_pin": 2_345_678,
               "guest_pin_long": "2468013579", "host_pin_long": "1357924680",
               "judge_email": "bvajudge@va.gov", "representative_email": "rep@example.com"}),
    ]);

    seed(&mut store, "HearingTaskAssociation", vec![
        json!({"id": 71, "hearing_id": 51, "hearing_type": "Hearing", "hearing_task_id": 103}),
    ]);

    store
}

/// Record counts of the standard export of [`APPEAL_UUID`]
#[must_use]
pub fn expected_export_counts() -> Vec<(&'static str, usize)> {
    vec![
        ("Appeal", 2),
        ("Veteran", 1),
        ("AppealIntake", 1),
        ("Claimant", 2),
        ("Task", 7),
        ("TaskTimer", 1),
        ("DecisionIssue", 1),
        ("RequestIssue", 2),
        ("RequestDecisionIssue", 1),
        ("CavcRemand", 1),
        ("Hearing", 1),
        ("HearingDay", 1),
        ("VirtualHearing", 1),
        ("HearingTaskAssociation", 1),
        ("User", 5),
        ("Organization", 3),
        ("OrganizationsUser", 2),
        ("Person", 2),
    ]
}
