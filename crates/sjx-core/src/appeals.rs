//! Appeal-domain schema and registry
//!
//! The graph exported for an appeal: the appeal (plus any appeal it was
//! remanded from by the CAVC), its veteran, intake and claimants, tasks and
//! timers, issues, remands, hearings, the users and organizations those
//! records point at, and the people behind veterans and claimants.
//!
//! Types are declared in collection order. Each retrieval rule only reads
//! types declared above it.

use crate::difference::ExpectedDifferences;
use crate::error::{ExchangeError, ExchangeResult};
use serde_json::Value;
use sjx_import::ReferenceExemption;
use sjx_registry::{CustomRule, ReuseKey, Retrieval, TypeConfig, TypeRegistry};
use sjx_sanitize::{SanitizeField, SanitizeSpec};
use sjx_schema::{EntitySchema, EntityType, Record, RecordSet, Schema, SchemaError};
use sjx_store::{SourceStore, StoreError};

/// Root type of every appeal export
pub const ROOT_TYPE: &str = "Appeal";

/// Types imported before all others, in this order
pub const FIRST_TYPES: &[&str] = &["Appeal", "Organization", "User", "HearingDay"];

/// Single-table subtypes of `Task` known to the schema
pub const TASK_TYPES: &[&str] = &[
    "RootTask",
    "DistributionTask",
    "TrackVeteranTask",
    "HearingTask",
    "ScheduleHearingTask",
    "AssignHearingDispositionTask",
    "EvidenceSubmissionWindowTask",
    "JudgeAssignTask",
    "JudgeDecisionReviewTask",
    "AttorneyTask",
    "BvaDispatchTask",
    "TimedHoldTask",
    "CavcTask",
    "SendCavcRemandProcessedLetterTask",
    "MdrTask",
];

/// Single-table subtypes of `Organization` known to the schema
pub const ORGANIZATION_TYPES: &[&str] = &[
    "Bva",
    "BvaDispatch",
    "JudgeTeam",
    "HearingsManagement",
    "HearingAdmin",
    "CavcLitigationSupport",
    "Vso",
];

/// Entity schemas for the appeal graph
///
/// # Errors
/// Returns [`SchemaError::DuplicateEntityType`] only if the declarations
/// below repeat a type
pub fn schema() -> Result<Schema, SchemaError> {
    let mut schema = Schema::new()
        .with(EntitySchema::new("DecisionReview"))?
        .with(EntitySchema::new("Appeal").with_parent("DecisionReview"))?
        .with(EntitySchema::new("Veteran"))?
        .with(
            EntitySchema::new("AppealIntake")
                .polymorphic("detail", &["DecisionReview"])
                .belongs_to("user_id", "User"),
        )?
        .with(EntitySchema::new("Claimant").polymorphic("decision_review", &["DecisionReview"]))?
        .with(
            EntitySchema::new("Task")
                .polymorphic("appeal", &["Appeal"])
                .polymorphic("assigned_to", &["User", "Organization"])
                .belongs_to("assigned_by_id", "User")
                .belongs_to("cancelled_by_id", "User")
                .belongs_to("parent_id", "Task"),
        )?
        .with(EntitySchema::new("TaskTimer").belongs_to("task_id", "Task"))?
        .with(EntitySchema::new("DecisionIssue").polymorphic("decision_review", &["DecisionReview"]))?
        .with(
            EntitySchema::new("RequestIssue")
                .polymorphic("decision_review", &["DecisionReview"])
                .belongs_to("contested_decision_issue_id", "DecisionIssue"),
        )?
        .with(
            EntitySchema::new("RequestDecisionIssue")
                .belongs_to("request_issue_id", "RequestIssue")
                .belongs_to("decision_issue_id", "DecisionIssue"),
        )?
        .with(
            EntitySchema::new("CavcRemand")
                .belongs_to("source_appeal_id", "Appeal")
                .belongs_to("remand_appeal_id", "Appeal")
                .belongs_to("created_by_id", "User")
                .belongs_to("updated_by_id", "User")
                .offset_field("decision_issue_ids"),
        )?
        .with(
            EntitySchema::new("Hearing")
                .belongs_to("appeal_id", "Appeal")
                .belongs_to("hearing_day_id", "HearingDay")
                .belongs_to("created_by_id", "User")
                .belongs_to("updated_by_id", "User")
                .belongs_to("judge_id", "User"),
        )?
        .with(
            EntitySchema::new("HearingDay")
                .belongs_to("created_by_id", "User")
                .belongs_to("updated_by_id", "User")
                .belongs_to("judge_id", "User"),
        )?
        .with(
            EntitySchema::new("VirtualHearing")
                .polymorphic("hearing", &["Hearing"])
                .belongs_to("created_by_id", "User")
                .belongs_to("updated_by_id", "User"),
        )?
        .with(
            EntitySchema::new("HearingTaskAssociation")
                .polymorphic("hearing", &["Hearing"])
                .belongs_to("hearing_task_id", "Task"),
        )?
        .with(EntitySchema::new("User"))?
        .with(EntitySchema::new("Organization"))?
        .with(
            EntitySchema::new("OrganizationsUser")
                .belongs_to("organization_id", "Organization")
                .belongs_to("user_id", "User"),
        )?
        .with(EntitySchema::new("Person"))?;

    for task in TASK_TYPES {
        schema.add(EntitySchema::new(*task).with_parent("Task"))?;
    }
    for org in ORGANIZATION_TYPES {
        schema.add(EntitySchema::new(*org).with_parent("Organization"))?;
    }
    Ok(schema)
}

/// Appeals a collected appeal was remanded from
///
/// Reads `CavcRemand` from the store directly since remands are collected
/// later in the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct CavcSourceAppeals;

impl CustomRule for CavcSourceAppeals {
    fn dependencies(&self) -> Vec<EntityType> {
        vec![EntityType::new(ROOT_TYPE)]
    }

    fn retrieve(
        &self,
        target: &EntityType,
        source: &dyn SourceStore,
        records: &RecordSet,
    ) -> Result<Vec<Record>, StoreError> {
        let appeal_ids: Vec<Value> = records
            .ids(ROOT_TYPE)
            .into_iter()
            .map(Value::from)
            .collect();
        if appeal_ids.is_empty() {
            return Ok(Vec::new());
        }
        let remands = source.where_in("CavcRemand", "remand_appeal_id", &appeal_ids)?;
        let source_ids = distinct_ints(&remands, "source_appeal_id");
        source.find_all(target.as_str(), &source_ids)
    }
}

/// Organizations the collected users belong to
#[derive(Debug, Clone, Copy, Default)]
pub struct UserOrganizations;

impl CustomRule for UserOrganizations {
    fn dependencies(&self) -> Vec<EntityType> {
        vec![EntityType::new("User")]
    }

    fn retrieve(
        &self,
        target: &EntityType,
        source: &dyn SourceStore,
        records: &RecordSet,
    ) -> Result<Vec<Record>, StoreError> {
        let user_ids: Vec<Value> = records.ids("User").into_iter().map(Value::from).collect();
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let memberships = source.where_in("OrganizationsUser", "user_id", &user_ids)?;
        let org_ids = distinct_ints(&memberships, "organization_id");
        source.find_all(target.as_str(), &org_ids)
    }
}

/// Hearings the collected hearing tasks are associated with
///
/// Reads `HearingTaskAssociation` from the store directly since associations
/// are collected after hearings.
#[derive(Debug, Clone, Copy, Default)]
pub struct HearingTaskHearings;

impl CustomRule for HearingTaskHearings {
    fn dependencies(&self) -> Vec<EntityType> {
        vec![EntityType::new("Task")]
    }

    fn retrieve(
        &self,
        target: &EntityType,
        source: &dyn SourceStore,
        records: &RecordSet,
    ) -> Result<Vec<Record>, StoreError> {
        let task_ids: Vec<Value> = records.ids("Task").into_iter().map(Value::from).collect();
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut associations =
            source.where_in("HearingTaskAssociation", "hearing_task_id", &task_ids)?;
        associations.retain(|r| r.get_str("hearing_type") == Some(target.as_str()));
        let hearing_ids = distinct_ints(&associations, "hearing_id");
        source.find_all(target.as_str(), &hearing_ids)
    }
}

fn distinct_ints(records: &[Record], field: &str) -> Vec<i64> {
    let mut ids: Vec<i64> = Vec::new();
    for id in records.iter().filter_map(|r| r.get_i64(field)) {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

fn users_referenced_by(from: &str, fields: &[&str]) -> Vec<Retrieval> {
    fields
        .iter()
        .map(|field| Retrieval::belongs_to(from, field))
        .collect()
}

fn sanitize_error(entity_type: &str, source: sjx_sanitize::SanitizeError) -> ExchangeError {
    ExchangeError::Sanitize {
        description: format!("{entity_type} sanitize fields"),
        source,
    }
}

/// Registry for appeal exports and imports
///
/// # Errors
/// Returns [`ExchangeError::Registry`] if a declaration repeats a type or
/// [`ExchangeError::Sanitize`] if a field pattern does not compile
pub fn registry() -> ExchangeResult<TypeRegistry> {
    let file_number = || SanitizeField::literal("veteran_file_number").shared_as("file_number");

    let mut users = vec![
        Retrieval::polymorphic("Task", "assigned_to"),
        Retrieval::belongs_to("Task", "assigned_by_id"),
        Retrieval::belongs_to("Task", "cancelled_by_id"),
        Retrieval::belongs_to("AppealIntake", "user_id"),
    ];
    users.extend(users_referenced_by("CavcRemand", &["created_by_id", "updated_by_id"]));
    users.extend(users_referenced_by("Hearing", &["created_by_id", "updated_by_id", "judge_id"]));
    users.extend(users_referenced_by("HearingDay", &["created_by_id", "updated_by_id", "judge_id"]));
    users.extend(users_referenced_by("VirtualHearing", &["created_by_id", "updated_by_id"]));

    let request_issue_text = SanitizeField::regex("_(notes|text|description)")
        .map_err(|e| sanitize_error("RequestIssue", e))?;

    let registry = TypeRegistry::new(
        TypeConfig::new(ROOT_TYPE)
            .sanitize(SanitizeSpec::new().field(file_number()))
            .tracked()
            .reuse_by(ReuseKey::field("uuid")),
    )
    .with_root_expansion(Retrieval::custom(CavcSourceAppeals))
    .with(
        TypeConfig::new("Veteran")
            .retrieve(Retrieval::matching("Appeal", "veteran_file_number", "file_number"))
            .sanitize(SanitizeSpec::literals(&[
                "file_number",
                "first_name",
                "last_name",
                "middle_name",
                "ssn",
            ]))
            .tracked()
            .reuse_by(ReuseKey::field("file_number")),
    )?
    .with(
        TypeConfig::new("AppealIntake")
            .retrieve(Retrieval::has_many_as("Appeal", "detail"))
            .sanitize(SanitizeSpec::new().field(file_number())),
    )?
    .with(TypeConfig::new("Claimant").retrieve(Retrieval::has_many_as("Appeal", "decision_review")))?
    .with(
        TypeConfig::new("Task")
            .retrieve(Retrieval::has_many_as("Appeal", "appeal"))
            .sanitize(SanitizeSpec::literals(&["instructions"]))
            .raw(),
    )?
    .with(TypeConfig::new("TaskTimer").retrieve(Retrieval::has_many("Task", "task_id")))?
    .with(
        TypeConfig::new("DecisionIssue")
            .retrieve(Retrieval::has_many_as("Appeal", "decision_review"))
            .sanitize(SanitizeSpec::literals(&["decision_text", "description"])),
    )?
    .with(
        TypeConfig::new("RequestIssue")
            .retrieve(Retrieval::has_many_as("Appeal", "decision_review"))
            .sanitize(
                SanitizeSpec::literals(&["notes", "contested_issue_description"])
                    .field(request_issue_text),
            ),
    )?
    .with(
        TypeConfig::new("RequestDecisionIssue")
            .retrieve(Retrieval::has_many("RequestIssue", "request_issue_id")),
    )?
    .with(
        TypeConfig::new("CavcRemand")
            .retrieve(Retrieval::Union(vec![
                Retrieval::has_many("Appeal", "source_appeal_id"),
                Retrieval::has_many("Appeal", "remand_appeal_id"),
            ]))
            .sanitize(SanitizeSpec::literals(&["instructions"]))
            .raw(),
    )?
    .with(
        TypeConfig::new("Hearing")
            .retrieve(Retrieval::Union(vec![
                Retrieval::has_many("Appeal", "appeal_id"),
                Retrieval::custom(HearingTaskHearings),
            ]))
            .sanitize(SanitizeSpec::literals(&[
                "bva_poc",
                "military_service",
                "notes",
                "representative_name",
                "summary",
                "witness",
            ]))
            .raw(),
    )?
    .with(
        TypeConfig::new("HearingDay")
            .retrieve(Retrieval::belongs_to("Hearing", "hearing_day_id"))
            .sanitize(SanitizeSpec::literals(&["bva_poc", "notes"])),
    )?
    .with(
        TypeConfig::new("VirtualHearing")
            .retrieve(Retrieval::has_many_as("Hearing", "hearing"))
            .sanitize(SanitizeSpec::literals(&[
                "alias",
                "alias_with_host",
                "appellant_email",
                "conference_id",
                "guest_hearing_link",
                "guest_pin",
                "guest_pin_long",
                "host_hearing_link",
                "host_pin",
                "host_pin_long",
                "judge_email",
                "representative_email",
            ])),
    )?
    .with(
        TypeConfig::new("HearingTaskAssociation")
            .retrieve(Retrieval::has_many_as("Hearing", "hearing")),
    )?
    .with(
        TypeConfig::new("User")
            .retrieve(Retrieval::Union(users))
            .sanitize(SanitizeSpec::literals(&["css_id", "email", "full_name"]).strip("display_name"))
            .tracked()
            .reuse_by(ReuseKey::field("css_id")),
    )?
    .with(
        TypeConfig::new("Organization")
            .retrieve(Retrieval::Union(vec![
                Retrieval::polymorphic("Task", "assigned_to"),
                Retrieval::custom(UserOrganizations),
            ]))
            .tracked()
            .reuse_by(ReuseKey::field("url")),
    )?
    .with(
        TypeConfig::new("OrganizationsUser")
            .retrieve(Retrieval::has_many("User", "user_id"))
            .reuse_by(ReuseKey::composite(&["organization_id", "user_id"])),
    )?
    .with(
        TypeConfig::new("Person")
            .retrieve(Retrieval::Union(vec![
                Retrieval::matching("Claimant", "participant_id", "participant_id"),
                Retrieval::matching("Veteran", "participant_id", "participant_id"),
            ]))
            .sanitize(SanitizeSpec::literals(&[
                "date_of_birth",
                "email_address",
                "first_name",
                "last_name",
                "middle_name",
                "ssn",
            ]))
            .tracked()
            .reuse_by(ReuseKey::field("participant_id")),
    )?
    .with_first_types(FIRST_TYPES);

    Ok(registry)
}

/// Reference fields the import validation pass does not report
#[must_use]
pub fn exemptions() -> Vec<ReferenceExemption> {
    vec![
        ReferenceExemption::new("Task", "assigned_to_id").when("assigned_to_type", "Organization"),
        ReferenceExemption::new("OrganizationsUser", "organization_id"),
        ReferenceExemption::new("OrganizationsUser", "user_id"),
        ReferenceExemption::new("VirtualHearing", "conference_id"),
        // VACOLS rows are not exported
        ReferenceExemption::new("RequestIssue", "vacols_sequence_id"),
    ]
}

/// Fields allowed to differ between an export and a re-export of its import
#[must_use]
pub fn expected_differences() -> ExpectedDifferences {
    ExpectedDifferences::new().with("User", &["display_name"])
}
