use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime};
use db::{
    DBService,
    models::{
        project::{Project, ProjectError},
        project_response::{ProjectResponse, UpsertProjectResponse},
        task_assignment::{CreateTaskAssignment, TaskAssignment},
    },
};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    extract,
    inference::{CompletionModel, DEFAULT_MODEL},
    prompts,
};

/// Task generation only runs when the stored feasibility score is
/// strictly greater than this. A score of exactly 5 is not feasible.
pub const FEASIBILITY_THRESHOLD: i64 = 5;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error("failed to serialize prompt: {0}")]
    Prompt(#[from] serde_json::Error),
}

/// Drives the prompt → model → extract → persist pipeline for a project.
///
/// Model-side failures (transport errors, unparsable output) are soft: they
/// are logged and the operation ends with nothing written, while database
/// and lookup failures surface as errors.
#[derive(Clone)]
pub struct ProjectAnalyzer {
    db: DBService,
    model: Arc<dyn CompletionModel>,
    model_id: String,
}

impl ProjectAnalyzer {
    pub fn new(db: DBService, model: Arc<dyn CompletionModel>) -> Self {
        Self {
            db,
            model,
            model_id: DEFAULT_MODEL.to_string(),
        }
    }

    /// Run the feasibility analysis and upsert the project's response.
    /// Returns `Ok(None)` when the model call or extraction failed.
    pub async fn analyse_project(
        &self,
        project_id: Uuid,
    ) -> Result<Option<ProjectResponse>, AnalyzerError> {
        let project = Project::find_by_id(&self.db.pool, project_id)
            .await?
            .ok_or(ProjectError::ProjectNotFound)?;

        let prompt = prompts::analysis_prompt(&project).to_prompt_string()?;
        let raw = match self.model.complete(&self.model_id, &prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("feasibility analysis call failed for project {project_id}: {e}");
                return Ok(None);
            }
        };

        let fields = match extract::extract_json(&raw) {
            Ok(Value::Object(fields)) => fields,
            Ok(other) => {
                warn!(
                    "model returned a JSON {} instead of an object for project {project_id}",
                    json_kind(&other)
                );
                return Ok(None);
            }
            Err(e) => {
                warn!(
                    "could not extract JSON for project {project_id}: {e}; raw output was: {raw}"
                );
                return Ok(None);
            }
        };

        // Absent fields default to empty text / zero, matching what the
        // prompt template asks for.
        let data = UpsertProjectResponse {
            detailed_description: Some(string_field(&fields, "detailed_description")),
            plan: Some(string_field(&fields, "plan")),
            analysis: string_field(&fields, "analysis"),
            feasibility_score: fields.get("feasibility_score").and_then(coerce_int).unwrap_or(0),
        };

        let response = ProjectResponse::upsert(&self.db.pool, project_id, &data).await?;
        info!(
            "stored feasibility response for project {project_id} (score {})",
            response.feasibility_score
        );
        Ok(Some(response))
    }

    /// Generate task assignments for a project and append them.
    ///
    /// Per-entry validation failures skip that entry and continue; the
    /// return value is only the count of rows actually persisted.
    pub async fn generate_tasks(&self, project_id: Uuid) -> Result<usize, AnalyzerError> {
        let project = Project::find_by_id(&self.db.pool, project_id)
            .await?
            .ok_or(ProjectError::ProjectNotFound)?;

        let prompt = prompts::task_breakdown_prompt(&project).to_prompt_string()?;
        let raw = match self.model.complete(&self.model_id, &prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("task generation call failed for project {project_id}: {e}");
                return Ok(0);
            }
        };

        let entries = match extract::extract_json(&raw).and_then(extract::normalize_assignments) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "could not extract assignments for project {project_id}: {e}; raw output was: {raw}"
                );
                return Ok(0);
            }
        };

        let mut created = 0usize;
        for entry in entries {
            let data = match parse_assignment(&entry) {
                Ok(data) => data,
                Err(reason) => {
                    warn!("skipping malformed assignment {entry}: {reason}");
                    continue;
                }
            };
            match TaskAssignment::create(&self.db.pool, project_id, &data, Uuid::new_v4()).await {
                Ok(_) => created += 1,
                Err(e) => warn!("failed to store assignment {entry}: {e}"),
            }
        }

        info!("created {created} task assignment(s) for project {project_id}");
        Ok(created)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn string_field(fields: &Map<String, Value>, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Accept integers, floats and numeric strings; the model is not reliable
/// about emitting a bare integer.
fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `YYYY-MM-DDTHH:MM:SS` as instructed, with RFC 3339 accepted since the
/// model likes to append a `Z` anyway.
fn parse_model_datetime(s: &str) -> Option<NaiveDateTime> {
    s.parse::<NaiveDateTime>()
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc()))
}

fn parse_assignment(entry: &Value) -> Result<CreateTaskAssignment, String> {
    let team_member_number = entry
        .get("team_member_number")
        .and_then(coerce_int)
        .ok_or_else(|| "team_member_number is not numeric".to_string())?;

    let task = entry
        .get("task")
        .and_then(Value::as_str)
        .ok_or_else(|| "task is missing".to_string())?
        .to_string();

    let start_date_time = entry
        .get("start_date_time")
        .and_then(Value::as_str)
        .and_then(parse_model_datetime)
        .ok_or_else(|| "start_date_time is not an ISO-8601 datetime".to_string())?;

    let end_date_time = entry
        .get("end_date_time")
        .and_then(Value::as_str)
        .and_then(parse_model_datetime)
        .ok_or_else(|| "end_date_time is not an ISO-8601 datetime".to_string())?;

    let description = entry
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(CreateTaskAssignment {
        team_member_number,
        task,
        start_date_time,
        end_date_time,
        description,
    })
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use db::models::project::CreateProject;

    use super::*;
    use crate::services::inference::InferenceError;

    /// Scripted model: pops one canned response per call.
    struct StubModel {
        responses: Mutex<VecDeque<String>>,
        calls: AtomicUsize,
    }

    impl StubModel {
        fn new(responses: Vec<&str>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into_iter().map(String::from).collect()),
                calls: AtomicUsize::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionModel for StubModel {
        async fn complete(&self, _model: &str, _prompt: &str) -> Result<String, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.responses.lock().unwrap().pop_front().unwrap_or_default())
        }
    }

    async fn setup(responses: Vec<&str>) -> (DBService, Arc<StubModel>, ProjectAnalyzer, Uuid) {
        let db = DBService::from_url("sqlite::memory:").await.unwrap();
        let model = StubModel::new(responses);
        let analyzer = ProjectAnalyzer::new(db.clone(), model.clone());

        let data = CreateProject {
            owner_id: None,
            title: "Bridge retrofit".to_string(),
            description: "Seismic retrofit of a road bridge".to_string(),
            team_size: 3,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
            country: "Chile".to_string(),
            budget: 500_000.0,
        };
        let project_id = Uuid::new_v4();
        Project::create(&db.pool, &data, project_id).await.unwrap();

        (db, model, analyzer, project_id)
    }

    #[tokio::test]
    async fn analysis_recovers_json_from_noisy_output() {
        let raw = "noise {\"feasibility_score\": 7, \"analysis\": \"ok\", \"plan\": \"\", \"detailed_description\": \"\"} trailing";
        let (_db, _model, analyzer, project_id) = setup(vec![raw]).await;

        let response = analyzer.analyse_project(project_id).await.unwrap().unwrap();
        assert_eq!(response.feasibility_score, 7);
        assert_eq!(response.analysis, "ok");
    }

    #[tokio::test]
    async fn second_analysis_replaces_the_first() {
        let (db, _model, analyzer, project_id) = setup(vec![
            r#"{"detailed_description": "first", "plan": "p1", "analysis": "risky", "feasibility_score": 3}"#,
            r#"{"detailed_description": "second", "plan": "p2", "analysis": "viable", "feasibility_score": 8}"#,
        ])
        .await;

        let first = analyzer.analyse_project(project_id).await.unwrap().unwrap();
        let second = analyzer.analyse_project(project_id).await.unwrap().unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.feasibility_score, 8);
        assert_eq!(second.detailed_description.as_deref(), Some("second"));

        let stored = ProjectResponse::find_by_project_id(&db.pool, project_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.analysis, "viable");
    }

    #[tokio::test]
    async fn absent_fields_default_to_empty_and_zero() {
        let (_db, _model, analyzer, project_id) =
            setup(vec![r#"{"analysis": "thin output"}"#]).await;

        let response = analyzer.analyse_project(project_id).await.unwrap().unwrap();
        assert_eq!(response.feasibility_score, 0);
        assert_eq!(response.plan.as_deref(), Some(""));
        assert_eq!(response.detailed_description.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn unparsable_output_writes_nothing() {
        let (db, _model, analyzer, project_id) =
            setup(vec!["the model refused to emit anything structured"]).await;

        let response = analyzer.analyse_project(project_id).await.unwrap();
        assert!(response.is_none());
        assert!(
            ProjectResponse::find_by_project_id(&db.pool, project_id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn analysis_of_unknown_project_is_an_error() {
        let (_db, model, analyzer, _project_id) = setup(vec![]).await;
        let result = analyzer.analyse_project(Uuid::new_v4()).await;
        assert!(result.is_err());
        // Lookup failures happen before any inference call.
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn generation_runs_accumulate_rows() {
        let batch_one = r#"[
            {"team_member_number": 1, "task": "Survey", "start_date_time": "2026-01-10T09:00:00", "end_date_time": "2026-01-12T17:00:00", "description": "Site survey"},
            {"team_member_number": 2, "task": "Design", "start_date_time": "2026-01-13T09:00:00", "end_date_time": "2026-02-01T17:00:00", "description": "Structural design"}
        ]"#;
        let batch_two = r#"[
            {"team_member_number": 3, "task": "Procure", "start_date_time": "2026-02-02T09:00:00", "end_date_time": "2026-02-20T17:00:00", "description": "Order materials"}
        ]"#;
        let (db, _model, analyzer, project_id) = setup(vec![batch_one, batch_two]).await;

        assert_eq!(analyzer.generate_tasks(project_id).await.unwrap(), 2);
        assert_eq!(analyzer.generate_tasks(project_id).await.unwrap(), 1);

        let total = TaskAssignment::count_by_project_id(&db.pool, project_id)
            .await
            .unwrap();
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn invalid_entries_are_skipped_not_fatal() {
        let raw = r#"[
            {"team_member_number": "one", "task": "Bad member", "start_date_time": "2026-01-10T09:00:00", "end_date_time": "2026-01-11T09:00:00", "description": "skip"},
            {"team_member_number": 2, "task": "Bad date", "start_date_time": "next tuesday", "end_date_time": "2026-01-11T09:00:00", "description": "skip"},
            {"team_member_number": "3", "task": "Good", "start_date_time": "2026-01-10T09:00:00", "end_date_time": "2026-01-11T09:00:00", "description": "numeric string is fine"}
        ]"#;
        let (db, _model, analyzer, project_id) = setup(vec![raw]).await;

        assert_eq!(analyzer.generate_tasks(project_id).await.unwrap(), 1);

        let rows = TaskAssignment::find_by_project_id(&db.pool, project_id)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].team_member_number, 3);
        assert_eq!(rows[0].task, "Good");
    }

    #[tokio::test]
    async fn bare_object_is_a_single_assignment() {
        let raw = r#"{"team_member_number": 1, "task": "Solo", "start_date_time": "2026-01-10T09:00:00", "end_date_time": "2026-01-11T09:00:00", "description": "only one"}"#;
        let (db, _model, analyzer, project_id) = setup(vec![raw]).await;

        assert_eq!(analyzer.generate_tasks(project_id).await.unwrap(), 1);
        let rows = TaskAssignment::find_by_project_id(&db.pool, project_id)
            .await
            .unwrap();
        assert_eq!(rows[0].duration(), chrono::Duration::hours(24));
    }

    #[tokio::test]
    async fn scalar_model_output_aborts_generation() {
        let (db, _model, analyzer, project_id) = setup(vec!["42"]).await;

        assert_eq!(analyzer.generate_tasks(project_id).await.unwrap(), 0);
        let total = TaskAssignment::count_by_project_id(&db.pool, project_id)
            .await
            .unwrap();
        assert_eq!(total, 0);
    }
}
