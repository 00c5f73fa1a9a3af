use axum::{
    Extension, Json, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{delete, get, post},
};
use db::models::{
    project::{CreateProject, Project, ProjectError},
    project_response::ProjectResponse,
    task_assignment::TaskAssignment,
};
use serde::{Deserialize, Serialize};
use services::services::analysis::FEASIBILITY_THRESHOLD;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::load_project_middleware};

pub async fn list_projects(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Project>>>, ApiError> {
    let projects = Project::find_all(&state.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(projects)))
}

/// Create a project and synchronously run the feasibility analysis.
///
/// The analysis is best-effort: the created project is returned even when
/// the model call or extraction fails, and consumers discover the missing
/// evaluation via the ai-evaluation endpoint.
pub async fn create_project(
    State(state): State<AppState>,
    Json(payload): Json<CreateProject>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    if payload.team_size < 1 {
        return Err(ApiError::BadRequest(
            "team_size must be a positive integer".to_string(),
        ));
    }

    let id = Uuid::new_v4();
    tracing::debug!("Creating project '{}' ({})", payload.title, id);
    let project = Project::create(&state.db().pool, &payload, id).await?;

    if let Err(e) = state.analyzer().analyse_project(project.id).await {
        tracing::error!("feasibility analysis failed for project {}: {}", project.id, e);
    }

    Ok(ResponseJson(ApiResponse::success(project)))
}

pub async fn delete_project(
    Extension(project): Extension<Project>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    // Response and assignment rows cascade in the schema
    let rows_affected = Project::delete(&state.db().pool, project.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::Database(sqlx::Error::RowNotFound));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn get_ai_evaluation(
    Extension(project): Extension<Project>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<ProjectResponse>>, ApiError> {
    let response = ProjectResponse::find_by_project_id(&state.db().pool, project.id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("No evaluation response found for this project.".to_string())
        })?;
    Ok(ResponseJson(ApiResponse::success(response)))
}

pub async fn get_project_tasks(
    Extension(project): Extension<Project>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<TaskAssignment>>>, ApiError> {
    let tasks = TaskAssignment::find_by_project_id(&state.db().pool, project.id).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

#[derive(Debug, Serialize, TS)]
pub struct ProjectStatistics {
    pub total_projects: i64,
    pub projects_with_low_feasibility: i64,
    pub projects_with_high_feasibility: i64,
}

/// Aggregate dashboard counts. A score of exactly 5 lands in neither
/// feasibility bucket.
pub async fn get_statistics(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<ProjectStatistics>>, ApiError> {
    let pool = &state.db().pool;
    let stats = ProjectStatistics {
        total_projects: Project::count(pool).await?,
        projects_with_low_feasibility: ProjectResponse::count_score_below(
            pool,
            FEASIBILITY_THRESHOLD,
        )
        .await?,
        projects_with_high_feasibility: ProjectResponse::count_score_above(
            pool,
            FEASIBILITY_THRESHOLD,
        )
        .await?,
    };
    Ok(ResponseJson(ApiResponse::success(stats)))
}

#[derive(Debug, Deserialize, TS)]
pub struct GenerateTasksRequest {
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Serialize, TS)]
pub struct GenerateTasksResponse {
    pub message: String,
}

/// Trigger task generation, gated on the stored feasibility score.
///
/// Returns "ok" whenever generation was attempted, regardless of how many
/// assignment rows were actually persisted.
pub async fn generate_tasks(
    State(state): State<AppState>,
    Json(payload): Json<GenerateTasksRequest>,
) -> Result<ResponseJson<ApiResponse<GenerateTasksResponse>>, ApiError> {
    let project_id = payload
        .project_id
        .ok_or_else(|| ApiError::BadRequest("project_id is required".to_string()))?;

    let project = Project::find_by_id(&state.db().pool, project_id)
        .await?
        .ok_or(ProjectError::ProjectNotFound)?;

    let response = ProjectResponse::find_by_project_id(&state.db().pool, project.id).await?;
    let feasible = response
        .map(|r| r.feasibility_score > FEASIBILITY_THRESHOLD)
        .unwrap_or(false);

    if !feasible {
        return Ok(ResponseJson(ApiResponse::success(GenerateTasksResponse {
            message: "not feasible".to_string(),
        })));
    }

    let created = state.analyzer().generate_tasks(project.id).await?;
    tracing::debug!(
        "task generation persisted {} assignment(s) for project {}",
        created,
        project.id
    );

    Ok(ResponseJson(ApiResponse::success(GenerateTasksResponse {
        message: "ok".to_string(),
    })))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let project_id_router = Router::new()
        .route("/", delete(delete_project))
        .route("/ai-evaluation", get(get_ai_evaluation))
        .route("/tasks", get(get_project_tasks))
        .layer(from_fn_with_state(state.clone(), load_project_middleware));

    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route("/projects/statistics", get(get_statistics))
        .route("/projects/tasks/generate", post(generate_tasks))
        .nest("/projects/{project_id}", project_id_router)
}
