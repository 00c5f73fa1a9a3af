use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// The AI feasibility evaluation for a project. At most one row per
/// project; re-running the analysis replaces all four payload fields.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub detailed_description: Option<String>,
    pub plan: Option<String>,
    pub analysis: String,
    pub feasibility_score: i64,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct UpsertProjectResponse {
    pub detailed_description: Option<String>,
    pub plan: Option<String>,
    pub analysis: String,
    pub feasibility_score: i64,
}

impl ProjectResponse {
    pub async fn find_by_project_id(
        pool: &SqlitePool,
        project_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectResponse>(
            r#"SELECT id, project_id, detailed_description, plan,
                      analysis, feasibility_score, created_at
               FROM project_responses
               WHERE project_id = $1"#,
        )
        .bind(project_id)
        .fetch_optional(pool)
        .await
    }

    /// Create-or-replace keyed by project identity. The original
    /// created_at is kept when a row already exists.
    pub async fn upsert(
        pool: &SqlitePool,
        project_id: Uuid,
        data: &UpsertProjectResponse,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ProjectResponse>(
            r#"INSERT INTO project_responses (
                    id, project_id, detailed_description, plan,
                    analysis, feasibility_score
                ) VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT(project_id) DO UPDATE SET
                    detailed_description = excluded.detailed_description,
                    plan = excluded.plan,
                    analysis = excluded.analysis,
                    feasibility_score = excluded.feasibility_score
                RETURNING id, project_id, detailed_description, plan,
                          analysis, feasibility_score, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(&data.detailed_description)
        .bind(&data.plan)
        .bind(&data.analysis)
        .bind(data.feasibility_score)
        .fetch_one(pool)
        .await
    }

    pub async fn count_score_below(
        pool: &SqlitePool,
        threshold: i64,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM project_responses WHERE feasibility_score < $1",
        )
        .bind(threshold)
        .fetch_one(pool)
        .await
    }

    pub async fn count_score_above(
        pool: &SqlitePool,
        threshold: i64,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM project_responses WHERE feasibility_score > $1",
        )
        .bind(threshold)
        .fetch_one(pool)
        .await
    }
}
