use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("Project not found")]
    ProjectNotFound,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Project {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub team_size: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub country: String,
    pub budget: f64,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateProject {
    pub owner_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub team_size: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub country: String,
    pub budget: f64,
}

impl Project {
    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM projects")
            .fetch_one(pool)
            .await
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"SELECT id, owner_id, title, description, team_size,
                      start_date, end_date, country, budget, created_at
               FROM projects
               ORDER BY created_at DESC"#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"SELECT id, owner_id, title, description, team_size,
                      start_date, end_date, country, budget, created_at
               FROM projects
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateProject,
        project_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"INSERT INTO projects (
                    id, owner_id, title, description, team_size,
                    start_date, end_date, country, budget
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING id, owner_id, title, description, team_size,
                          start_date, end_date, country, budget, created_at"#,
        )
        .bind(project_id)
        .bind(data.owner_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.team_size)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(&data.country)
        .bind(data.budget)
        .fetch_one(pool)
        .await
    }

    /// Response and assignment rows cascade via ON DELETE CASCADE.
    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
