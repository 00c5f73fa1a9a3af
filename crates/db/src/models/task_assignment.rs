use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// One generated task binding a team-member number to a task name,
/// description and time window within a project.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct TaskAssignment {
    pub id: Uuid,
    pub project_id: Uuid,
    pub team_member_number: i64,
    pub task: String,
    pub start_date_time: NaiveDateTime,
    pub end_date_time: NaiveDateTime,
    pub description: String,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateTaskAssignment {
    pub team_member_number: i64,
    pub task: String,
    pub start_date_time: NaiveDateTime,
    pub end_date_time: NaiveDateTime,
    pub description: String,
}

impl TaskAssignment {
    pub fn duration(&self) -> Duration {
        self.end_date_time - self.start_date_time
    }

    pub async fn find_by_project_id(
        pool: &SqlitePool,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskAssignment>(
            r#"SELECT id, project_id, team_member_number, task,
                      start_date_time, end_date_time, description, created_at
               FROM task_assignments
               WHERE project_id = $1
               ORDER BY start_date_time ASC, created_at ASC"#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        project_id: Uuid,
        data: &CreateTaskAssignment,
        assignment_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TaskAssignment>(
            r#"INSERT INTO task_assignments (
                    id, project_id, team_member_number, task,
                    start_date_time, end_date_time, description
                ) VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id, project_id, team_member_number, task,
                          start_date_time, end_date_time, description, created_at"#,
        )
        .bind(assignment_id)
        .bind(project_id)
        .bind(data.team_member_number)
        .bind(&data.task)
        .bind(data.start_date_time)
        .bind(data.end_date_time)
        .bind(&data.description)
        .fetch_one(pool)
        .await
    }

    pub async fn count_by_project_id(
        pool: &SqlitePool,
        project_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM task_assignments WHERE project_id = $1",
        )
        .bind(project_id)
        .fetch_one(pool)
        .await
    }
}
