use chrono::{Local, NaiveDateTime};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::utils::datetime::{from_storage, to_storage, truncate_to_minute};

pub type PlanId = String;

/// A user-owned reminder. `due_at` always has zero seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub id: PlanId,
    pub owner_id: i64,
    pub text: String,
    pub due_at: NaiveDateTime,
    /// Set once the reminder for this plan has been delivered.
    pub notified_at: Option<String>,
}

#[derive(Debug, FromRow)]
struct PlanRow {
    id: String,
    owner_id: i64,
    text: String,
    due_at: String,
    notified_at: Option<String>,
}

impl TryFrom<PlanRow> for Plan {
    type Error = RepositoryError;

    fn try_from(row: PlanRow) -> Result<Self, Self::Error> {
        let due_at = from_storage(&row.due_at).ok_or_else(|| {
            RepositoryError::CorruptRow(format!("plan {} has due_at '{}'", row.id, row.due_at))
        })?;

        Ok(Plan {
            id: row.id,
            owner_id: row.owner_id,
            text: row.text,
            due_at,
            notified_at: row.notified_at,
        })
    }
}

fn into_plans(rows: Vec<PlanRow>) -> Result<Vec<Plan>, RepositoryError> {
    rows.into_iter().map(Plan::try_from).collect()
}

impl Plan {
    pub async fn create(
        pool: &sqlx::SqlitePool,
        owner_id: i64,
        text: &str,
        due_at: NaiveDateTime,
    ) -> Result<Self, RepositoryError> {
        let id = Uuid::new_v4().to_string();
        let due_at = truncate_to_minute(due_at);
        let now = Local::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO plans (id, owner_id, text, due_at, notified_at, created_at) VALUES (?, ?, ?, ?, NULL, ?)"
        )
        .bind(&id)
        .bind(owner_id)
        .bind(text)
        .bind(to_storage(&due_at))
        .bind(&now)
        .execute(pool)
        .await?;

        Ok(Plan {
            id,
            owner_id,
            text: text.to_string(),
            due_at,
            notified_at: None,
        })
    }

    pub async fn find_by_id(
        pool: &sqlx::SqlitePool,
        id: &str,
    ) -> Result<Option<Self>, RepositoryError> {
        let row = sqlx::query_as::<_, PlanRow>(
            "SELECT id, owner_id, text, due_at, notified_at FROM plans WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        row.map(Plan::try_from).transpose()
    }

    /// Plans of one owner in the order they were stored.
    pub async fn find_by_owner(
        pool: &sqlx::SqlitePool,
        owner_id: i64,
    ) -> Result<Vec<Self>, RepositoryError> {
        let rows = sqlx::query_as::<_, PlanRow>(
            "SELECT id, owner_id, text, due_at, notified_at FROM plans WHERE owner_id = ? ORDER BY rowid"
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

        into_plans(rows)
    }

    /// Plans whose due time falls in exactly the given minute.
    pub async fn find_due(
        pool: &sqlx::SqlitePool,
        minute: NaiveDateTime,
    ) -> Result<Vec<Self>, RepositoryError> {
        let rows = sqlx::query_as::<_, PlanRow>(
            "SELECT id, owner_id, text, due_at, notified_at FROM plans WHERE due_at = ? ORDER BY rowid"
        )
        .bind(to_storage(&minute))
        .fetch_all(pool)
        .await?;

        into_plans(rows)
    }

    pub async fn delete(pool: &sqlx::SqlitePool, id: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM plans WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }

        Ok(())
    }

    pub async fn mark_notified(
        pool: &sqlx::SqlitePool,
        id: &str,
        at: NaiveDateTime,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE plans SET notified_at = ? WHERE id = ?")
            .bind(at.format("%Y-%m-%d %H:%M:%S").to_string())
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }

        Ok(())
    }

    pub async fn count(pool: &sqlx::SqlitePool) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM plans")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
