//! The storage boundary shared by the dialog and the reminder loop.
//!
//! Every operation is a single parameterized statement, so each one is
//! atomic on its own; nothing spans more than one call.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::database::connection::DatabaseManager;
use crate::database::models::{Plan, PlanId};
use crate::error::RepositoryError;
use crate::utils::logging::{log_database_error, log_database_operation};

#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn insert(
        &self,
        owner_id: i64,
        text: &str,
        due_at: NaiveDateTime,
    ) -> Result<PlanId, RepositoryError>;

    /// Plans of `owner_id` in storage order; empty when there are none.
    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Plan>, RepositoryError>;

    /// Fails with [`RepositoryError::NotFound`] when the plan is already gone.
    async fn delete_by_id(&self, id: &str) -> Result<(), RepositoryError>;

    /// Plans whose due time, truncated to the minute, equals `minute`.
    async fn find_due(&self, minute: NaiveDateTime) -> Result<Vec<Plan>, RepositoryError>;

    async fn mark_notified(&self, id: &str, at: NaiveDateTime) -> Result<(), RepositoryError>;

    async fn count(&self) -> Result<i64, RepositoryError>;
}

fn logged<T>(operation: &str, result: Result<T, RepositoryError>) -> Result<T, RepositoryError> {
    if let Err(e) = &result {
        log_database_error(operation, "plans", &e.to_string(), None);
    }
    result
}

#[async_trait]
impl PlanRepository for DatabaseManager {
    async fn insert(
        &self,
        owner_id: i64,
        text: &str,
        due_at: NaiveDateTime,
    ) -> Result<PlanId, RepositoryError> {
        log_database_operation("INSERT", "plans", Some(&format!("owner {owner_id}")));
        let plan = logged("INSERT", Plan::create(&self.pool, owner_id, text, due_at).await)?;
        Ok(plan.id)
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Plan>, RepositoryError> {
        log_database_operation("SELECT", "plans", Some(&format!("owner {owner_id}")));
        logged("SELECT", Plan::find_by_owner(&self.pool, owner_id).await)
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), RepositoryError> {
        log_database_operation("DELETE", "plans", Some(id));
        logged("DELETE", Plan::delete(&self.pool, id).await)
    }

    async fn find_due(&self, minute: NaiveDateTime) -> Result<Vec<Plan>, RepositoryError> {
        log_database_operation("SELECT due", "plans", Some(&minute.to_string()));
        logged("SELECT due", Plan::find_due(&self.pool, minute).await)
    }

    async fn mark_notified(&self, id: &str, at: NaiveDateTime) -> Result<(), RepositoryError> {
        log_database_operation("UPDATE notified_at", "plans", Some(id));
        logged("UPDATE notified_at", Plan::mark_notified(&self.pool, id, at).await)
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        logged("COUNT", Plan::count(&self.pool).await)
    }
}
