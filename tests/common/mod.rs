#![allow(dead_code, clippy::unwrap_used)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use plan_reminder_bot::bot::dialog::ButtonAction;
use plan_reminder_bot::bot::transport::ChatTransport;
use plan_reminder_bot::database::connection::DatabaseManager;
use plan_reminder_bot::database::models::{Plan, PlanId};
use plan_reminder_bot::database::repository::PlanRepository;
use plan_reminder_bot::error::{RepositoryError, TransportError};
use plan_reminder_bot::services::image::ImageSource;
use std::collections::HashSet;
use std::sync::Mutex;
use tempfile::{tempdir, TempDir};

pub async fn setup_test_db() -> (DatabaseManager, TempDir) {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let db_url = format!("sqlite:{}", db_path.to_string_lossy());

    let db = DatabaseManager::new(&db_url).await.unwrap();
    db.run_migrations().await.unwrap();
    (db, dir)
}

pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap()
}

/// Repository whose every operation fails with a database error.
pub struct FailingRepository;

fn db_down() -> RepositoryError {
    RepositoryError::Database(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl PlanRepository for FailingRepository {
    async fn insert(&self, _: i64, _: &str, _: NaiveDateTime) -> Result<PlanId, RepositoryError> {
        Err(db_down())
    }

    async fn list_by_owner(&self, _: i64) -> Result<Vec<Plan>, RepositoryError> {
        Err(db_down())
    }

    async fn delete_by_id(&self, _: &str) -> Result<(), RepositoryError> {
        Err(db_down())
    }

    async fn find_due(&self, _: NaiveDateTime) -> Result<Vec<Plan>, RepositoryError> {
        Err(db_down())
    }

    async fn mark_notified(&self, _: &str, _: NaiveDateTime) -> Result<(), RepositoryError> {
        Err(db_down())
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        Err(db_down())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text { owner_id: i64, text: String },
    WithActions { owner_id: i64, text: String, actions: Vec<ButtonAction> },
    Photo { owner_id: i64, bytes: usize, caption: String },
}

/// Records everything sent; sends to owners in `failing` return an error,
/// and every photo is refused when `rejecting_photos` is set.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<Sent>>,
    pub failing: HashSet<i64>,
    pub rejecting_photos: bool,
}

impl RecordingTransport {
    pub fn failing_for(owners: &[i64]) -> Self {
        Self {
            failing: owners.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn rejecting_photos() -> Self {
        Self {
            rejecting_photos: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    fn record(&self, owner_id: i64, sent: Sent) -> Result<(), TransportError> {
        if self.failing.contains(&owner_id) {
            return Err(TransportError::ImageFetch(format!("chat {owner_id} unreachable")));
        }
        self.sent.lock().unwrap().push(sent);
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_text(&self, owner_id: i64, text: &str) -> Result<(), TransportError> {
        self.record(owner_id, Sent::Text { owner_id, text: text.to_string() })
    }

    async fn send_text_with_actions(
        &self,
        owner_id: i64,
        text: &str,
        actions: &[ButtonAction],
    ) -> Result<(), TransportError> {
        self.record(
            owner_id,
            Sent::WithActions { owner_id, text: text.to_string(), actions: actions.to_vec() },
        )
    }

    async fn send_photo(
        &self,
        owner_id: i64,
        image: Vec<u8>,
        caption: &str,
    ) -> Result<(), TransportError> {
        if self.rejecting_photos {
            return Err(TransportError::ImageFetch("photo rejected".to_string()));
        }
        self.record(
            owner_id,
            Sent::Photo { owner_id, bytes: image.len(), caption: caption.to_string() },
        )
    }
}

pub struct StubImages {
    pub available: bool,
}

#[async_trait]
impl ImageSource for StubImages {
    async fn fetch(&self) -> Result<Vec<u8>, TransportError> {
        if self.available {
            Ok(vec![0xFF, 0xD8, 0xFF, 0xE0])
        } else {
            Err(TransportError::ImageFetch("image host down".to_string()))
        }
    }
}
