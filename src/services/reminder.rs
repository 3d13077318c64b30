//! Fires due-plan notifications on a fixed cadence, independently of chat
//! traffic.
//!
//! Each tick looks up the plans due in the current minute and notifies their
//! owners. Delivered plans are stamped with `notified_at` and skipped on any
//! later tick, so a plan is announced at most once even if two ticks land in
//! the same minute. A failure for one plan never stops the others.

use chrono::{Local, NaiveDateTime};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::bot::transport::ChatTransport;
use crate::database::models::Plan;
use crate::database::repository::PlanRepository;
use crate::error::{RepositoryError, TransportError};
use crate::services::image::ImageSource;
use crate::utils::datetime::{current_minute, format_due_at, truncate_to_minute};
use crate::utils::logging::log_reminder_event;

/// Outcome of one tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub due: usize,
    pub sent: usize,
    /// Already notified on an earlier tick.
    pub skipped: usize,
    pub failed: usize,
}

pub struct ReminderDispatcher {
    repo: Arc<dyn PlanRepository>,
    transport: Arc<dyn ChatTransport>,
    images: Arc<dyn ImageSource>,
}

impl ReminderDispatcher {
    pub fn new(
        repo: Arc<dyn PlanRepository>,
        transport: Arc<dyn ChatTransport>,
        images: Arc<dyn ImageSource>,
    ) -> Self {
        Self {
            repo,
            transport,
            images,
        }
    }

    /// Notifies every not-yet-notified plan due in `minute`.
    pub async fn dispatch_due(&self, minute: NaiveDateTime) -> DispatchSummary {
        let minute = truncate_to_minute(minute);
        let mut summary = DispatchSummary::default();

        let plans = match self.repo.find_due(minute).await {
            Ok(plans) => plans,
            Err(e) => {
                tracing::error!("Failed to look up plans due at {}: {}", minute, e);
                return summary;
            }
        };
        summary.due = plans.len();

        for plan in plans {
            if plan.notified_at.is_some() {
                summary.skipped += 1;
                continue;
            }

            match self.notify(&plan).await {
                Ok(()) => {
                    summary.sent += 1;
                    log_reminder_event("sent", &plan.id, plan.owner_id, None);
                    self.stamp(&plan).await;
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(
                        "Failed to send reminder for plan {} to chat {}: {}",
                        plan.id, plan.owner_id, e
                    );
                }
            }
        }

        summary
    }

    async fn notify(&self, plan: &Plan) -> Result<(), TransportError> {
        let text = reminder_text(plan);

        let image = match self.images.fetch().await {
            Ok(image) => image,
            Err(e) => {
                log_reminder_event("image unavailable, sending text", &plan.id, plan.owner_id, Some(&e.to_string()));
                return self.transport.send_text(plan.owner_id, &text).await;
            }
        };

        // Long plans get the headline as caption and the full text as a follow-up.
        let fits = text.chars().count() <= MAX_CAPTION_CHARS;
        let caption = if fits { text.as_str() } else { REMINDER_HEADLINE };

        match self.transport.send_photo(plan.owner_id, image, caption).await {
            Ok(()) if fits => return Ok(()),
            Ok(()) => {}
            Err(e) => {
                log_reminder_event("photo rejected, sending text", &plan.id, plan.owner_id, Some(&e.to_string()));
            }
        }
        self.transport.send_text(plan.owner_id, &text).await
    }

    async fn stamp(&self, plan: &Plan) {
        match self.repo.mark_notified(&plan.id, Local::now().naive_local()).await {
            Ok(()) => {}
            // Deleted by its owner while the reminder was in flight.
            Err(RepositoryError::NotFound(_)) => {
                tracing::debug!("Plan {} disappeared before it could be marked notified", plan.id);
            }
            Err(e) => {
                tracing::warn!("Failed to mark plan {} as notified: {}", plan.id, e);
            }
        }
    }
}

/// Telegram's limit for photo captions.
pub const MAX_CAPTION_CHARS: usize = 1024;

pub const REMINDER_HEADLINE: &str = "⏰ Reminder!";

pub fn reminder_text(plan: &Plan) -> String {
    format!(
        "{}\n\n{}\n\n📅 {}",
        REMINDER_HEADLINE,
        plan.text,
        format_due_at(&plan.due_at)
    )
}

pub struct ReminderService {
    dispatcher: Arc<ReminderDispatcher>,
    scheduler: JobScheduler,
    schedule: String,
}

impl ReminderService {
    pub async fn new(
        dispatcher: Arc<ReminderDispatcher>,
        schedule: &str,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            dispatcher,
            scheduler,
            schedule: schedule.to_string(),
        })
    }

    pub async fn start(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let dispatcher = self.dispatcher.clone();

        let reminder_job = Job::new_async(self.schedule.as_str(), move |_uuid, _l| {
            let dispatcher = dispatcher.clone();
            Box::pin(async move {
                let minute = current_minute();
                let summary = dispatcher.dispatch_due(minute).await;
                if summary.due > 0 {
                    tracing::info!(
                        "Reminder tick {}: {} due, {} sent, {} skipped, {} failed",
                        minute, summary.due, summary.sent, summary.skipped, summary.failed
                    );
                }
            })
        })?;

        self.scheduler.add(reminder_job).await?;
        self.scheduler.start().await?;

        tracing::info!("Reminder service started with schedule '{}'", self.schedule);
        Ok(())
    }

    /// Stops future ticks; a tick already running finishes on its own.
    pub async fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.scheduler.shutdown().await?;
        tracing::info!("Reminder service stopped");
        Ok(())
    }

    // Manual trigger for testing
    pub async fn check_reminders_now(&self) -> DispatchSummary {
        self.dispatcher.dispatch_due(current_minute()).await
    }
}
