//! Per-chat conversation state.
//!
//! Each chat gets its own async mutex. A handler holds the chat's guard for
//! the whole read-decide-write cycle, so events for one chat are applied one
//! at a time in arrival order (tokio mutexes are fair), while different chats
//! never contend beyond the brief map lookup.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::database::models::Plan;

/// Where a chat is inside a multi-step dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingPlanText,
    AwaitingPlanDate { pending_text: String },
    AwaitingDeleteIndex { candidates: Vec<Plan> },
    /// `index` is 1-based and always within `candidates`.
    AwaitingDeleteConfirmation { candidates: Vec<Plan>, index: usize },
}

impl ConversationState {
    /// Short name for logs; never includes user text.
    pub fn name(&self) -> &'static str {
        match self {
            ConversationState::Idle => "idle",
            ConversationState::AwaitingPlanText => "awaiting_plan_text",
            ConversationState::AwaitingPlanDate { .. } => "awaiting_plan_date",
            ConversationState::AwaitingDeleteIndex { .. } => "awaiting_delete_index",
            ConversationState::AwaitingDeleteConfirmation { .. } => "awaiting_delete_confirmation",
        }
    }
}

/// Everything remembered about one chat between events.
#[derive(Debug, Default)]
pub struct ChatSession {
    state: ConversationState,
    last_listing: Option<Vec<Plan>>,
}

impl ChatSession {
    pub fn get(&self) -> &ConversationState {
        &self.state
    }

    pub fn set(&mut self, state: ConversationState) {
        self.state = state;
    }

    pub fn clear(&mut self) {
        self.state = ConversationState::Idle;
    }

    /// Takes the current state out, leaving `Idle` behind.
    pub fn take(&mut self) -> ConversationState {
        std::mem::take(&mut self.state)
    }

    /// The plans most recently shown to this chat, in the order shown.
    pub fn last_listing(&self) -> Option<&[Plan]> {
        self.last_listing.as_deref()
    }

    pub fn remember_listing(&mut self, plans: Vec<Plan>) {
        self.last_listing = Some(plans);
    }

    /// Drops the cached listing once its numbering no longer matches storage.
    pub fn forget_listing(&mut self) {
        self.last_listing = None;
    }

    /// Idle with nothing cached, indistinguishable from a chat never seen.
    pub fn is_settled(&self) -> bool {
        self.state == ConversationState::Idle && self.last_listing.is_none()
    }
}

/// Process-scoped store of [`ChatSession`]s keyed by owner id.
/// Nothing is persisted; after a restart every chat starts `Idle`.
#[derive(Debug, Default)]
pub struct ConversationStore {
    chats: Mutex<HashMap<i64, Arc<Mutex<ChatSession>>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks one chat's session until the guard is dropped.
    pub async fn session(&self, owner_id: i64) -> OwnedMutexGuard<ChatSession> {
        let slot = {
            let mut chats = self.chats.lock().await;
            chats.entry(owner_id).or_default().clone()
        };
        slot.lock_owned().await
    }

    pub async fn get(&self, owner_id: i64) -> ConversationState {
        let slot = self.chats.lock().await.get(&owner_id).cloned();
        match slot {
            Some(slot) => slot.lock().await.get().clone(),
            None => ConversationState::Idle,
        }
    }

    pub async fn set(&self, owner_id: i64, state: ConversationState) {
        self.session(owner_id).await.set(state);
        self.release(owner_id).await;
    }

    pub async fn clear(&self, owner_id: i64) {
        self.session(owner_id).await.clear();
        self.release(owner_id).await;
    }

    /// Removes the chat's entry if it is settled and nobody else holds it.
    /// Call after dropping the chat's guard.
    pub async fn release(&self, owner_id: i64) {
        let mut chats = self.chats.lock().await;
        // New holders clone the slot under the map lock, so a count of one
        // means no handler is waiting on or holding this chat.
        let settled = chats.get(&owner_id).is_some_and(|slot| {
            Arc::strong_count(slot) == 1 && slot.try_lock().is_ok_and(|session| session.is_settled())
        });
        if settled {
            chats.remove(&owner_id);
        }
    }

    /// Number of chats currently holding state.
    pub async fn active_chats(&self) -> usize {
        self.chats.lock().await.len()
    }
}
