//! Turns chat events into conversation state transitions and plan
//! repository calls.
//!
//! Every event is handled while holding the chat's [`ChatSession`] guard,
//! so the state read, the decision and the state write happen as one step
//! for that chat. Parsing and validation are pure; the repository is the
//! only I/O performed here. Replies are returned, not sent.

use std::sync::Arc;
use tracing::debug;

use crate::bot::commands::{parse_command, Command, COMMAND_PREFIX};
use crate::bot::state::{ChatSession, ConversationState, ConversationStore};
use crate::database::models::Plan;
use crate::database::repository::PlanRepository;
use crate::error::{InputError, RepositoryError};
use crate::utils::datetime::{format_due_at, parse_due_at};
use crate::utils::logging::{
    log_command_error, log_command_start, log_command_success, log_validation_error,
};
use crate::utils::validation::{parse_plan_index, validate_plan_text};

pub const PROMPT_PLAN_TEXT: &str = "📝 Write your plan";
pub const PROMPT_PLAN_DATE: &str =
    "📅 Now enter the date and time in the format dd.mm.yyyy HH:MM (for example 31.12.2025 18:00)";
pub const DATE_FORMAT_ERROR: &str =
    "❌ Wrong date format. Try again in the format dd.mm.yyyy HH:MM (for example 31.12.2025 18:00)";
pub const SAVE_ERROR: &str = "❌ Could not save your plan. Please try again with /addplan.";
pub const LIST_ERROR: &str = "❌ Could not load your plans. Please try again later.";
pub const NO_PLANS: &str = "📭 You have no plans yet. Add one with /addplan.";
pub const NO_PLANS_TO_DELETE: &str = "📭 You have no plans to delete.";
pub const PROMPT_DELETE_INDEX: &str = "🔢 Send the number of the plan you want to delete.";
pub const DELETE_ERROR: &str = "❌ Could not delete the plan. Please try again with /deleteplan.";
pub const STALE_PLAN_ERROR: &str =
    "❌ That plan no longer exists. Use /deleteplan to see your current plans.";
pub const DELETE_CANCELLED: &str = "↩️ Deletion cancelled.";
pub const CANNOT_CONVERSE: &str =
    "Sorry, I can't keep up a conversation with you 😔 Type /help to see what I can do.";
pub const UNKNOWN_COMMAND: &str = "Unknown command. Type /help for the list of commands.";
pub const TEXT_ONLY: &str = "Sorry, I only understand text messages 😔";

/// An inbound chat event, already stripped of transport details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    FreeText(String),
    Command { command: Command, args: String },
    /// Raw callback token of an inline button.
    ButtonPress(String),
    /// Stickers, photos and anything else without text.
    NonText,
}

/// Actions offered under the delete confirmation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Confirm,
    ChangeIndex,
    Cancel,
}

impl ButtonAction {
    pub const ALL: [ButtonAction; 3] =
        [ButtonAction::Confirm, ButtonAction::ChangeIndex, ButtonAction::Cancel];

    pub fn token(self) -> &'static str {
        match self {
            ButtonAction::Confirm => "confirm",
            ButtonAction::ChangeIndex => "change-index",
            ButtonAction::Cancel => "cancel",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ButtonAction::Confirm => "✅ Delete",
            ButtonAction::ChangeIndex => "🔢 Choose another",
            ButtonAction::Cancel => "✖️ Cancel",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.token() == token)
    }
}

/// One outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    WithActions { text: String, actions: Vec<ButtonAction> },
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }

    pub fn body(&self) -> &str {
        match self {
            Reply::Text(text) | Reply::WithActions { text, .. } => text,
        }
    }
}

pub struct DialogController {
    repo: Arc<dyn PlanRepository>,
    store: Arc<ConversationStore>,
    bot_username: String,
}

impl DialogController {
    pub fn new(repo: Arc<dyn PlanRepository>, store: Arc<ConversationStore>) -> Self {
        Self {
            repo,
            store,
            bot_username: String::new(),
        }
    }

    /// Accept `/command@bot_username` mentions in group chats.
    pub fn with_bot_username(mut self, bot_username: impl Into<String>) -> Self {
        self.bot_username = bot_username.into();
        self
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    /// Handles one event for `owner_id` and returns the reply to send, if any.
    pub async fn handle(
        &self,
        owner_id: i64,
        display_name: &str,
        event: InboundEvent,
    ) -> Option<Reply> {
        let mut session = self.store.session(owner_id).await;
        let before = session.get().name();

        let reply = match event {
            InboundEvent::FreeText(text) => {
                Some(self.on_text(owner_id, display_name, &mut session, text).await)
            }
            InboundEvent::Command { command, args } => Some(
                self.on_command(owner_id, display_name, &mut session, command, &args)
                    .await,
            ),
            InboundEvent::ButtonPress(token) => self.on_button(owner_id, &mut session, &token).await,
            InboundEvent::NonText => Some(Reply::text(TEXT_ONLY)),
        };

        debug!(
            owner_id,
            from = before,
            to = session.get().name(),
            "dialog event handled"
        );

        let settled = session.is_settled();
        drop(session);
        if settled {
            self.store.release(owner_id).await;
        }
        reply
    }

    async fn on_text(
        &self,
        owner_id: i64,
        display_name: &str,
        session: &mut ChatSession,
        text: String,
    ) -> Reply {
        match session.take() {
            ConversationState::AwaitingPlanText => match validate_plan_text(&text) {
                Ok(()) => {
                    session.set(ConversationState::AwaitingPlanDate { pending_text: text });
                    Reply::text(PROMPT_PLAN_DATE)
                }
                Err(e) => {
                    log_validation_error("plan text", &text, &e.to_string(), owner_id);
                    session.set(ConversationState::AwaitingPlanText);
                    Reply::text(format!("❌ {}. {}", capitalize(&e.to_string()), PROMPT_PLAN_TEXT))
                }
            },
            ConversationState::AwaitingPlanDate { pending_text } => match parse_due_at(&text) {
                Ok(due_at) => self.save_plan(owner_id, pending_text, due_at).await,
                Err(e) => {
                    log_validation_error("plan date", &text, &e.to_string(), owner_id);
                    session.set(ConversationState::AwaitingPlanDate { pending_text });
                    Reply::text(DATE_FORMAT_ERROR)
                }
            },
            ConversationState::AwaitingDeleteIndex { candidates } => {
                match parse_plan_index(&text, candidates.len()) {
                    Ok(index) => confirm_selection(session, candidates, index),
                    Err(e) => {
                        log_validation_error("delete index", &text, &e.to_string(), owner_id);
                        let reply = Reply::text(index_error_text(&e, candidates.len()));
                        session.set(ConversationState::AwaitingDeleteIndex { candidates });
                        reply
                    }
                }
            }
            other => {
                session.set(other);
                if !text.trim_start().starts_with(COMMAND_PREFIX) {
                    return Reply::text(CANNOT_CONVERSE);
                }
                match parse_command(&text, &self.bot_username) {
                    Some((command, args)) => {
                        self.on_command(owner_id, display_name, session, command, &args)
                            .await
                    }
                    None => Reply::text(UNKNOWN_COMMAND),
                }
            }
        }
    }

    async fn on_command(
        &self,
        owner_id: i64,
        display_name: &str,
        session: &mut ChatSession,
        command: Command,
        args: &str,
    ) -> Reply {
        let details = (!args.is_empty()).then_some(args);
        log_command_start(command.name(), display_name, owner_id, details);

        match command {
            Command::Start => Reply::text(format!(
                "👋 Hi, {display_name}! I'm your plan reminder bot. I'll message you when your plans are due.\nType /help to see the commands."
            )),
            Command::Help => Reply::text(Command::help_text()),
            Command::AddPlan => {
                session.set(ConversationState::AwaitingPlanText);
                Reply::text(PROMPT_PLAN_TEXT)
            }
            Command::MyPlans => match self.repo.list_by_owner(owner_id).await {
                Ok(plans) if plans.is_empty() => {
                    session.forget_listing();
                    Reply::text(NO_PLANS)
                }
                Ok(plans) => {
                    let reply = Reply::text(render_plan_list(&plans));
                    log_command_success(command.name(), owner_id, Some(&format!("{} plans", plans.len())));
                    session.remember_listing(plans);
                    reply
                }
                Err(e) => {
                    log_command_error(command.name(), owner_id, &e.to_string());
                    Reply::text(LIST_ERROR)
                }
            },
            Command::DeletePlan if args.is_empty() => self.start_delete(owner_id, session).await,
            Command::DeletePlan => self.delete_by_argument(owner_id, session, args).await,
        }
    }

    async fn start_delete(&self, owner_id: i64, session: &mut ChatSession) -> Reply {
        let plans = match self.repo.list_by_owner(owner_id).await {
            Ok(plans) => plans,
            Err(e) => {
                log_command_error(Command::DeletePlan.name(), owner_id, &e.to_string());
                session.clear();
                return Reply::text(LIST_ERROR);
            }
        };

        if plans.is_empty() {
            session.clear();
            session.forget_listing();
            return Reply::text(NO_PLANS_TO_DELETE);
        }

        let reply = Reply::text(format!("{}\n\n{}", render_plan_list(&plans), PROMPT_DELETE_INDEX));
        session.remember_listing(plans.clone());
        session.set(ConversationState::AwaitingDeleteIndex { candidates: plans });
        reply
    }

    /// `/deleteplan N`: resolve N against the listing the user last saw.
    async fn delete_by_argument(
        &self,
        owner_id: i64,
        session: &mut ChatSession,
        args: &str,
    ) -> Reply {
        let candidates = match session.last_listing() {
            Some(listing) if !listing.is_empty() => listing.to_vec(),
            _ => return self.start_delete_then_select(owner_id, session, args).await,
        };

        select_or_reprompt(owner_id, session, candidates, args)
    }

    async fn start_delete_then_select(
        &self,
        owner_id: i64,
        session: &mut ChatSession,
        args: &str,
    ) -> Reply {
        let reply = self.start_delete(owner_id, session).await;
        match session.take() {
            ConversationState::AwaitingDeleteIndex { candidates } => {
                select_or_reprompt(owner_id, session, candidates, args)
            }
            other => {
                session.set(other);
                reply
            }
        }
    }

    async fn save_plan(
        &self,
        owner_id: i64,
        text: String,
        due_at: chrono::NaiveDateTime,
    ) -> Reply {
        match self.repo.insert(owner_id, &text, due_at).await {
            Ok(id) => {
                log_command_success(Command::AddPlan.name(), owner_id, Some(&format!("plan {id}")));
                Reply::text(format!("✅ Plan saved: {} on {}", text, format_due_at(&due_at)))
            }
            Err(e) => {
                log_command_error(Command::AddPlan.name(), owner_id, &e.to_string());
                Reply::text(SAVE_ERROR)
            }
        }
    }

    async fn on_button(
        &self,
        owner_id: i64,
        session: &mut ChatSession,
        token: &str,
    ) -> Option<Reply> {
        let Some(action) = ButtonAction::from_token(token) else {
            debug!(owner_id, token, "ignoring unknown button token");
            return None;
        };

        let (candidates, index) = match session.take() {
            ConversationState::AwaitingDeleteConfirmation { candidates, index } => (candidates, index),
            other => {
                debug!(owner_id, state = other.name(), token, "ignoring button press outside confirmation");
                session.set(other);
                return None;
            }
        };

        let reply = match action {
            ButtonAction::Confirm => {
                let plan = &candidates[index - 1];
                match self.repo.delete_by_id(&plan.id).await {
                    Ok(()) => {
                        log_command_success(Command::DeletePlan.name(), owner_id, Some(&format!("plan {}", plan.id)));
                        session.forget_listing();
                        Reply::text(format!("🗑 Plan deleted: {}", plan.text))
                    }
                    Err(RepositoryError::NotFound(id)) => {
                        log_command_error(Command::DeletePlan.name(), owner_id, &format!("plan {id} is gone"));
                        session.forget_listing();
                        Reply::text(STALE_PLAN_ERROR)
                    }
                    Err(e) => {
                        log_command_error(Command::DeletePlan.name(), owner_id, &e.to_string());
                        Reply::text(DELETE_ERROR)
                    }
                }
            }
            ButtonAction::ChangeIndex => {
                let reply = Reply::text(format!(
                    "{}\n\n{}",
                    render_plan_list(&candidates),
                    PROMPT_DELETE_INDEX
                ));
                session.set(ConversationState::AwaitingDeleteIndex { candidates });
                reply
            }
            ButtonAction::Cancel => Reply::text(DELETE_CANCELLED),
        };

        Some(reply)
    }
}

fn confirm_selection(session: &mut ChatSession, candidates: Vec<Plan>, index: usize) -> Reply {
    let reply = confirmation_reply(&candidates[index - 1], index);
    session.set(ConversationState::AwaitingDeleteConfirmation { candidates, index });
    reply
}

fn select_or_reprompt(
    owner_id: i64,
    session: &mut ChatSession,
    candidates: Vec<Plan>,
    args: &str,
) -> Reply {
    match parse_plan_index(args, candidates.len()) {
        Ok(index) => confirm_selection(session, candidates, index),
        Err(e) => {
            log_validation_error("delete index", args, &e.to_string(), owner_id);
            let reply = Reply::text(format!(
                "{}\n\n{}",
                render_plan_list(&candidates),
                index_error_text(&e, candidates.len())
            ));
            session.set(ConversationState::AwaitingDeleteIndex { candidates });
            reply
        }
    }
}

fn confirmation_reply(plan: &Plan, index: usize) -> Reply {
    Reply::WithActions {
        text: format!(
            "🗑 Delete this plan?\n\n{}. {} - {}",
            index,
            format_due_at(&plan.due_at),
            plan.text
        ),
        actions: ButtonAction::ALL.to_vec(),
    }
}

fn index_error_text(error: &InputError, len: usize) -> String {
    match error {
        InputError::IndexOutOfRange { .. } => {
            format!("❌ There is no plan with that number. Send a number from 1 to {len}.")
        }
        _ => format!("❌ Please send just the plan number, from 1 to {len}."),
    }
}

/// Numbered (1-based) listing in the given order.
pub fn render_plan_list(plans: &[Plan]) -> String {
    let mut text = String::from("📋 Your plans:\n");
    for (i, plan) in plans.iter().enumerate() {
        text.push_str(&format!(
            "\n{}. {} - {}",
            i + 1,
            format_due_at(&plan.due_at),
            plan.text
        ));
    }
    text
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn plan(id: &str, text: &str) -> Plan {
        Plan {
            id: id.to_string(),
            owner_id: 1,
            text: text.to_string(),
            due_at: NaiveDate::from_ymd_opt(2025, 12, 31)
                .unwrap()
                .and_hms_opt(18, 0, 0)
                .unwrap(),
            notified_at: None,
        }
    }

    #[test]
    fn test_button_tokens_roundtrip() {
        for action in ButtonAction::ALL {
            assert_eq!(ButtonAction::from_token(action.token()), Some(action));
        }
        assert_eq!(ButtonAction::from_token("yes"), None);
    }

    #[test]
    fn test_render_plan_list_is_one_based() {
        let text = render_plan_list(&[plan("a", "Buy milk"), plan("b", "Call mom")]);
        assert!(text.contains("1. 31.12.2025 18:00 - Buy milk"));
        assert!(text.contains("2. 31.12.2025 18:00 - Call mom"));
    }

    #[test]
    fn test_confirmation_offers_all_actions() {
        let reply = confirmation_reply(&plan("a", "Buy milk"), 1);
        match reply {
            Reply::WithActions { text, actions } => {
                assert!(text.contains("Buy milk"));
                assert_eq!(actions, ButtonAction::ALL.to_vec());
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("plan text"), "Plan text");
        assert_eq!(capitalize(""), "");
    }
}
