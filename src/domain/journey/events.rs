//! Append-only audit entries: transitions, conversation turns, progress updates.

use serde::{Deserialize, Serialize};

use super::phase::Phase;
use crate::domain::foundation::Timestamp;
use crate::domain::portfolio::ProgressUpdate;

/// Audit entry written each time the phase changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: Phase,
    pub to: Phase,
    pub reason: String,
    pub timestamp: Timestamp,
}

impl TransitionRecord {
    pub fn new(from: Phase, to: Phase, reason: impl Into<String>) -> Self {
        Self {
            from,
            to,
            reason: reason.into(),
            timestamp: Timestamp::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One message in the user-visible conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
    pub phase: Phase,
    pub timestamp: Timestamp,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>, phase: Phase) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            phase,
            timestamp: Timestamp::now(),
        }
    }

    pub fn assistant(content: impl Into<String>, phase: Phase) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            phase,
            timestamp: Timestamp::now(),
        }
    }
}

/// Discriminates the append-only logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Transition,
    Conversation,
    Progress,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Transition => "transition",
            EventKind::Conversation => "conversation",
            EventKind::Progress => "progress",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum JourneyEvent {
    Transition(TransitionRecord),
    Conversation(ConversationTurn),
    Progress(ProgressUpdate),
}

impl JourneyEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            JourneyEvent::Transition(_) => EventKind::Transition,
            JourneyEvent::Conversation(_) => EventKind::Conversation,
            JourneyEvent::Progress(_) => EventKind::Progress,
        }
    }
}
