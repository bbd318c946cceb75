//! Journey module - phases, the phase graph, and durable per-user state.

mod events;
mod phase;
pub mod phase_graph;
mod state;

pub use events::{ConversationTurn, EventKind, JourneyEvent, TransitionRecord, TurnRole};
pub use phase::Phase;
pub use phase_graph::{
    can_transition, is_valid_transition, required_fields, GuardField, GuardSnapshot,
    TransitionDecision,
};
pub use state::{JourneyState, OnboardingStep, ScratchContext};
