//! Turn flow: the phase machine, initiative sequencing and reaction windows.
//!
//! These types hold no references to each other. The runtime wires them
//! together through the event bus, one handler per pipeline stage.
mod phase;
mod reaction;
mod turns;

pub use phase::{Phase, PhaseError, PhaseMachine};
pub use reaction::{
    Declaration, EligibleDefender, ReactionChoice, ReactionError, ReactionWindow, WindowId,
    WindowState, eligible_defenders,
};
pub use turns::{InitiativeEntry, RoundStart, TurnError, TurnSequencer, TurnStart};
