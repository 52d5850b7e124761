//! Pipeline stages registered on every battle bus.
//!
//! Each stage owns one step of the action flow and talks to the others only
//! through events:
//!
//! ```text
//! INTENT_SUBMITTED -> validator -> INTENT_VALIDATED -> scheduler
//!   -> ACTION_ENQUEUED + PERFORM_ACTION -> performer
//!   -> [REACTION_WINDOW_OPENED -> reaction -> REACTION_RESOLVED -> performer]
//!   -> ACTION_RESOLVED -> turn
//! ```
mod catalog;
mod performer;
mod reaction;
mod scheduler;
mod turn;
mod validator;

pub use catalog::CatalogHandler;
pub use performer::PerformerHandler;
pub use reaction::ReactionHandler;
pub use scheduler::SchedulerHandler;
pub use turn::TurnHandler;
pub(crate) use turn::advance;
pub use validator::ValidatorHandler;

use crate::events::EventHandler;
use crate::state::BattleState;

/// The standard stages in registration order.
pub fn default_handlers() -> Vec<Box<dyn EventHandler<BattleState>>> {
    vec![
        Box::new(TurnHandler),
        Box::new(CatalogHandler),
        Box::new(ValidatorHandler),
        Box::new(SchedulerHandler),
        Box::new(ReactionHandler),
        Box::new(PerformerHandler),
    ]
}
