//! Actions domain: action lifecycle and the producer-side run pipeline.

pub mod model;
pub mod run;
pub mod store;

pub use model::{Action, ActionData, ActionTrigger};
pub use run::run_action;
pub use store::ActionStore;
