// HTTP routes
pub mod actions;
pub mod health;

pub use actions::*;
pub use health::*;
