// Business domains
pub mod actions;
pub mod chat;
