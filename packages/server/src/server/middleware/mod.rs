pub mod header_auth;

pub use header_auth::AuthUser;
