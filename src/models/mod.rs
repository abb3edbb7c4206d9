//! Core data models for the credential vault

pub mod ids;
pub mod session;
pub mod user;

pub use ids::{ItemId, UserId};
pub use session::SessionIdentity;
pub use user::{UserProfile, UserRecord};
