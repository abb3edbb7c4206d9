//! Authentication: password hashing and stateless session credentials

pub mod password;
pub mod session;

pub use password::{hash_password, validate_email, validate_password, verify_password};
pub use session::{AuthPolicy, SessionAuthenticator};
