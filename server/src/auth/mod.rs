mod crypto;
mod db;
mod extractor;

pub use crypto::{hash_password, verify_password};
pub use db::{create_session, DEFAULT_TOKEN_TTL_DAYS};
pub use extractor::{AuthError, AuthUser};
