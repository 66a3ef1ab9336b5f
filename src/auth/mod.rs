pub mod extractor;
pub mod jwt;
pub mod password;

pub use extractor::AuthUser;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";
