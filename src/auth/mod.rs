mod claims;
pub mod jwt;
pub mod password;

pub use claims::Claims;
pub use jwt::JwtKeys;
pub use password::{hash_password, verify_password};
