pub mod jwt;
pub mod token;

pub use jwt::{ACCESS_TOKEN_TTL_SECS, AccessTokenClaims, create_access_token, validate_access_token};
pub use token::{generate_impersonation_token, generate_sign_in_code, hash_sign_in_code};
