pub mod auth;
pub mod bootstrap;
pub mod chat;
pub mod email;
pub mod error;
pub mod identity;
pub mod routes;
pub mod state;

pub use auth::{AuthenticatedUser, IdentityHandle};
pub use bootstrap::bootstrap_admins;
pub use chat::ChatRelay;
pub use identity::JwtIdentityProvider;
pub use routes::build_router;
pub use state::AppState;
