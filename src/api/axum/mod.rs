mod cors;
mod error;
mod handlers;
mod middleware;
mod routes;

pub use cors::{custom as custom_cors, default as default_cors, permissive as permissive_cors};
pub use error::AppError;
#[cfg(any(test, feature = "mocks"))]
pub use middleware::MockSessionResolver;
pub use middleware::{AuthenticatedActor, SessionResolver, extract_bearer_token};
pub use routes::{AppState, TeamStore, invitation_routes, team_routes, verification_routes};
