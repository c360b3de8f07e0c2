// Middleware modules: bearer authentication, admin gate, CORS

pub mod auth;
pub mod auth_middleware;
pub mod cors;

pub use auth::AuthenticatedUser;
pub use auth_middleware::{auth_middleware, require_admin};
pub use cors::{dynamic_cors_middleware, CorsPolicy};
