pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod prompt;
pub mod provider;
pub mod rate_limiter;
pub mod response;
pub mod server;
pub mod store;
pub mod validation;

pub use config::Config;
pub use error::{ProxyError, Result};
pub use handlers::AppState;
pub use server::create_app;
