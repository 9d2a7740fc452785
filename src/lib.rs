#![doc = "The `tasks_gateway` library crate."]
#![doc = ""]
#![doc = "A thin REST facade over a hosted auth/data service. Users register and log in"]
#![doc = "through the service's auth API; every `/tasks` request is authenticated by"]
#![doc = "`auth::IdentityMiddleware`, which resolves the caller and binds a task store to"]
#![doc = "their token for the lifetime of that one request."]

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;

pub use backend::Backend;
pub use config::Config;
pub use error::AppError;
