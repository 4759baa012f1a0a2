pub mod app;
pub mod auth;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;
pub mod utils;

pub use app::create_app;
pub use auth::AuthService;
pub use db::{Database, MemoryDatabase};
pub use state::AppState;
pub use utils::{ApiError, ApiResult, Config};
