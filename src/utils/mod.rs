pub mod config;
pub mod error;
pub mod validation;

pub use config::Config;
pub use error::{ApiError, ApiResult};
