pub mod auth;
pub mod error;

pub use auth::Actor;
pub use error::AppError;
