pub mod api;
pub mod command;
pub mod config;
pub mod desk;
pub mod error;
pub mod models;
pub mod render;
pub mod state;

// Re-export commonly used items for tests / external users
pub use api::ReviewApi;
pub use desk::ReviewDesk;
pub use error::{ClientError, ClientResult};
