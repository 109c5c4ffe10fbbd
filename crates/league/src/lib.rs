pub mod auth;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod scoring;
pub mod services;

pub use auth::{Caller, Capabilities};
pub use config::LeagueConfig;
pub use error::{LeagueError, Result};
