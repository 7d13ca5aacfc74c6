//! AIMM Core — domain types, configuration, session record and errors.

pub mod config;
pub mod error;
pub mod session;
pub mod types;

pub use config::AimmConfig;
pub use error::{Error, Result};
pub use session::LoggedUser;
pub use types::*;
