//! AIMM Client — backend HTTP client, factor catalog and editor session.
//!
//! Network calls are async and single-shot; the diagram itself stays
//! synchronous inside [`EditorSession`].

pub mod catalog;
pub mod client;
pub mod session;

pub use catalog::FactorCatalog;
pub use client::ApiClient;
pub use session::EditorSession;
