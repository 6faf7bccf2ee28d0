//! API Module
//!
//! The HTTP gateway in front of the worker.
//!
//! # Endpoints
//! - `/__sw/*` - Control API delivering platform events (push, sync, messages)
//! - everything else - Page requests, run through the worker's fetch handling

pub mod handlers;
pub mod mailboxes;
pub mod routes;

pub use handlers::*;
pub use mailboxes::Mailboxes;
pub use routes::create_router;
