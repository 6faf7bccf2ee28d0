//! Background Tasks Module
//!
//! Contains async tasks that outlive the event that started them.

pub mod refresh;
pub mod sweep;

pub use refresh::RefreshTasks;
pub use sweep::spawn_idle_client_sweep;
