// ABOUTME: Notification-driven render engine
// ABOUTME: Render cache, splay scheduling, and the controller state machine

pub mod cache;
pub mod controller;
pub mod error;
pub mod result;
pub mod scheduler;

pub use cache::RenderCache;
pub use controller::Controller;
pub use error::{EngineError, Result};
pub use result::{ApplyOutcome, BatchReport, EngineState};
pub use scheduler::SplayScheduler;
