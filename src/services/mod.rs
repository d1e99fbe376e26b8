pub mod reconciler;
pub mod scheduler;

pub use reconciler::{Reconciler, TickOutcome, Window};
pub use scheduler::TickScheduler;
