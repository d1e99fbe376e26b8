pub mod course;
pub mod state;

pub use course::{Course, Room};
pub use state::ScheduleState;
