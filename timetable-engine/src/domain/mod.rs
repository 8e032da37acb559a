//! Domain value types for the timetable engine.
//!
//! These types enforce their invariants at construction time, so code that
//! receives them can trust their validity.

mod stop;
mod time;

pub use stop::{InvalidStopCode, Stop, StopCode};
pub use time::{ScheduleTime, TimeError, seconds};
