//! Bus timetable matrix construction.
//!
//! Turns a parsed schedule document (stops, journey patterns and vehicle
//! journeys with their calendars) into the stops-by-journeys grid shown to
//! passengers for one date: "which buses run today, and when do they call
//! at each stop?"

pub mod calendar;
pub mod domain;
pub mod expand;
pub mod grouping;
pub mod model;
pub mod timetable;
