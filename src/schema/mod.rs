//! Request and result types exchanged with the calendar engine.

pub mod calendar;
pub mod input;
