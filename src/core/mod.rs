pub mod calendar;
pub mod color;
pub mod plan;
pub mod task;
