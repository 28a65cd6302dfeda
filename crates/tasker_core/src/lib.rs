pub mod calendar;
pub mod clock;
pub mod completion;
pub mod config;
pub mod dates;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod recurrence;
pub mod storage;
pub mod task_api;
pub mod views;
