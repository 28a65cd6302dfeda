pub mod area;
pub mod task;

pub use area::Area;
pub use task::{Task, TaskKind, TaskState, TaskStatus, normalize_tag};
