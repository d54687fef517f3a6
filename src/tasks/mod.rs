//! The task working set: the record model and the multi-database
//! repository that loads, saves, and relocates it.

pub mod models;
pub mod repository;

pub use models::Task;
pub use repository::TaskRepository;
