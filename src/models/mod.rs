pub mod task;
pub mod user;

pub use task::{NewTask, Task, TaskId, TaskInput, TaskPatch};
pub use user::{Credentials, Identity, Session, UserProfile};
