pub mod client;
pub mod notification;
pub mod task;
pub mod team;
pub mod user;

pub use client::{Client, ClientStatus};
pub use notification::{Notification, NotificationKind};
pub use task::{Priority, Task, TaskStatus, TaskUpdate};
pub use team::Group;
pub use user::{GroupName, Role, User};
