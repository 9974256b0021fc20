//! Data types returned by the Jenkins JSON API.

mod build;
mod job;
mod queue_item;

pub use self::build::*;
pub use self::job::*;
pub use self::queue_item::*;
