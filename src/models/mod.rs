//! Data models for roster and absence entities

mod absence;
mod presence;
mod user;

pub use absence::*;
pub use presence::*;
pub use user::*;
