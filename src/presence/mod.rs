//! Presence core: payload normalization and online/offline resolution.

pub mod dates;
pub mod normalize;
pub mod resolve;

pub use normalize::{normalize_absences, normalize_users, source_payload};
pub use resolve::{resolve, summarize};
