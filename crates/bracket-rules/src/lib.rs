//! Bracket rules engine
//!
//! The parts of the service with real invariants: what a ranking submission
//! must look like, when an episode is ready to advance, and how per-episode
//! standings are rebuilt from the flat list of stored rankings.
//! Nothing here touches storage or HTTP.

pub mod gate;
pub mod standings;
pub mod validate;

pub use gate::{SubmissionStatus, is_ready_to_advance, submission_status};
pub use standings::Standings;
pub use validate::{ValidationError, validate_submission, validate_username};
