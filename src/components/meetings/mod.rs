pub mod models;
mod repository;
pub mod validation;

pub use models::{Conference, Meeting, MeetingDraft, MeetingPatch, MeetingStatus, PatchEffect};
pub use repository::{MeetingFilter, MeetingRepository};
