pub mod google_calendar;
pub mod meetings;
pub mod redis_service;
pub mod store;

pub use google_calendar::MeetProvider;
pub use store::DocumentStore;
