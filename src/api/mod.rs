pub mod attendance;
pub mod courses;
pub mod dashboard;
pub mod events;
pub mod grades;
pub mod notifications;
pub mod reports;
pub mod students;
pub mod survey;
pub mod survey_questions;
pub mod upload;
pub mod users;
