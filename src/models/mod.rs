pub mod assessment;
pub mod blueprint;
pub mod question;
pub mod submission;
