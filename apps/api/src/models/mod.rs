pub mod application;
pub mod job_post;
pub mod profile;
