pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod history;
pub mod medications;
pub mod messages;
pub mod middleware;
pub mod patients;
