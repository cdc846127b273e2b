pub mod auth;
pub mod companies;
pub mod courses;
pub mod customers;
pub mod diplomas;
pub mod invites;
pub mod progress;
pub mod registry;
pub mod users;
