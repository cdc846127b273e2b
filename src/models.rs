pub mod auth;
pub mod company;
pub mod course;
pub mod customer;
pub mod diploma;
pub mod invite;
pub mod membership;
pub mod progress;
pub mod registry;
