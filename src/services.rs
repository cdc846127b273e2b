pub mod access;
pub mod auth;
pub mod authz;
pub mod course_service;
pub mod diploma_service;
pub mod invite_service;
pub mod notification;
pub mod progress_service;
pub mod quiz;
pub mod registry;
pub mod tenancy_service;
pub mod user_service;

#[cfg(test)]
pub mod testing;
