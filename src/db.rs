pub mod company_repo;
pub use company_repo::CompanyRepository;
pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
pub mod membership_repo;
pub use membership_repo::MembershipRepository;
pub mod course_repo;
pub use course_repo::CourseRepository;
pub mod module_repo;
pub use module_repo::ModuleRepository;
pub mod progress_repo;
pub use progress_repo::ProgressRepository;
pub mod diploma_repo;
pub use diploma_repo::DiplomaRepository;
pub mod invite_repo;
pub use invite_repo::InviteRepository;
