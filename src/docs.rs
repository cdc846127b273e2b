// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::magic_login,
        handlers::auth::get_session,
        handlers::auth::change_password,

        // --- Companies ---
        handlers::companies::create_company,
        handlers::companies::list_companies,
        handlers::companies::get_company,
        handlers::companies::update_company,
        handlers::companies::delete_company,
        handlers::companies::list_customers,
        handlers::companies::create_customer,
        handlers::companies::list_courses,
        handlers::companies::list_diploma_templates,

        // --- Customers ---
        handlers::customers::get_customer,
        handlers::customers::update_customer,
        handlers::customers::delete_customer,
        handlers::customers::list_sub_units,
        handlers::customers::list_users,
        handlers::customers::set_course_access,
        handlers::customers::bulk_course_access,

        // --- Courses ---
        handlers::courses::create_course,
        handlers::courses::list_assigned_courses,
        handlers::courses::get_course,
        handlers::courses::update_course,
        handlers::courses::delete_course,
        handlers::courses::list_modules,
        handlers::courses::create_module,
        handlers::courses::reorder_modules,
        handlers::courses::get_module,
        handlers::courses::update_module,
        handlers::courses::delete_module,

        // --- Progress ---
        handlers::progress::get_progress,
        handlers::progress::complete_module,
        handlers::progress::submit_quiz,
        handlers::progress::list_my_completions,
        handlers::progress::record_completion,

        // --- Invites ---
        handlers::invites::create_invite,
        handlers::invites::redeem_invite,

        // --- Diplomas ---
        handlers::diplomas::create_template,
        handlers::diplomas::get_template,
        handlers::diplomas::update_template,
        handlers::diplomas::delete_template,
        handlers::diplomas::generate_diploma,

        // --- Internal ---
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::registry::search_companies,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::MagicLoginPayload,
            models::auth::ChangePasswordPayload,
            models::auth::AuthResponse,
            models::auth::Session,

            // --- Tenancy ---
            models::company::Company,
            models::company::CompanyPayload,
            models::customer::Customer,
            models::customer::CustomerPayload,
            models::customer::CustomerAdminPayload,
            models::customer::CreateCustomerPayload,
            models::customer::CreateCustomerResponse,

            // --- Memberships ---
            models::membership::MemberRole,
            models::membership::Membership,
            models::membership::CustomerUser,
            models::membership::AccessChange,
            models::membership::CourseAccessPayload,
            models::membership::BulkCourseAccessPayload,
            models::membership::BulkAccessOutcome,
            models::membership::CreateUserPayload,
            models::membership::UpdateUserPayload,
            models::membership::DeleteUserPayload,
            models::membership::ProvisionedUser,
            models::membership::DeleteUserResponse,

            // --- Courses ---
            models::course::CourseStatus,
            models::course::ModuleType,
            models::course::Course,
            models::course::CoursePayload,
            models::course::UpdateCoursePayload,
            models::course::QuestionAlternative,
            models::course::CourseQuestion,
            models::course::CourseModule,
            models::course::ModulePayload,
            models::course::ReorderModulesPayload,
            models::course::ModuleMove,

            // --- Progress ---
            models::progress::CourseProgress,
            models::progress::CourseCompletion,
            models::progress::SubmitQuizPayload,
            models::progress::QuizResult,
            models::progress::CourseCompletionStatus,
            models::progress::SubmitQuizResponse,
            models::progress::ProgressResponse,
            models::progress::RecordCompletionPayload,

            // --- Invites ---
            models::invite::CourseInvite,
            models::invite::CreateInvitePayload,
            models::invite::RedeemInvitePayload,

            // --- Diplomas ---
            models::diploma::DiplomaTemplate,
            models::diploma::DiplomaTemplatePayload,
            models::diploma::DiplomaRequest,

            // --- Registry ---
            models::registry::CompanySearchPayload,
            models::registry::CompanySuggestion,
        )
    ),
    tags(
        (name = "Auth", description = "Login, magic link e sessão"),
        (name = "Companies", description = "Empresas (apenas dono do sistema)"),
        (name = "Customers", description = "Clientes e sub-unidades"),
        (name = "Course Access", description = "Atribuição de cursos e convites"),
        (name = "Courses", description = "Cursos multilíngues"),
        (name = "Modules", description = "Módulos e perguntas"),
        (name = "Progress", description = "Quiz, progresso e conclusões"),
        (name = "Diplomas", description = "Modelos e geração de diplomas"),
        (name = "Internal", description = "Rotas com `idToken` no corpo")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
