//src/main.rs

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Settings};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ikontroll_portal=debug,tower_http=info".into()),
        )
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let settings = Settings::from_env().context("Falha ao carregar a configuração")?;
    let bind_addr = settings.bind_addr.clone();

    let app_state = AppState::new(settings)
        .await
        .context("Falha ao inicializar o estado da aplicação")?;

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {bind_addr}"))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Erro no servidor Axum")?;
    Ok(())
}

fn router(app_state: AppState) -> Router {
    // Rotas públicas de autenticação
    let auth_routes = Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/magic-login", post(handlers::auth::magic_login));

    // Rotas internas: o `idToken` vem no corpo, sem guard de cabeçalho
    let internal_routes = Router::new()
        .route("/users/create", post(handlers::users::create_user))
        .route("/users/update", post(handlers::users::update_user))
        .route("/users/delete", post(handlers::users::delete_user))
        .route("/registry/search", post(handlers::registry::search_companies))
        .route("/invites", post(handlers::invites::create_invite))
        .route("/completions", post(handlers::progress::record_completion))
        .route("/diplomas", post(handlers::diplomas::generate_diploma));

    let session_routes = Router::new()
        .route("/", get(handlers::auth::get_session))
        .route("/password", post(handlers::auth::change_password));

    let company_routes = Router::new()
        .route(
            "/",
            post(handlers::companies::create_company).get(handlers::companies::list_companies),
        )
        .route(
            "/{id}",
            get(handlers::companies::get_company)
                .put(handlers::companies::update_company)
                .delete(handlers::companies::delete_company),
        )
        .route(
            "/{id}/customers",
            get(handlers::companies::list_customers).post(handlers::companies::create_customer),
        )
        .route("/{id}/courses", get(handlers::companies::list_courses))
        .route("/{id}/diploma-templates", get(handlers::companies::list_diploma_templates));

    let customer_routes = Router::new()
        .route(
            "/{id}",
            get(handlers::customers::get_customer)
                .put(handlers::customers::update_customer)
                .delete(handlers::customers::delete_customer),
        )
        .route("/{id}/sub-units", get(handlers::customers::list_sub_units))
        .route("/{id}/users", get(handlers::customers::list_users))
        .route(
            "/{id}/users/{user_id}/course-access",
            post(handlers::customers::set_course_access),
        )
        .route("/{id}/course-access/bulk", post(handlers::customers::bulk_course_access));

    let course_routes = Router::new()
        .route("/", post(handlers::courses::create_course))
        .route("/assigned", get(handlers::courses::list_assigned_courses))
        .route(
            "/{id}",
            get(handlers::courses::get_course)
                .put(handlers::courses::update_course)
                .delete(handlers::courses::delete_course),
        )
        .route(
            "/{id}/modules",
            get(handlers::courses::list_modules).post(handlers::courses::create_module),
        )
        .route("/{id}/modules/order", put(handlers::courses::reorder_modules))
        .route(
            "/{id}/modules/{module_id}",
            get(handlers::courses::get_module)
                .put(handlers::courses::update_module)
                .delete(handlers::courses::delete_module),
        )
        .route("/{id}/progress", get(handlers::progress::get_progress))
        .route(
            "/{id}/modules/{module_id}/complete",
            post(handlers::progress::complete_module),
        )
        .route("/{id}/modules/{module_id}/quiz", post(handlers::progress::submit_quiz));

    let diploma_routes = Router::new()
        .route("/", post(handlers::diplomas::create_template))
        .route(
            "/{id}",
            get(handlers::diplomas::get_template)
                .put(handlers::diplomas::update_template)
                .delete(handlers::diplomas::delete_template),
        );

    let me_routes = Router::new().route("/completions", get(handlers::progress::list_my_completions));

    let invite_routes = Router::new().route("/redeem", post(handlers::invites::redeem_invite));

    // Tudo o que usa `Authorization: Bearer`
    let protected = Router::new()
        .nest("/session", session_routes)
        .nest("/companies", company_routes)
        .nest("/customers", customer_routes)
        .nest("/courses", course_routes)
        .nest("/diploma-templates", diploma_routes)
        .nest("/me", me_routes)
        .nest("/invites", invite_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/internal", internal_routes)
        .nest("/api", protected)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
