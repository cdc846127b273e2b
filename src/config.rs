// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        CompanyRepository, CourseRepository, CustomerRepository, DiplomaRepository, InviteRepository,
        MembershipRepository, ModuleRepository, ProgressRepository, UserRepository,
    },
    services::{
        access::AccessService,
        auth::AuthService,
        authz::AccessPolicy,
        course_service::CourseService,
        diploma_service::DiplomaService,
        invite_service::InviteService,
        notification::{DisabledSmsGateway, HttpSmsGateway, NotificationService, SmsConfig, SmsGateway},
        progress_service::ProgressService,
        registry::RegistryClient,
        tenancy_service::TenancyService,
        user_service::UserService,
    },
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_SENDER_ID: &str = "IKontroll";
const DEFAULT_BRREG_URL: &str = "https://data.brreg.no/enhetsregisteret/api";
const DEFAULT_FONTS_DIR: &str = "./fonts";
const DEFAULT_PORTAL_URL: &str = "https://portal.ikontroll.no";

/// Configuração lida do ambiente (`.env` carregado antes).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub database_max_connections: u32,
    // None = SMS desativado
    pub sms: Option<SmsConfig>,
    pub brreg_base_url: String,
    pub fonts_dir: String,
    pub portal_base_url: String,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let database_max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS inválido: {}", raw))?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        // Gateway só é ativado com as três variáveis presentes
        let sms = match (
            env::var("SMS_GATEWAY_URL"),
            env::var("SMS_GATEWAY_USER"),
            env::var("SMS_GATEWAY_PASSWORD"),
        ) {
            (Ok(base_url), Ok(user), Ok(password)) => Some(SmsConfig {
                base_url,
                user,
                password,
                sender_id: var_or("SMS_SENDER_ID", DEFAULT_SENDER_ID),
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: var_or("BIND_ADDR", DEFAULT_BIND_ADDR),
            database_max_connections,
            sms,
            brreg_base_url: var_or("BRREG_BASE_URL", DEFAULT_BRREG_URL),
            fonts_dir: var_or("FONTS_DIR", DEFAULT_FONTS_DIR),
            portal_base_url: var_or("PORTAL_BASE_URL", DEFAULT_PORTAL_URL),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub i18n_store: Arc<I18nStore>,

    // --- Serviços ---
    pub auth_service: AuthService,
    pub access_service: AccessService,
    pub course_service: CourseService,
    pub progress_service: ProgressService,
    pub tenancy_service: TenancyService,
    pub user_service: UserService,
    pub invite_service: InviteService,
    pub diploma_service: DiplomaService,
    pub registry_client: RegistryClient,
}

impl AppState {
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.database_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let gateway: Arc<dyn SmsGateway> = match &settings.sms {
            Some(config) => Arc::new(HttpSmsGateway::new(config.clone())?),
            None => {
                tracing::warn!("Credenciais de SMS ausentes; notificações desativadas");
                Arc::new(DisabledSmsGateway)
            }
        };

        Self::build(db_pool, &settings, gateway)
    }

    /// Monta o gráfico de dependências sobre uma pool já criada.
    pub fn build(db_pool: PgPool, settings: &Settings, gateway: Arc<dyn SmsGateway>) -> anyhow::Result<Self> {
        // --- Repositórios ---
        let user_repo = UserRepository::new(db_pool.clone());
        let membership_repo = MembershipRepository::new(db_pool.clone());
        let company_repo = CompanyRepository::new(db_pool.clone());
        let customer_repo = CustomerRepository::new(db_pool.clone());
        let course_repo = CourseRepository::new(db_pool.clone());
        let module_repo = ModuleRepository::new(db_pool.clone());
        let progress_repo = ProgressRepository::new(db_pool.clone());
        let diploma_repo = DiplomaRepository::new(db_pool.clone());
        let invite_repo = InviteRepository::new(db_pool.clone());

        // --- Serviços ---
        let policy = AccessPolicy::new(customer_repo.clone(), membership_repo.clone());
        let notifications = NotificationService::new(
            gateway,
            user_repo.clone(),
            invite_repo.clone(),
            settings.portal_base_url.clone(),
        );

        let auth_service = AuthService::new(
            user_repo.clone(),
            membership_repo.clone(),
            invite_repo.clone(),
            settings.jwt_secret.clone(),
        );
        let access_service = AccessService::new(
            membership_repo.clone(),
            course_repo.clone(),
            user_repo.clone(),
            policy.clone(),
            notifications.clone(),
            db_pool.clone(),
        );
        let course_service = CourseService::new(
            course_repo.clone(),
            module_repo.clone(),
            membership_repo.clone(),
            diploma_repo.clone(),
            policy.clone(),
            db_pool.clone(),
        );
        let progress_service = ProgressService::new(
            course_repo.clone(),
            module_repo,
            progress_repo.clone(),
            policy.clone(),
        );
        let tenancy_service = TenancyService::new(
            company_repo,
            customer_repo,
            user_repo.clone(),
            membership_repo.clone(),
            policy.clone(),
            notifications.clone(),
            db_pool.clone(),
        );
        let user_service = UserService::new(
            user_repo,
            membership_repo.clone(),
            course_repo.clone(),
            policy.clone(),
            notifications,
            db_pool.clone(),
        );
        let invite_service = InviteService::new(
            invite_repo,
            course_repo.clone(),
            membership_repo,
            policy.clone(),
            db_pool.clone(),
        );
        let diploma_service = DiplomaService::new(
            diploma_repo,
            course_repo,
            progress_repo,
            policy,
            settings.fonts_dir.clone(),
        );
        let registry_client = RegistryClient::new(&settings.brreg_base_url)?;

        Ok(Self {
            db_pool,
            i18n_store: Arc::new(I18nStore::default()),
            auth_service,
            access_service,
            course_service,
            progress_service,
            tenancy_service,
            user_service,
            invite_service,
            diploma_service,
            registry_client,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_fall_back_to_defaults() {
        assert_eq!(var_or("IKONTROLL_SURELY_UNSET_VAR", DEFAULT_BIND_ADDR), "0.0.0.0:3000");
    }
}
