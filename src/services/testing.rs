// src/services/testing.rs

//! Dados de apoio para os testes com banco (`#[sqlx::test]` entrega uma base
//! nova e migrada por teste).

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, locale_map::LocaleText},
    config::{AppState, Settings},
    db::{user_repo::NewUser, CustomerRepository, MembershipRepository, UserRepository},
    models::{
        auth::User,
        company::{Company, CompanyPayload},
        course::{Course, CoursePayload, CourseStatus},
        customer::{CreateCustomerPayload, Customer, CustomerPayload},
    },
    services::{authz::AccessPolicy, notification::SmsGateway},
};

/// Gateway que só guarda as mensagens.
#[derive(Default)]
pub struct RecordingGateway {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingGateway {
    pub fn recipients(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(to, _)| to.clone()).collect()
    }
}

#[async_trait]
impl SmsGateway for RecordingGateway {
    async fn send(&self, to: &str, message: &str) -> Result<(), AppError> {
        self.sent.lock().unwrap().push((to.to_string(), message.to_string()));
        Ok(())
    }
}

fn settings() -> Settings {
    Settings {
        database_url: String::new(),
        jwt_secret: "segredo-de-teste".into(),
        bind_addr: "127.0.0.1:0".into(),
        database_max_connections: 1,
        sms: None,
        brreg_base_url: "http://127.0.0.1:9".into(),
        fonts_dir: "./fonts".into(),
        portal_base_url: "https://portal.test".into(),
    }
}

pub fn customer_payload(name: &str, parent_customer_id: Option<Uuid>) -> CustomerPayload {
    CustomerPayload {
        name: name.to_string(),
        parent_customer_id,
        org_number: None,
        address: None,
        postal_code: None,
        city: None,
        contact_person: None,
        contact_phone: None,
        contact_email: None,
    }
}

/// Dono do sistema, uma empresa e o estado completo da aplicação.
pub struct Fixture {
    pub pool: PgPool,
    pub state: AppState,
    pub policy: AccessPolicy,
    pub sms: Arc<RecordingGateway>,
    pub owner: User,
    pub company: Company,
}

impl Fixture {
    pub async fn new(pool: PgPool) -> Self {
        let sms = Arc::new(RecordingGateway::default());
        let state = AppState::build(pool.clone(), &settings(), sms.clone()).unwrap();
        let policy = AccessPolicy::new(CustomerRepository::new(pool.clone()), MembershipRepository::new(pool.clone()));

        let created = UserRepository::new(pool.clone())
            .create_user(
                &pool,
                NewUser {
                    company_id: None,
                    name: "Systemeier",
                    email: Some("eier@ikontroll.no"),
                    phone: Some("+4790000000"),
                    password_hash: "x",
                },
            )
            .await
            .unwrap();
        let owner: User = sqlx::query_as("UPDATE users SET is_system_owner = TRUE WHERE id = $1 RETURNING *")
            .bind(created.id)
            .fetch_one(&pool)
            .await
            .unwrap();

        let company = state
            .tenancy_service
            .create_company(
                &owner,
                &CompanyPayload {
                    name: "Brannvern AS".into(),
                    org_number: None,
                    contact_email: None,
                    contact_phone: None,
                },
            )
            .await
            .unwrap();

        Self { pool, state, policy, sms, owner, company }
    }

    pub async fn customer(&self, name: &str, parent_customer_id: Option<Uuid>) -> Customer {
        self.state
            .tenancy_service
            .create_customer_with_admin(
                &self.owner,
                self.company.id,
                &CreateCustomerPayload { customer: customer_payload(name, parent_customer_id), admin: None },
            )
            .await
            .unwrap()
            .customer
    }

    /// Usuário novo ligado ao cliente com os papéis dados.
    pub async fn member(&self, email: &str, customer_id: Uuid, roles: &[&str]) -> User {
        let user = UserRepository::new(self.pool.clone())
            .create_user(
                &self.pool,
                NewUser {
                    company_id: Some(self.company.id),
                    name: email,
                    email: Some(email),
                    phone: None,
                    password_hash: "x",
                },
            )
            .await
            .unwrap();
        self.attach(&user, customer_id, roles).await;
        user
    }

    pub async fn attach(&self, user: &User, customer_id: Uuid, roles: &[&str]) {
        let roles: Vec<String> = roles.iter().map(|r| r.to_string()).collect();
        MembershipRepository::new(self.pool.clone())
            .upsert(&self.pool, user.id, customer_id, &roles, &[])
            .await
            .unwrap();
    }

    pub async fn reload(&self, user_id: Uuid) -> User {
        UserRepository::new(self.pool.clone()).find_by_id(user_id).await.unwrap().unwrap()
    }

    pub async fn course(&self, title: &str) -> Course {
        let mut titles = LocaleText::new();
        titles.insert("no".into(), title.into());
        self.state
            .course_service
            .create_course(
                &self.owner,
                &CoursePayload {
                    company_id: self.company.id,
                    title: titles,
                    description: LocaleText::new(),
                    languages: vec!["no".into()],
                    status: Some(CourseStatus::Active),
                    diploma_template_id: None,
                },
            )
            .await
            .unwrap()
    }

    pub async fn customer_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE company_id = $1")
            .bind(self.company.id)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}
