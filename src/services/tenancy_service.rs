// src/services/tenancy_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        codes::{random_code, TEMP_PASSWORD_LEN},
        error::AppError,
    },
    db::{
        user_repo::NewUser, CompanyRepository, CustomerRepository, MembershipRepository, UserRepository,
    },
    models::{
        auth::User,
        company::{Company, CompanyPayload},
        customer::{CreateCustomerPayload, CreateCustomerResponse, Customer, CustomerPayload},
        membership::MemberRole,
    },
    services::{
        auth::hash_password, authz::AccessPolicy, notification::{normalize_phone, NotificationService},
    },
};

#[derive(Clone)]
pub struct TenancyService {
    company_repo: CompanyRepository,
    customer_repo: CustomerRepository,
    user_repo: UserRepository,
    membership_repo: MembershipRepository,
    policy: AccessPolicy,
    notifications: NotificationService,
    pool: PgPool, // Usamos a pool para iniciar transações
}

impl TenancyService {
    pub fn new(
        company_repo: CompanyRepository,
        customer_repo: CustomerRepository,
        user_repo: UserRepository,
        membership_repo: MembershipRepository,
        policy: AccessPolicy,
        notifications: NotificationService,
        pool: PgPool,
    ) -> Self {
        Self { company_repo, customer_repo, user_repo, membership_repo, policy, notifications, pool }
    }

    // =========================================================================
    //  1. EMPRESAS (apenas dono do sistema)
    // =========================================================================

    pub async fn create_company(&self, actor: &User, input: &CompanyPayload) -> Result<Company, AppError> {
        self.policy.ensure_system_owner(actor)?;
        let company = self.company_repo.create(input).await?;
        tracing::info!(company_id = %company.id, "Empresa criada");
        Ok(company)
    }

    pub async fn list_companies(&self, actor: &User) -> Result<Vec<Company>, AppError> {
        self.policy.ensure_system_owner(actor)?;
        self.company_repo.list().await
    }

    pub async fn get_company(&self, actor: &User, id: Uuid) -> Result<Company, AppError> {
        self.policy.ensure_company_reader(actor, id).await?;
        self.company_repo.find_by_id(id).await?.ok_or(AppError::CompanyNotFound)
    }

    pub async fn update_company(&self, actor: &User, id: Uuid, input: &CompanyPayload) -> Result<Company, AppError> {
        self.policy.ensure_system_owner(actor)?;
        self.company_repo.update(id, input).await
    }

    pub async fn delete_company(&self, actor: &User, id: Uuid) -> Result<(), AppError> {
        self.policy.ensure_system_owner(actor)?;
        self.company_repo.delete(id).await?;
        tracing::info!(company_id = %id, "Empresa removida");
        Ok(())
    }

    // =========================================================================
    //  2. CLIENTES E SUB-UNIDADES
    // =========================================================================

    /// Sub-unidade só pode ter pai da mesma empresa, e nunca a si mesma
    /// (nem um descendente) como ancestral.
    async fn validate_parent(
        &self,
        company_id: Uuid,
        customer_id: Option<Uuid>,
        parent_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let Some(parent_id) = parent_id else {
            return Ok(());
        };

        let parent = self
            .customer_repo
            .find_by_id(parent_id)
            .await?
            .ok_or(AppError::InvalidParentCustomer)?;

        if parent.company_id != company_id {
            return Err(AppError::InvalidParentCustomer);
        }

        if let Some(customer_id) = customer_id {
            let parent_chain = self.customer_repo.ancestor_ids(parent_id).await?;
            if parent_chain.contains(&customer_id) {
                return Err(AppError::InvalidParentCustomer);
            }
        }

        Ok(())
    }

    /// Cria o cliente e, atomicamente, o seu primeiro administrador.
    /// Se a criação do admin falhar, o cliente não fica gravado.
    pub async fn create_customer_with_admin(
        &self,
        actor: &User,
        company_id: Uuid,
        input: &CreateCustomerPayload,
    ) -> Result<CreateCustomerResponse, AppError> {
        match input.customer.parent_customer_id {
            // Sub-unidade: basta administrar o pai
            Some(parent_id) => {
                self.policy.ensure_customer_admin(actor, parent_id).await?;
            }
            None => self.policy.ensure_system_owner(actor)?,
        }

        self.company_repo
            .find_by_id(company_id)
            .await?
            .ok_or(AppError::CompanyNotFound)?;
        self.validate_parent(company_id, None, input.customer.parent_customer_id).await?;

        // 1. Inicia a transação
        let mut tx = self.pool.begin().await?;

        // 2. Cria o cliente
        let customer = self.customer_repo.create(&mut *tx, company_id, &input.customer).await?;

        // 3. Cria (ou reaproveita) o admin. Qualquer erro aqui desfaz o passo 2.
        let mut new_admin: Option<(User, String)> = None;
        let mut admin_user_id = None;

        if let Some(admin) = &input.admin {
            let phone = match admin.phone.as_deref() {
                Some(raw) => Some(normalize_phone(raw).ok_or_else(|| AppError::InvalidInput("phone".into()))?),
                None => None,
            };

            let existing = self
                .user_repo
                .find_by_contact(&mut *tx, admin.email.as_deref(), phone.as_deref())
                .await?;

            let user = match existing {
                Some(user) if user.is_system_owner => return Err(AppError::Forbidden),
                Some(user) => user,
                None => {
                    let temp_password = random_code(TEMP_PASSWORD_LEN);
                    let hashed = hash_password(&temp_password).await?;
                    let user = self
                        .user_repo
                        .create_user(
                            &mut *tx,
                            NewUser {
                                company_id: Some(company_id),
                                name: &admin.name,
                                email: admin.email.as_deref(),
                                phone: phone.as_deref(),
                                password_hash: &hashed,
                            },
                        )
                        .await?;
                    new_admin = Some((user.clone(), temp_password));
                    user
                }
            };

            let roles = vec![MemberRole::Admin.as_str().to_string(), MemberRole::User.as_str().to_string()];
            self.membership_repo
                .upsert(&mut *tx, user.id, customer.id, &roles, &[])
                .await?;
            admin_user_id = Some(user.id);
        }

        // 4. Commit
        tx.commit().await?;

        tracing::info!(customer_id = %customer.id, company_id = %company_id, "Cliente criado");

        // 5. SMS só depois do commit; falhas são engolidas
        if let Some((user, temp_password)) = new_admin {
            self.notifications.send_welcome(&user, &temp_password).await;
        }

        Ok(CreateCustomerResponse { customer, admin_user_id })
    }

    pub async fn get_customer(&self, actor: &User, id: Uuid) -> Result<Customer, AppError> {
        self.policy.ensure_customer_admin(actor, id).await
    }

    pub async fn list_customers(&self, actor: &User, company_id: Uuid) -> Result<Vec<Customer>, AppError> {
        self.policy.ensure_system_owner(actor)?;
        self.customer_repo.list_by_company(company_id).await
    }

    pub async fn list_sub_units(&self, actor: &User, id: Uuid) -> Result<Vec<Customer>, AppError> {
        self.policy.ensure_customer_admin(actor, id).await?;
        self.customer_repo.list_children(id).await
    }

    pub async fn update_customer(&self, actor: &User, id: Uuid, input: &CustomerPayload) -> Result<Customer, AppError> {
        let current = self.policy.ensure_customer_admin(actor, id).await?;

        // Mudar de pai é mover a sub-unidade: exige poder sobre o novo pai também
        if input.parent_customer_id != current.parent_customer_id {
            match input.parent_customer_id {
                Some(parent_id) => {
                    self.policy.ensure_customer_admin(actor, parent_id).await?;
                }
                None => self.policy.ensure_system_owner(actor)?,
            }
            self.validate_parent(current.company_id, Some(id), input.parent_customer_id).await?;
        }

        self.customer_repo.update(id, input).await
    }

    pub async fn delete_customer(&self, actor: &User, id: Uuid) -> Result<(), AppError> {
        let customer = self.policy.ensure_customer_admin(actor, id).await?;
        if customer.parent_customer_id.is_none() {
            self.policy.ensure_system_owner(actor)?;
        }
        self.customer_repo.delete(id).await?;
        tracing::info!(customer_id = %id, "Cliente removido");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::customer::CustomerAdminPayload,
        services::testing::{customer_payload, Fixture},
    };

    fn with_admin(name: &str, admin: CustomerAdminPayload) -> CreateCustomerPayload {
        CreateCustomerPayload { customer: customer_payload(name, None), admin: Some(admin) }
    }

    #[sqlx::test]
    async fn failed_admin_step_leaves_no_customer(pool: PgPool) {
        let fx = Fixture::new(pool).await;
        let tenancy = &fx.state.tenancy_service;

        // Telefone inválido: o erro acontece depois do INSERT do cliente
        let bad_phone = with_admin(
            "Kunde uten admin",
            CustomerAdminPayload { name: "Per".into(), email: None, phone: Some("12".into()) },
        );
        let err = tenancy.create_customer_with_admin(&fx.owner, fx.company.id, &bad_phone).await;
        assert!(matches!(err, Err(AppError::InvalidInput(_))));

        // Nem e-mail nem telefone: o CHECK da tabela users rejeita dentro da transação
        let no_contact = with_admin(
            "Kunde uten kontakt",
            CustomerAdminPayload { name: "Per".into(), email: None, phone: None },
        );
        assert!(tenancy.create_customer_with_admin(&fx.owner, fx.company.id, &no_contact).await.is_err());

        assert_eq!(fx.customer_count().await, 0);

        let ok = with_admin(
            "Kunde A",
            CustomerAdminPayload { name: "Kari".into(), email: Some("kari@kunde-a.no".into()), phone: None },
        );
        let created = tenancy.create_customer_with_admin(&fx.owner, fx.company.id, &ok).await.unwrap();
        assert!(created.admin_user_id.is_some());
        assert_eq!(fx.customer_count().await, 1);
    }

    #[sqlx::test]
    async fn system_owner_is_never_attached_as_customer_admin(pool: PgPool) {
        let fx = Fixture::new(pool).await;

        let payload = with_admin(
            "Kunde A",
            CustomerAdminPayload { name: "Eier".into(), email: fx.owner.email.clone(), phone: None },
        );
        let result = fx
            .state
            .tenancy_service
            .create_customer_with_admin(&fx.owner, fx.company.id, &payload)
            .await;

        assert!(matches!(result, Err(AppError::Forbidden)));
        assert_eq!(fx.customer_count().await, 0);
    }

    #[sqlx::test]
    async fn customer_admin_cannot_list_other_customers(pool: PgPool) {
        let fx = Fixture::new(pool).await;
        let customer_a = fx.customer("Kunde A", None).await;
        let customer_b = fx.customer("Kunde B", None).await;
        let admin = fx.member("mallory@kunde-a.no", customer_a.id, &["admin"]).await;
        let tenancy = &fx.state.tenancy_service;

        assert!(matches!(tenancy.list_customers(&admin, fx.company.id).await, Err(AppError::Forbidden)));
        assert!(matches!(tenancy.get_customer(&admin, customer_b.id).await, Err(AppError::Forbidden)));
        assert!(matches!(tenancy.delete_customer(&admin, customer_a.id).await, Err(AppError::Forbidden)));
        assert_eq!(tenancy.get_customer(&admin, customer_a.id).await.unwrap().id, customer_a.id);
        assert_eq!(tenancy.list_customers(&fx.owner, fx.company.id).await.unwrap().len(), 2);
    }

    #[sqlx::test]
    async fn sub_unit_admin_cannot_escape_to_top_level(pool: PgPool) {
        let fx = Fixture::new(pool).await;
        let parent = fx.customer("Kommune", None).await;
        let parent_admin = fx.member("leder@kommune.no", parent.id, &["admin"]).await;
        let tenancy = &fx.state.tenancy_service;

        let child = tenancy
            .create_customer_with_admin(
                &parent_admin,
                fx.company.id,
                &CreateCustomerPayload { customer: customer_payload("Avdeling Nord", Some(parent.id)), admin: None },
            )
            .await
            .unwrap()
            .customer;

        // Tirar o pai transforma a sub-unidade em cliente de topo: só o dono
        let detached = customer_payload("Avdeling Nord", None);
        assert!(matches!(
            tenancy.update_customer(&parent_admin, child.id, &detached).await,
            Err(AppError::Forbidden)
        ));
        tenancy.delete_customer(&parent_admin, child.id).await.unwrap();
        assert_eq!(fx.customer_count().await, 1);
    }
}
