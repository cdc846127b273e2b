// src/services/user_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        codes::{random_code, TEMP_PASSWORD_LEN},
        error::AppError,
    },
    db::{user_repo::NewUser, CourseRepository, MembershipRepository, UserRepository},
    models::{
        auth::User,
        membership::{
            CreateUserPayload, CustomerUser, DeleteUserPayload, DeleteUserResponse, MemberRole, ProvisionedUser,
            UpdateUserPayload,
        },
    },
    services::{
        auth::hash_password,
        authz::AccessPolicy,
        notification::{normalize_phone, NotificationService},
    },
};

/// Papéis sem duplicados, na ordem canônica ("admin" antes de "user").
pub fn role_names(roles: &[MemberRole]) -> Vec<String> {
    [MemberRole::Admin, MemberRole::User]
        .iter()
        .filter(|r| roles.contains(r))
        .map(|r| r.as_str().to_string())
        .collect()
}

/// Une listas de ids mantendo a ordem da primeira.
fn merge_ids(existing: &[Uuid], extra: &[Uuid]) -> Vec<Uuid> {
    let mut merged = existing.to_vec();
    for id in extra {
        if !merged.contains(id) {
            merged.push(*id);
        }
    }
    merged
}

fn clean_phone(phone: Option<&str>) -> Result<Option<String>, AppError> {
    match phone.map(str::trim).filter(|p| !p.is_empty()) {
        Some(raw) => normalize_phone(raw)
            .map(Some)
            .ok_or_else(|| AppError::InvalidInput("phone".into())),
        None => Ok(None),
    }
}

fn clean_email(email: Option<&str>) -> Option<String> {
    email.map(str::trim).filter(|e| !e.is_empty()).map(str::to_lowercase)
}

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    membership_repo: MembershipRepository,
    course_repo: CourseRepository,
    policy: AccessPolicy,
    notifications: NotificationService,
    pool: PgPool,
}

impl UserService {
    pub fn new(
        user_repo: UserRepository,
        membership_repo: MembershipRepository,
        course_repo: CourseRepository,
        policy: AccessPolicy,
        notifications: NotificationService,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, membership_repo, course_repo, policy, notifications, pool }
    }

    /// Cria o usuário (ou liga um existente pelo e-mail/telefone) ao cliente.
    pub async fn create_user(&self, actor: &User, input: &CreateUserPayload) -> Result<ProvisionedUser, AppError> {
        let customer = self.policy.ensure_customer_admin(actor, input.customer_id).await?;

        let email = clean_email(input.email.as_deref());
        let phone = clean_phone(input.phone.as_deref())?;
        if email.is_none() && phone.is_none() {
            return Err(AppError::InvalidInput("email".into()));
        }

        // Só cursos da própria empresa podem ser atribuídos
        for course_id in &input.course_ids {
            match self.course_repo.find_by_id(*course_id).await? {
                Some(c) if c.company_id == customer.company_id => {}
                _ => return Err(AppError::CourseNotFound),
            }
        }

        let mut roles = role_names(&input.roles);
        if roles.is_empty() {
            roles.push(MemberRole::User.as_str().to_string());
        }

        let mut tx = self.pool.begin().await?;

        let existing = self
            .user_repo
            .find_by_contact(&mut *tx, email.as_deref(), phone.as_deref())
            .await?;

        let (user, temp_password) = match existing {
            // Dono do sistema nunca vira membro de cliente
            Some(user) if user.is_system_owner => return Err(AppError::Forbidden),
            Some(user) => (user, None),
            None => {
                let temp_password = random_code(TEMP_PASSWORD_LEN);
                let hashed = hash_password(&temp_password).await?;
                let user = self
                    .user_repo
                    .create_user(
                        &mut *tx,
                        NewUser {
                            company_id: Some(customer.company_id),
                            name: input.name.trim(),
                            email: email.as_deref(),
                            phone: phone.as_deref(),
                            password_hash: &hashed,
                        },
                    )
                    .await?;
                (user, Some(temp_password))
            }
        };

        // Usuário já ligado ao cliente: papéis e cursos somam-se aos atuais
        let current = self.membership_repo.find(&mut *tx, user.id, customer.id).await?;
        let (roles, course_ids) = match &current {
            Some(m) => (
                merge_strings(&m.roles, &roles),
                merge_ids(&m.assigned_course_ids, &input.course_ids),
            ),
            None => (roles, input.course_ids.clone()),
        };

        let membership = self
            .membership_repo
            .upsert(&mut *tx, user.id, customer.id, &roles, &course_ids)
            .await?;

        tx.commit().await?;

        let created = temp_password.is_some();
        tracing::info!(
            actor = %actor.id, user_id = %user.id, customer_id = %customer.id, created,
            "Usuário provisionado"
        );

        if let Some(temp_password) = temp_password {
            self.notifications.send_welcome(&user, &temp_password).await;
        }

        Ok(ProvisionedUser { user_id: user.id, created, membership })
    }

    pub async fn update_user(&self, actor: &User, input: &UpdateUserPayload) -> Result<CustomerUser, AppError> {
        self.policy.ensure_customer_admin(actor, input.customer_id).await?;

        let name = input.name.trim();
        let email = clean_email(input.email.as_deref());
        let phone = clean_phone(input.phone.as_deref())?;

        // Só se edita quem pertence ao cliente
        let membership = self
            .membership_repo
            .find(&self.pool, input.user_id, input.customer_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let target = self
            .user_repo
            .find_by_id(input.user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        // Perfil é global: mudar contato exige administrar todos os clientes do usuário
        let profile_changed = profile_differs(&target, name, email.as_deref(), phone.as_deref());
        if profile_changed {
            self.policy.ensure_profile_editor(actor, &target).await?;
        }

        let mut tx = self.pool.begin().await?;

        let user = if profile_changed {
            self.user_repo
                .update_profile(&mut *tx, target.id, name, email.as_deref(), phone.as_deref())
                .await?
        } else {
            target
        };

        let membership = match &input.roles {
            Some(roles) => {
                let roles = role_names(roles);
                if roles.is_empty() {
                    return Err(AppError::InvalidInput("roles".into()));
                }
                self.membership_repo
                    .upsert(&mut *tx, user.id, input.customer_id, &roles, &membership.assigned_course_ids)
                    .await?
            }
            None => membership,
        };

        tx.commit().await?;
        tracing::info!(actor = %actor.id, user_id = %user.id, "Usuário atualizado");

        Ok(CustomerUser {
            user_id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            roles: membership.roles,
            assigned_course_ids: membership.assigned_course_ids,
            last_login_at: user.last_login_at,
        })
    }

    /// Remove o vínculo; o usuário só some quando não resta nenhum vínculo.
    pub async fn delete_user(&self, actor: &User, input: &DeleteUserPayload) -> Result<DeleteUserResponse, AppError> {
        self.policy.ensure_customer_admin(actor, input.customer_id).await?;

        if actor.id == input.user_id {
            return Err(AppError::Forbidden);
        }

        let target = self
            .user_repo
            .find_by_id(input.user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let mut tx = self.pool.begin().await?;

        let membership_removed = self
            .membership_repo
            .delete(&mut *tx, input.user_id, input.customer_id)
            .await?;
        if !membership_removed {
            return Err(AppError::UserNotFound);
        }

        let remaining = self.membership_repo.count_for_user(&mut *tx, input.user_id).await?;
        let user_deleted = remaining == 0 && !target.is_system_owner;
        if user_deleted {
            self.user_repo.delete(&mut *tx, input.user_id).await?;
        }

        tx.commit().await?;
        tracing::info!(actor = %actor.id, user_id = %input.user_id, user_deleted, "Usuário removido do cliente");

        Ok(DeleteUserResponse { membership_removed, user_deleted })
    }

    pub async fn list_customer_users(&self, actor: &User, customer_id: Uuid) -> Result<Vec<CustomerUser>, AppError> {
        self.policy.ensure_customer_admin(actor, customer_id).await?;
        self.user_repo.list_by_customer(customer_id).await
    }
}

fn profile_differs(user: &User, name: &str, email: Option<&str>, phone: Option<&str>) -> bool {
    let current_email = user.email.as_deref().map(str::to_lowercase);
    user.name != name || current_email.as_deref() != email || user.phone.as_deref() != phone
}

fn merge_strings(existing: &[String], extra: &[String]) -> Vec<String> {
    let mut merged = existing.to_vec();
    for value in extra {
        if !merged.contains(value) {
            merged.push(value.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::Fixture;

    #[test]
    fn roles_are_deduplicated_in_canonical_order() {
        let roles = role_names(&[MemberRole::User, MemberRole::Admin, MemberRole::User]);
        assert_eq!(roles, vec!["admin", "user"]);
        assert!(role_names(&[]).is_empty());
    }

    #[test]
    fn existing_assignments_are_kept_when_attaching() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(merge_ids(&[a], &[b, a]), vec![a, b]);
        assert_eq!(
            merge_strings(&["admin".into()], &["user".into(), "admin".into()]),
            vec!["admin", "user"]
        );
    }

    #[test]
    fn contact_fields_are_cleaned() {
        assert_eq!(clean_email(Some("  Kari@Example.NO ")).as_deref(), Some("kari@example.no"));
        assert_eq!(clean_email(Some("   ")), None);
        assert_eq!(clean_phone(Some("912 34 567")).unwrap().as_deref(), Some("+4791234567"));
        assert_eq!(clean_phone(Some("")).unwrap(), None);
        assert!(matches!(clean_phone(Some("12")), Err(AppError::InvalidInput(_))));
    }

    fn create_payload(customer_id: Uuid, email: &str) -> CreateUserPayload {
        CreateUserPayload {
            customer_id,
            name: "Ny bruker".into(),
            email: Some(email.to_string()),
            phone: None,
            roles: vec![MemberRole::User],
            course_ids: vec![],
        }
    }

    fn update_payload(customer_id: Uuid, user: &User, phone: Option<&str>) -> UpdateUserPayload {
        UpdateUserPayload {
            customer_id,
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: phone.map(str::to_string),
            roles: None,
        }
    }

    #[sqlx::test]
    async fn customer_admin_cannot_take_over_system_owner(pool: PgPool) {
        let fx = Fixture::new(pool).await;
        let customer = fx.customer("Kunde A", None).await;
        let admin = fx.member("mallory@kunde-a.no", customer.id, &["admin", "user"]).await;
        let owner_email = fx.owner.email.clone().unwrap();

        let attach = fx.state.user_service.create_user(&admin, &create_payload(customer.id, &owner_email)).await;
        assert!(matches!(attach, Err(AppError::Forbidden)));

        // Sem vínculo, o dono nem aparece para o admin do cliente
        let hijack = update_payload(customer.id, &fx.owner, Some("99887766"));
        assert!(matches!(
            fx.state.user_service.update_user(&admin, &hijack).await,
            Err(AppError::UserNotFound)
        ));

        let owner = fx.reload(fx.owner.id).await;
        assert_eq!(owner.phone.as_deref(), Some("+4790000000"));
        assert!(fx.sms.recipients().is_empty());
    }

    #[sqlx::test]
    async fn shared_user_contact_is_locked_for_single_customer_admin(pool: PgPool) {
        let fx = Fixture::new(pool).await;
        let customer_a = fx.customer("Kunde A", None).await;
        let customer_b = fx.customer("Kunde B", None).await;
        let admin_a = fx.member("mallory@kunde-a.no", customer_a.id, &["admin"]).await;
        let shared = fx.member("ola@kunde-b.no", customer_b.id, &["user"]).await;

        // Ligar um usuário que já existe noutro cliente continua permitido
        let attached = fx
            .state
            .user_service
            .create_user(&admin_a, &create_payload(customer_a.id, "ola@kunde-b.no"))
            .await
            .unwrap();
        assert!(!attached.created);
        assert_eq!(attached.user_id, shared.id);

        let users = &fx.state.user_service;
        let hijack = update_payload(customer_a.id, &shared, Some("99887766"));
        assert!(matches!(users.update_user(&admin_a, &hijack).await, Err(AppError::Forbidden)));

        // Só papéis, sem mexer no contato: permitido
        let mut roles_only = update_payload(customer_a.id, &shared, None);
        roles_only.roles = Some(vec![MemberRole::Admin, MemberRole::User]);
        let updated = users.update_user(&admin_a, &roles_only).await.unwrap();
        assert_eq!(updated.roles, vec!["admin", "user"]);
        assert_eq!(updated.phone, None);

        // Quem administra os dois clientes pode mudar o contato
        let updated = users.update_user(&fx.owner, &hijack).await.unwrap();
        assert_eq!(updated.phone.as_deref(), Some("+4799887766"));
    }

    #[sqlx::test]
    async fn last_membership_removal_deletes_user(pool: PgPool) {
        let fx = Fixture::new(pool).await;
        let customer = fx.customer("Kunde A", None).await;
        let admin = fx.member("leder@kunde-a.no", customer.id, &["admin"]).await;
        let user = fx.member("kari@kunde-a.no", customer.id, &["user"]).await;
        let users = &fx.state.user_service;

        let own = DeleteUserPayload { customer_id: customer.id, user_id: admin.id };
        assert!(matches!(users.delete_user(&admin, &own).await, Err(AppError::Forbidden)));

        let removed = users
            .delete_user(&admin, &DeleteUserPayload { customer_id: customer.id, user_id: user.id })
            .await
            .unwrap();
        assert!(removed.membership_removed);
        assert!(removed.user_deleted);
    }
}
