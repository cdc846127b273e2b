// src/services/authz.rs

//! Regras de autorização por papel: dono do sistema, admin de cliente, consumidor.
//! Conteúdo da empresa (cursos, modelos de diploma, lista de clientes) é do dono
//! do sistema; admins de cliente só administram o próprio cliente e as suas
//! sub-unidades.

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CustomerRepository, MembershipRepository},
    models::{
        auth::User,
        course::Course,
        customer::Customer,
        membership::{MemberRole, Membership},
    },
};

#[derive(Clone)]
pub struct AccessPolicy {
    customer_repo: CustomerRepository,
    membership_repo: MembershipRepository,
}

impl AccessPolicy {
    pub fn new(customer_repo: CustomerRepository, membership_repo: MembershipRepository) -> Self {
        Self { customer_repo, membership_repo }
    }

    pub fn ensure_system_owner(&self, user: &User) -> Result<(), AppError> {
        if user.is_system_owner {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Devolve o cliente quando o usuário pode administrá-lo.
    pub async fn ensure_customer_admin(&self, user: &User, customer_id: Uuid) -> Result<Customer, AppError> {
        let customer = self
            .customer_repo
            .find_by_id(customer_id)
            .await?
            .ok_or(AppError::CustomerNotFound)?;

        if user.is_system_owner {
            return Ok(customer);
        }

        let chain = self.customer_repo.ancestor_ids(customer_id).await?;
        let memberships = self.membership_repo.list_for_user(user.id).await?;

        if admin_of_any(&memberships, &chain) {
            Ok(customer)
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Leitura do catálogo da empresa: dono do sistema ou admin de algum
    /// cliente dela (precisa ver os cursos para atribuí-los).
    pub async fn ensure_company_reader(&self, user: &User, company_id: Uuid) -> Result<(), AppError> {
        if user.is_system_owner {
            return Ok(());
        }

        let memberships = self.membership_repo.list_for_user(user.id).await?;
        let admin_customer_ids: Vec<Uuid> = memberships
            .iter()
            .filter(|m| m.has_role(MemberRole::Admin))
            .map(|m| m.customer_id)
            .collect();

        let customers = self.customer_repo.list_by_ids(&admin_customer_ids).await?;
        if customers.iter().any(|c| c.company_id == company_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Consumidor precisa do curso atribuído; admins de cliente da empresa só leem.
    pub async fn ensure_course_reader(&self, user: &User, course: &Course) -> Result<(), AppError> {
        if user.is_system_owner {
            return Ok(());
        }

        let memberships = self.membership_repo.list_for_user(user.id).await?;
        if memberships.iter().any(|m| m.is_assigned(course.id)) {
            return Ok(());
        }

        self.ensure_company_reader(user, course.company_id).await
    }

    /// Cadeias de ancestrais de cada cliente ao qual o usuário pertence.
    async fn customer_chains(&self, user_id: Uuid) -> Result<Vec<Vec<Uuid>>, AppError> {
        let memberships = self.membership_repo.list_for_user(user_id).await?;
        let mut chains = Vec::with_capacity(memberships.len());
        for membership in &memberships {
            chains.push(self.customer_repo.ancestor_ids(membership.customer_id).await?);
        }
        Ok(chains)
    }

    /// Admin de pelo menos um dos clientes do usuário alvo.
    pub async fn ensure_admin_over_user(&self, actor: &User, target_user_id: Uuid) -> Result<(), AppError> {
        if actor.is_system_owner || actor.id == target_user_id {
            return Ok(());
        }

        let actor_memberships = self.membership_repo.list_for_user(actor.id).await?;
        let chains = self.customer_chains(target_user_id).await?;

        if chains.iter().any(|chain| admin_of_any(&actor_memberships, chain)) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Nome, e-mail e telefone são globais: só quem administra todos os
    /// clientes do usuário pode mudá-los. Perfil do dono do sistema é intocável.
    pub async fn ensure_profile_editor(&self, actor: &User, target: &User) -> Result<(), AppError> {
        if actor.is_system_owner || actor.id == target.id {
            return Ok(());
        }
        if target.is_system_owner {
            return Err(AppError::Forbidden);
        }

        let actor_memberships = self.membership_repo.list_for_user(actor.id).await?;
        let chains = self.customer_chains(target.id).await?;

        if administers_every(&actor_memberships, &chains) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

/// Algum registro com papel admin num dos clientes da cadeia?
pub fn admin_of_any(memberships: &[Membership], customer_chain: &[Uuid]) -> bool {
    memberships
        .iter()
        .any(|m| m.has_role(MemberRole::Admin) && customer_chain.contains(&m.customer_id))
}

/// Admin sobre todas as cadeias (e há pelo menos uma).
pub fn administers_every(memberships: &[Membership], customer_chains: &[Vec<Uuid>]) -> bool {
    !customer_chains.is_empty() && customer_chains.iter().all(|chain| admin_of_any(memberships, chain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::Fixture;
    use chrono::Utc;
    use sqlx::PgPool;

    fn membership(customer_id: Uuid, roles: &[&str]) -> Membership {
        Membership {
            user_id: Uuid::new_v4(),
            customer_id,
            roles: roles.iter().map(|r| r.to_string()).collect(),
            assigned_course_ids: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn parent_admin_covers_sub_units() {
        let (parent, child) = (Uuid::new_v4(), Uuid::new_v4());
        let memberships = vec![membership(parent, &["admin"])];

        // Cadeia do filho: [filho, pai]
        assert!(admin_of_any(&memberships, &[child, parent]));
        // Cadeia do pai não inclui o filho
        let child_admin = vec![membership(child, &["admin"])];
        assert!(!admin_of_any(&child_admin, &[parent]));
    }

    #[test]
    fn plain_users_are_not_admins() {
        let customer = Uuid::new_v4();
        assert!(!admin_of_any(&[membership(customer, &["user"])], &[customer]));
    }

    #[test]
    fn shared_users_need_admin_on_every_customer() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let admin_of_a = vec![membership(a, &["admin"])];

        assert!(administers_every(&admin_of_a, &[vec![a]]));
        assert!(!administers_every(&admin_of_a, &[vec![a], vec![b]]));
        assert!(!administers_every(&admin_of_a, &[]));
    }

    #[sqlx::test]
    async fn customer_admin_only_reads_company_catalog(pool: PgPool) {
        let fx = Fixture::new(pool).await;
        let customer_a = fx.customer("Kunde A", None).await;
        let customer_b = fx.customer("Kunde B", None).await;
        let admin = fx.member("mallory@kunde-a.no", customer_a.id, &["admin", "user"]).await;
        let policy = &fx.policy;

        assert!(policy.ensure_company_reader(&admin, fx.company.id).await.is_ok());
        assert!(policy.ensure_customer_admin(&admin, customer_a.id).await.is_ok());
        assert!(matches!(
            policy.ensure_customer_admin(&admin, customer_b.id).await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(policy.ensure_system_owner(&admin), Err(AppError::Forbidden)));
    }

    #[sqlx::test]
    async fn sub_unit_admin_does_not_reach_parent(pool: PgPool) {
        let fx = Fixture::new(pool).await;
        let parent = fx.customer("Kommune", None).await;
        let child = fx.customer("Avdeling Nord", Some(parent.id)).await;
        let parent_admin = fx.member("leder@kommune.no", parent.id, &["admin"]).await;
        let child_admin = fx.member("leder@nord.no", child.id, &["admin"]).await;

        assert!(fx.policy.ensure_customer_admin(&parent_admin, child.id).await.is_ok());
        assert!(fx.policy.ensure_customer_admin(&child_admin, child.id).await.is_ok());
        assert!(matches!(
            fx.policy.ensure_customer_admin(&child_admin, parent.id).await,
            Err(AppError::Forbidden)
        ));
    }

    #[sqlx::test]
    async fn profile_of_shared_user_is_locked_for_single_customer_admin(pool: PgPool) {
        let fx = Fixture::new(pool).await;
        let customer_a = fx.customer("Kunde A", None).await;
        let customer_b = fx.customer("Kunde B", None).await;
        let admin_a = fx.member("admin@kunde-a.no", customer_a.id, &["admin"]).await;
        let only_a = fx.member("kari@kunde-a.no", customer_a.id, &["user"]).await;
        let shared = fx.member("ola@begge.no", customer_a.id, &["user"]).await;
        fx.attach(&shared, customer_b.id, &["user"]).await;

        assert!(fx.policy.ensure_profile_editor(&admin_a, &only_a).await.is_ok());
        assert!(matches!(
            fx.policy.ensure_profile_editor(&admin_a, &shared).await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            fx.policy.ensure_profile_editor(&admin_a, &fx.owner).await,
            Err(AppError::Forbidden)
        ));
        assert!(fx.policy.ensure_profile_editor(&fx.owner, &shared).await.is_ok());

        // Admin de A ainda pode agir sobre o usuário compartilhado (ex.: diploma)
        assert!(fx.policy.ensure_admin_over_user(&admin_a, shared.id).await.is_ok());
        let stranger = fx.member("nils@kunde-b.no", customer_b.id, &["user"]).await;
        assert!(matches!(
            fx.policy.ensure_admin_over_user(&admin_a, stranger.id).await,
            Err(AppError::Forbidden)
        ));
    }
}
