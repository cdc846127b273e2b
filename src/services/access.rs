// src/services/access.rs

use uuid::Uuid;

use crate::{
    common::{error::AppError, locale_map::resolve},
    db::{CourseRepository, MembershipRepository, UserRepository},
    models::{
        auth::User,
        course::Course,
        membership::{AccessChange, BulkAccessOutcome, MemberRole, Membership},
    },
    services::{authz::AccessPolicy, notification::NotificationService},
};
use sqlx::PgPool;

/// Aplica a regra de acesso a um registro de cliente.
///
/// Conceder acrescenta o curso e, se faltar, o papel `user` (quem tem curso
/// tem acesso básico). O papel `admin` nunca é mexido por aqui. Revogar só
/// tira o curso; o papel `user` fica. Devolve se algo mudou.
pub fn apply_course_access(membership: &mut Membership, course_id: Uuid, change: AccessChange) -> bool {
    match change {
        AccessChange::Grant => {
            let mut changed = false;
            if !membership.is_assigned(course_id) {
                membership.assigned_course_ids.push(course_id);
                changed = true;
            }
            if !membership.has_role(MemberRole::User) {
                membership.roles.push(MemberRole::User.as_str().to_string());
                changed = true;
            }
            changed
        }
        AccessChange::Revoke => {
            let before = membership.assigned_course_ids.len();
            membership.assigned_course_ids.retain(|id| *id != course_id);
            membership.assigned_course_ids.len() != before
        }
    }
}

/// Versão em lote: pula quem já está no estado pedido.
pub fn bulk_course_access(
    memberships: &mut [Membership],
    course_id: Uuid,
    change: AccessChange,
) -> BulkAccessOutcome {
    let mut outcome = BulkAccessOutcome::default();

    for membership in memberships.iter_mut() {
        let already = membership.is_assigned(course_id);
        let is_noop = match change {
            AccessChange::Grant => already,
            AccessChange::Revoke => !already,
        };

        if is_noop {
            outcome.skipped.push(membership.user_id);
        } else {
            apply_course_access(membership, course_id, change);
            outcome.changed.push(membership.user_id);
        }
    }

    outcome
}

#[derive(Clone)]
pub struct AccessService {
    membership_repo: MembershipRepository,
    course_repo: CourseRepository,
    user_repo: UserRepository,
    policy: AccessPolicy,
    notifications: NotificationService,
    pool: PgPool,
}

impl AccessService {
    pub fn new(
        membership_repo: MembershipRepository,
        course_repo: CourseRepository,
        user_repo: UserRepository,
        policy: AccessPolicy,
        notifications: NotificationService,
        pool: PgPool,
    ) -> Self {
        Self { membership_repo, course_repo, user_repo, policy, notifications, pool }
    }

    /// Curso tem de ser da mesma empresa do cliente.
    async fn assignable_course(&self, company_id: Uuid, course_id: Uuid) -> Result<Course, AppError> {
        self.course_repo
            .find_by_id(course_id)
            .await?
            .filter(|c| c.company_id == company_id)
            .ok_or(AppError::CourseNotFound)
    }

    pub async fn set_course_access(
        &self,
        actor: &User,
        customer_id: Uuid,
        user_id: Uuid,
        course_id: Uuid,
        change: AccessChange,
        notify: bool,
    ) -> Result<Membership, AppError> {
        let customer = self.policy.ensure_customer_admin(actor, customer_id).await?;
        let course = self.assignable_course(customer.company_id, course_id).await?;

        let mut membership = self
            .membership_repo
            .find(&self.pool, user_id, customer_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if !apply_course_access(&mut membership, course_id, change) {
            return Ok(membership);
        }

        let saved = self
            .membership_repo
            .upsert(&self.pool, user_id, customer_id, &membership.roles, &membership.assigned_course_ids)
            .await?;

        tracing::info!(
            actor = %actor.id, user_id = %user_id, course_id = %course_id, ?change,
            "Acesso a curso alterado"
        );

        if change == AccessChange::Grant && notify {
            self.notify_user(user_id, &course).await;
        }

        Ok(saved)
    }

    pub async fn bulk_set_course_access(
        &self,
        actor: &User,
        customer_id: Uuid,
        user_ids: &[Uuid],
        course_id: Uuid,
        change: AccessChange,
        notify: bool,
    ) -> Result<BulkAccessOutcome, AppError> {
        let customer = self.policy.ensure_customer_admin(actor, customer_id).await?;
        let course = self.assignable_course(customer.company_id, course_id).await?;

        let mut memberships = self.membership_repo.list_for_users(customer_id, user_ids).await?;
        let mut outcome = bulk_course_access(&mut memberships, course_id, change);

        // IDs sem registro neste cliente também contam como "pulados"
        for user_id in user_ids {
            if !memberships.iter().any(|m| m.user_id == *user_id) {
                outcome.skipped.push(*user_id);
            }
        }

        // Gravações sequenciais, uma por usuário alterado
        for membership in memberships.iter().filter(|m| outcome.changed.contains(&m.user_id)) {
            self.membership_repo
                .upsert(
                    &self.pool,
                    membership.user_id,
                    customer_id,
                    &membership.roles,
                    &membership.assigned_course_ids,
                )
                .await?;
        }

        tracing::info!(
            actor = %actor.id, course_id = %course_id, ?change,
            changed = outcome.changed.len(), skipped = outcome.skipped.len(),
            "Acesso a curso alterado em lote"
        );

        if change == AccessChange::Grant && notify {
            for user_id in &outcome.changed {
                self.notify_user(*user_id, &course).await;
            }
        }

        Ok(outcome)
    }

    async fn notify_user(&self, user_id: Uuid, course: &Course) {
        match self.user_repo.find_by_id(user_id).await {
            Ok(Some(user)) => {
                let title = resolve(&course.title, "no", "en");
                self.notifications.notify_course_assigned(&user, title).await;
            }
            Ok(None) => tracing::warn!(user_id = %user_id, "Usuário sumiu antes da notificação"),
            Err(e) => tracing::warn!(user_id = %user_id, error = %e, "Falha ao carregar usuário para notificação"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn membership(roles: &[&str], courses: &[Uuid]) -> Membership {
        Membership {
            user_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            assigned_course_ids: courses.to_vec(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn grant_adds_course_and_user_role() {
        let course = Uuid::new_v4();
        let mut m = membership(&["admin"], &[]);

        assert!(apply_course_access(&mut m, course, AccessChange::Grant));
        assert_eq!(m.assigned_course_ids, vec![course]);
        assert_eq!(m.roles, vec!["admin", "user"]);
    }

    #[test]
    fn grant_is_a_noop_when_already_assigned() {
        let course = Uuid::new_v4();
        let mut m = membership(&["user"], &[course]);
        assert!(!apply_course_access(&mut m, course, AccessChange::Grant));
    }

    #[test]
    fn revoke_never_touches_roles() {
        let course = Uuid::new_v4();
        let mut m = membership(&["admin", "user"], &[course]);

        assert!(apply_course_access(&mut m, course, AccessChange::Revoke));
        assert!(m.assigned_course_ids.is_empty());
        assert_eq!(m.roles, vec!["admin", "user"]);
        assert!(!apply_course_access(&mut m, course, AccessChange::Revoke));
    }

    #[test]
    fn grant_then_revoke_restores_courses_but_keeps_user_role() {
        let (existing, course) = (Uuid::new_v4(), Uuid::new_v4());
        let mut m = membership(&["admin"], &[existing]);
        let before = m.assigned_course_ids.clone();

        apply_course_access(&mut m, course, AccessChange::Grant);
        apply_course_access(&mut m, course, AccessChange::Revoke);

        assert_eq!(m.assigned_course_ids, before);
        assert!(m.has_role(MemberRole::User));
        assert!(m.has_role(MemberRole::Admin));
    }

    #[test]
    fn bulk_skips_noops() {
        let course = Uuid::new_v4();
        let mut memberships = vec![
            membership(&["user"], &[course]),
            membership(&[], &[]),
            membership(&["user"], &[]),
        ];
        let ids: Vec<Uuid> = memberships.iter().map(|m| m.user_id).collect();

        let outcome = bulk_course_access(&mut memberships, course, AccessChange::Grant);
        assert_eq!(outcome.skipped, vec![ids[0]]);
        assert_eq!(outcome.changed, vec![ids[1], ids[2]]);
        assert!(memberships.iter().all(|m| m.is_assigned(course)));

        let outcome = bulk_course_access(&mut memberships[..2], course, AccessChange::Revoke);
        assert_eq!(outcome.changed, vec![ids[0], ids[1]]);
        assert!(outcome.skipped.is_empty());
    }
}
