// src/services/invite_service.rs

use chrono::{Duration, Utc};
use sqlx::PgPool;

use crate::{
    common::{
        codes::{normalize_code, random_code, INVITE_CODE_LEN},
        error::AppError,
    },
    db::{CourseRepository, InviteRepository, MembershipRepository},
    models::{
        auth::User,
        invite::{CourseInvite, CreateInvitePayload},
        membership::{AccessChange, Membership},
    },
    services::{access::apply_course_access, authz::AccessPolicy},
};

// Colisão de código é rara; poucas tentativas bastam.
const CODE_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct InviteService {
    invite_repo: InviteRepository,
    course_repo: CourseRepository,
    membership_repo: MembershipRepository,
    policy: AccessPolicy,
    pool: PgPool,
}

impl InviteService {
    pub fn new(
        invite_repo: InviteRepository,
        course_repo: CourseRepository,
        membership_repo: MembershipRepository,
        policy: AccessPolicy,
        pool: PgPool,
    ) -> Self {
        Self { invite_repo, course_repo, membership_repo, policy, pool }
    }

    pub async fn create_invite(&self, actor: &User, input: &CreateInvitePayload) -> Result<CourseInvite, AppError> {
        let customer = self.policy.ensure_customer_admin(actor, input.customer_id).await?;

        self.course_repo
            .find_by_id(input.course_id)
            .await?
            .filter(|c| c.company_id == customer.company_id)
            .ok_or(AppError::CourseNotFound)?;

        let expires_at = input.valid_days.map(|days| Utc::now() + Duration::days(days));

        let mut attempt = 0;
        loop {
            attempt += 1;
            let code = random_code(INVITE_CODE_LEN);
            match self
                .invite_repo
                .create_invite(&code, customer.id, input.course_id, actor.id, input.max_uses, expires_at)
                .await
            {
                Ok(invite) => {
                    tracing::info!(invite_id = %invite.id, customer_id = %customer.id, "Convite criado");
                    return Ok(invite);
                }
                Err(AppError::UniqueConstraintViolation(_)) if attempt < CODE_ATTEMPTS => {
                    tracing::debug!(attempt, "Código de convite repetido; gerando outro");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Resgata o código para o usuário logado: cria o vínculo com o cliente
    /// se faltar e concede o curso pela mesma regra da atribuição manual.
    pub async fn redeem(&self, user: &User, code: &str) -> Result<Membership, AppError> {
        let code = normalize_code(code);
        let mut tx = self.pool.begin().await?;

        let invite = self
            .invite_repo
            .find_invite(&mut *tx, &code)
            .await?
            .filter(|invite| invite.is_usable(Utc::now()))
            .ok_or(AppError::InvalidInviteCode)?;

        let mut membership = match self
            .membership_repo
            .find(&mut *tx, user.id, invite.customer_id)
            .await?
        {
            Some(m) => m,
            None => {
                self.membership_repo
                    .upsert(&mut *tx, user.id, invite.customer_id, &[], &[])
                    .await?
            }
        };

        apply_course_access(&mut membership, invite.course_id, AccessChange::Grant);

        let membership = self
            .membership_repo
            .upsert(
                &mut *tx,
                user.id,
                invite.customer_id,
                &membership.roles,
                &membership.assigned_course_ids,
            )
            .await?;

        self.invite_repo.increment_use(&mut *tx, invite.id).await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, invite_id = %invite.id, "Convite resgatado");
        Ok(membership)
    }
}
