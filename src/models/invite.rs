// src/models/invite.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseInvite {
    pub id: Uuid,
    #[schema(example = "K7PX4MZA")]
    pub code: String,
    pub customer_id: Uuid,
    pub course_id: Uuid,
    pub created_by: Option<Uuid>,
    pub max_uses: Option<i32>,
    pub use_count: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl CourseInvite {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        let not_expired = self.expires_at.is_none_or(|at| at > now);
        let has_uses = self.max_uses.is_none_or(|max| self.use_count < max);
        not_expired && has_uses
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvitePayload {
    pub customer_id: Uuid,
    pub course_id: Uuid,
    #[validate(range(min = 1, message = "invalid_input"))]
    pub max_uses: Option<i32>,
    #[validate(range(min = 1, max = 365, message = "invalid_input"))]
    pub valid_days: Option<i64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedeemInvitePayload {
    #[validate(length(min = 4, message = "required"))]
    pub code: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct MagicLink {
    pub code: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn invite(max_uses: Option<i32>, use_count: i32, expires_at: Option<DateTime<Utc>>) -> CourseInvite {
        CourseInvite {
            id: Uuid::new_v4(),
            code: "K7PX4MZA".into(),
            customer_id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            created_by: None,
            max_uses,
            use_count,
            expires_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn invite_respects_use_limit_and_expiry() {
        let now = Utc::now();
        assert!(invite(None, 100, None).is_usable(now));
        assert!(invite(Some(2), 1, None).is_usable(now));
        assert!(!invite(Some(2), 2, None).is_usable(now));
        assert!(!invite(None, 0, Some(now - Duration::minutes(1))).is_usable(now));
    }
}
