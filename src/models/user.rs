// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::error::AppError;

/// Represents the 'users' table in the database.
///
/// Profile fields come from the identity provider and may be missing; the
/// counters are owned by this service.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserRecord {
    /// Opaque stable id issued by the identity provider.
    pub id: String,

    pub display_name: Option<String>,
    pub email: Option<String>,
    pub college: Option<String>,
    pub photo_url: Option<String>,

    /// Leaderboard points. Only ever incremented by award rules.
    pub points: i64,

    /// Off-chain AURA earned from contest placements. Independent of `points`.
    pub aura: i64,

    pub streak: i32,
    pub badge_count: i32,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl UserRecord {
    /// Rejects records whose counters can't have been produced by the ledger.
    pub fn validated(self) -> Result<Self, AppError> {
        if self.points < 0 || self.aura < 0 || self.streak < 0 || self.badge_count < 0 {
            return Err(AppError::Persistence(format!(
                "user record '{}' has negative counters",
                self.id
            )));
        }
        Ok(self)
    }

    /// Name with the "Anonymous" default applied.
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("Anonymous")
    }

    pub fn college_or_default(&self) -> &str {
        self.college
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or("Not specified")
    }

    /// Provider photo, or a generated avatar derived from the name or email.
    pub fn avatar_url(&self) -> String {
        if let Some(photo) = self.photo_url.as_deref().filter(|p| !p.is_empty()) {
            return photo.to_string();
        }
        let seed = self
            .display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("User");
        let name: String = url::form_urlencoded::byte_serialize(seed.as_bytes()).collect();
        format!("https://ui-avatars.com/api/?name={}&background=random&color=fff", name)
    }
}

/// Data used to create a user record on first authentication.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub college: Option<String>,
    pub photo_url: Option<String>,
}

/// Body of `POST /api/auth/session`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(length(min = 1, max = 120))]
    pub college: Option<String>,
}

/// Typed profile with read-side defaults applied.
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub college: String,
    pub avatar: String,
    pub points: i64,
    pub aura: i64,
    pub streak: i32,
    pub badge_count: i32,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

impl From<&UserRecord> for UserProfile {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name().to_string(),
            email: user.email.clone(),
            college: user.college_or_default().to_string(),
            avatar: user.avatar_url(),
            points: user.points,
            aura: user.aura,
            streak: user.streak,
            badge_count: user.badge_count,
            joined_at: user.created_at,
        }
    }
}

/// Aggregated profile data for the current user.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub rank: Option<crate::models::leaderboard::LeaderboardEntry>,
    pub recent_awards: Vec<crate::models::award::AwardRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> UserRecord {
        UserRecord {
            id: "uid-1".to_string(),
            display_name: None,
            email: None,
            college: Some("  ".to_string()),
            photo_url: None,
            points: 0,
            aura: 0,
            streak: 0,
            badge_count: 0,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn defaults_apply_to_missing_fields() {
        let user = record();
        assert_eq!(user.name(), "Anonymous");
        assert_eq!(user.college_or_default(), "Not specified");
        assert!(user.avatar_url().starts_with("https://ui-avatars.com/api/?name=User"));
    }

    #[test]
    fn negative_counters_are_rejected() {
        let mut user = record();
        user.points = -5;
        assert!(matches!(user.validated(), Err(AppError::Persistence(_))));
    }
}
