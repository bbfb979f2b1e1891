//! Customer and administrator profiles.

use pausedej_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Full row from the `profiles` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`ProfileResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct Profile {
    pub id: DbId,
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub dietary_preferences: Vec<String>,
    pub sms_opt_in: bool,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Safe profile representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub id: DbId,
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub dietary_preferences: Vec<String>,
    pub sms_opt_in: bool,
    pub created_at: Timestamp,
}

impl From<Profile> for ProfileResponse {
    fn from(p: Profile) -> Self {
        Self {
            id: p.id,
            email: p.email,
            full_name: p.full_name,
            phone: p.phone,
            role: p.role,
            dietary_preferences: p.dietary_preferences,
            sms_opt_in: p.sms_opt_in,
            created_at: p.created_at,
        }
    }
}

/// DTO for creating a profile. The password is already hashed.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProfile {
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: String,
}

/// DTO for a customer editing their own profile. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfile {
    #[validate(length(max = 120))]
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub dietary_preferences: Option<Vec<String>>,
    pub sms_opt_in: Option<bool>,
}
