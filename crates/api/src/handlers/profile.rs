//! Handlers for the signed-in customer's own profile.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use pausedej_core::error::CoreError;
use pausedej_core::phone::normalize_phone;
use pausedej_db::models::profile::{ProfileResponse, UpdateProfile};
use pausedej_db::repositories::ProfileRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::auth;
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/profile
pub async fn get_profile(
    user: RequireAuth,
    state: State<AppState>,
) -> AppResult<impl IntoResponse> {
    auth::me(user, state).await
}

/// PUT /api/v1/profile
///
/// Update name, phone, dietary preferences or the SMS opt-in. The phone is
/// stored normalised; dietary preferences are lowercased and deduplicated.
pub async fn update_profile(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(mut input): Json<UpdateProfile>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    if let Some(phone) = input.phone.take() {
        input.phone = Some(normalize_phone(&phone)?);
    }
    if let Some(prefs) = input.dietary_preferences.take() {
        input.dietary_preferences = Some(normalize_tags(prefs));
    }

    let profile = ProfileRepo::update(&state.pool, user.user_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Profile",
            id: user.user_id,
        }))?;

    tracing::info!(user_id = user.user_id, "Profile updated");

    Ok(Json(DataResponse {
        data: ProfileResponse::from(profile),
    }))
}

/// Trim, lowercase and deduplicate tags, keeping first-seen order.
pub(crate) fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}
