use serde::Deserialize;

use crate::models::Session;
use crate::services::state::AppState;

#[derive(Deserialize)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

pub fn login(payload: LoginPayload, state: &AppState) -> Result<Session, String> {
    state
        .login(&payload.username, &payload.password)
        .map_err(|e| e.to_string())
}

pub fn logout(state: &AppState) -> Result<(), String> {
    state.logout().map_err(|e| e.to_string())
}

pub fn current_session(state: &AppState) -> Result<Option<Session>, String> {
    state.session().map_err(|e| e.to_string())
}
