use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::model::{LoginRequest, LoginResponse, RefreshRequest};
use crate::{caller, Db, Failure};

fn new_token(kind: &str) -> String {
    format!("{kind}-{}", Uuid::new_v4().simple())
}

pub async fn login(State(db): State<Db>, Json(input): Json<LoginRequest>) -> Result<Json<LoginResponse>, Failure> {
    let mut store = db.write().await;
    let account = store
        .accounts
        .values()
        .find(|a| a.email.eq_ignore_ascii_case(&input.email) && a.password == input.password)
        .cloned()
        .ok_or_else(|| {
            Failure::detail(
                StatusCode::UNAUTHORIZED,
                "No active account found with the given credentials",
            )
        })?;

    let access = new_token("access");
    let refresh = new_token("refresh");
    store.access_tokens.insert(access.clone(), account.id);
    store.refresh_tokens.insert(refresh.clone(), account.id);
    tracing::info!(user_id = account.id, rol = account.group.rol(), "login");

    Ok(Json(LoginResponse {
        user_id: account.id,
        rol: account.group.rol().to_string(),
        access,
        refresh,
    }))
}

/// Revokes the access token the request was made with.
pub async fn logout(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Value>, Failure> {
    let mut store = db.write().await;
    let account = caller(&store, &headers)?;
    store.access_tokens.retain(|_, id| *id != account.id);
    store.refresh_tokens.retain(|_, id| *id != account.id);
    tracing::info!(user_id = account.id, "logout");
    Ok(Json(json!({ "success": true, "message": "Logged out" })))
}

pub async fn refresh(State(db): State<Db>, Json(input): Json<RefreshRequest>) -> Result<Json<Value>, Failure> {
    let mut store = db.write().await;
    let user_id = *store
        .refresh_tokens
        .get(&input.refresh)
        .ok_or_else(|| Failure::detail(StatusCode::UNAUTHORIZED, "Token is invalid or expired"))?;
    let access = new_token("access");
    store.access_tokens.insert(access.clone(), user_id);
    Ok(Json(json!({ "access": access })))
}
