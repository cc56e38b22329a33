use rocket::http::CookieJar;
use rocket::serde::json::Json;
use rocket::State;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::{self, AdminUser, ClientIp, SESSION_COOKIE};
use crate::db::DbPool;
use crate::error::{ApiError, ApiResult};
use crate::models::settings::Setting;
use crate::rate_limit::{RateLimiter, WINDOW};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub password: String,
}

#[post("/login", format = "json", data = "<form>")]
pub fn login(
    pool: &State<DbPool>,
    limiter: &State<Arc<RateLimiter>>,
    client_ip: ClientIp,
    cookies: &CookieJar<'_>,
    form: Json<LoginForm>,
) -> ApiResult<Json<Value>> {
    let rate_key = format!("login:{}", auth::hash_ip(&client_ip.0));
    let max_attempts = Setting::get_i64_or(pool, "login_rate_limit", 5).max(1) as u64;

    // Check rate limit before processing
    if !limiter.check_and_record(&rate_key, max_attempts, WINDOW) {
        log::warn!("Login rate limit hit");
        return Err(ApiError::TooManyRequests);
    }

    if !auth::verify_admin_password(pool, &form.password) {
        log::warn!("Failed admin login");
        return Err(ApiError::Unauthorized("Invalid password"));
    }

    let session_id = auth::create_session(pool, Some(&client_ip.0), None)?;
    auth::set_session_cookie(cookies, &session_id);
    let expires_at = auth::session_expires_at(pool, &session_id);
    log::info!("Admin logged in");
    Ok(Json(json!({ "success": true, "expires_at": expires_at })))
}

#[post("/logout")]
pub fn logout(pool: &State<DbPool>, cookies: &CookieJar<'_>) -> ApiResult<Json<Value>> {
    if let Some(cookie) = cookies.get_private(SESSION_COOKIE) {
        auth::destroy_session(pool, cookie.value())?;
    }
    auth::clear_session_cookie(cookies);
    Ok(Json(json!({ "success": true })))
}

/// Polled by the admin client; a 401 sends it back to the login screen.
#[get("/session")]
pub fn session(pool: &State<DbPool>, admin: Option<AdminUser>) -> ApiResult<Json<Value>> {
    let admin = admin.ok_or_else(ApiError::session_expired)?;
    let expires_at =
        auth::session_expires_at(pool, &admin.session_id).ok_or_else(ApiError::session_expired)?;
    Ok(Json(json!({ "authenticated": true, "expires_at": expires_at })))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![login, logout, session]
}
