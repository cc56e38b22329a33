use chrono::Utc;
use regex::Regex;
use rocket::http::{CookieJar, Status};
use rocket::serde::json::Json;
use rocket::State;
use serde_json::{json, Value};
use std::sync::{Arc, OnceLock};

use crate::auth::{self, ClientIp};
use crate::db::DbPool;
use crate::error::{ApiError, ApiResult};
use crate::models::comment::{Comment, CommentForm, PublicComment};
use crate::models::consultation::{Consultation, ConsultationForm};
use crate::models::contact::{Contact, ContactForm};
use crate::models::cta_inquiry::{CtaInquiry, CtaInquiryForm};
use crate::models::settings::Setting;
use crate::models::subscriber::{SubscribeForm, Subscriber};
use crate::prefs::{CommenterInfo, CookiePreferences, PreferencesForm};
use crate::rate_limit::{RateLimiter, WINDOW};

const MAX_NAME_LEN: usize = 120;
const MAX_MESSAGE_LEN: usize = 5000;

type Created = (Status, Json<Value>);

fn created(id: i64) -> Created {
    (Status::Created, Json(json!({ "success": true, "id": id })))
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"))
}

pub fn valid_email(email: &str) -> bool {
    email_pattern().is_match(email.trim())
}

fn require(value: &str, field: &str, max: usize) -> ApiResult<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::bad_request(format!("{} is required", field)));
    }
    if value.chars().count() > max {
        return Err(ApiError::bad_request(format!("{} is too long", field)));
    }
    Ok(())
}

fn require_email(email: &str) -> ApiResult<()> {
    if valid_email(email) {
        Ok(())
    } else {
        Err(ApiError::bad_request("A valid email address is required"))
    }
}

/// Bots fill the hidden field; they get a success answer and nothing is stored.
fn is_bot(honeypot: &Option<String>) -> bool {
    honeypot.as_deref().is_some_and(|h| !h.trim().is_empty())
}

fn check_rate(
    pool: &DbPool,
    limiter: &RateLimiter,
    bucket: &str,
    setting: &str,
    ip: &ClientIp,
) -> ApiResult<()> {
    let max_attempts = Setting::get_i64_or(pool, setting, 10).max(1) as u64;
    let key = format!("{}:{}", bucket, auth::hash_ip(&ip.0));
    if limiter.check_and_record(&key, max_attempts, WINDOW) {
        Ok(())
    } else {
        log::warn!("Rate limit hit for {} submissions", bucket);
        Err(ApiError::TooManyRequests)
    }
}

// ── Comments ───────────────────────────────────────────

#[post("/comments", format = "json", data = "<form>")]
pub fn comment_submit(
    pool: &State<DbPool>,
    limiter: &State<Arc<RateLimiter>>,
    client_ip: ClientIp,
    form: Json<CommentForm>,
) -> ApiResult<Created> {
    if !Setting::get_bool(pool, "comments_enabled") {
        return Err(ApiError::bad_request("Comments are disabled"));
    }
    if is_bot(&form.honeypot) {
        return Ok(created(0));
    }
    require(&form.post_slug, "Article", 200)?;
    require(&form.author_name, "Name", MAX_NAME_LEN)?;
    require_email(&form.author_email)?;
    require(&form.comment, "Comment", MAX_MESSAGE_LEN)?;
    check_rate(pool, limiter, "comment", "comments_rate_limit", &client_ip)?;

    let id = Comment::create(pool, &form)?;
    log::info!(
        "New comment {} on {} ({})",
        id,
        form.post_slug,
        form.article_title.as_deref().unwrap_or("untitled")
    );
    Ok(created(id))
}

#[get("/comments/<slug>")]
pub fn comments_for_post(pool: &State<DbPool>, slug: &str) -> Json<Vec<PublicComment>> {
    Json(Comment::for_post(pool, slug))
}

// ── Lead forms ─────────────────────────────────────────

#[post("/contact", format = "json", data = "<form>")]
pub fn contact_submit(
    pool: &State<DbPool>,
    limiter: &State<Arc<RateLimiter>>,
    client_ip: ClientIp,
    form: Json<ContactForm>,
) -> ApiResult<Created> {
    if is_bot(&form.honeypot) {
        return Ok(created(0));
    }
    require(&form.name, "Name", MAX_NAME_LEN)?;
    require_email(&form.email)?;
    require(&form.message, "Message", MAX_MESSAGE_LEN)?;
    check_rate(pool, limiter, "contact", "forms_rate_limit", &client_ip)?;

    let id = Contact::create(pool, &form)?;
    log::info!("New contact submission {}", id);
    Ok(created(id))
}

#[post("/consultations", format = "json", data = "<form>")]
pub fn consultation_submit(
    pool: &State<DbPool>,
    limiter: &State<Arc<RateLimiter>>,
    client_ip: ClientIp,
    form: Json<ConsultationForm>,
) -> ApiResult<Created> {
    if is_bot(&form.honeypot) {
        return Ok(created(0));
    }
    require(&form.name, "Name", MAX_NAME_LEN)?;
    require_email(&form.email)?;
    check_rate(pool, limiter, "consultation", "forms_rate_limit", &client_ip)?;

    let id = Consultation::create(pool, &form)?;
    log::info!("New consultation request {}", id);
    Ok(created(id))
}

#[post("/cta-inquiries", format = "json", data = "<form>")]
pub fn cta_inquiry_submit(
    pool: &State<DbPool>,
    limiter: &State<Arc<RateLimiter>>,
    client_ip: ClientIp,
    form: Json<CtaInquiryForm>,
) -> ApiResult<Created> {
    if is_bot(&form.honeypot) {
        return Ok(created(0));
    }
    require(&form.name, "Name", MAX_NAME_LEN)?;
    require_email(&form.email)?;
    check_rate(pool, limiter, "cta", "forms_rate_limit", &client_ip)?;

    let id = CtaInquiry::create(pool, &form)?;
    log::info!("New CTA inquiry {}", id);
    Ok(created(id))
}

#[post("/subscribe", format = "json", data = "<form>")]
pub fn subscribe(
    pool: &State<DbPool>,
    limiter: &State<Arc<RateLimiter>>,
    client_ip: ClientIp,
    form: Json<SubscribeForm>,
) -> ApiResult<Created> {
    require_email(&form.email)?;
    check_rate(pool, limiter, "subscribe", "forms_rate_limit", &client_ip)?;
    let id = Subscriber::subscribe(pool, &form.email)?;
    Ok(created(id))
}

/// Newsletter opt-out. The address is kept, marked inactive.
#[post("/unsubscribe", format = "json", data = "<form>")]
pub fn unsubscribe(
    pool: &State<DbPool>,
    limiter: &State<Arc<RateLimiter>>,
    client_ip: ClientIp,
    form: Json<SubscribeForm>,
) -> ApiResult<Json<Value>> {
    require_email(&form.email)?;
    check_rate(pool, limiter, "subscribe", "forms_rate_limit", &client_ip)?;
    if !Subscriber::unsubscribe(pool, &form.email)? {
        return Err(ApiError::NotFound("Subscriber"));
    }
    Ok(Json(json!({ "success": true })))
}

// ── Visitor preferences ────────────────────────────────

#[get("/preferences")]
pub fn preferences_get(cookies: &CookieJar<'_>) -> Json<Value> {
    let prefs = CookiePreferences::load(cookies, Utc::now().naive_utc());
    Json(json!({ "preferences": prefs }))
}

#[post("/preferences", format = "json", data = "<form>")]
pub fn preferences_save(cookies: &CookieJar<'_>, form: Json<PreferencesForm>) -> Json<CookiePreferences> {
    let prefs = CookiePreferences::new(&form, Utc::now().naive_utc());
    prefs.store(cookies);
    Json(prefs)
}

#[get("/commenter")]
pub fn commenter_get(cookies: &CookieJar<'_>) -> Json<Option<CommenterInfo>> {
    Json(CommenterInfo::load(cookies))
}

#[post("/commenter", format = "json", data = "<info>")]
pub fn commenter_save(cookies: &CookieJar<'_>, info: Json<CommenterInfo>) -> ApiResult<Json<CommenterInfo>> {
    require(&info.name, "Name", MAX_NAME_LEN)?;
    require_email(&info.email)?;
    info.store(cookies);
    Ok(info)
}

#[delete("/commenter")]
pub fn commenter_forget(cookies: &CookieJar<'_>) -> Json<Value> {
    CommenterInfo::clear(cookies);
    Json(json!({ "success": true }))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        comment_submit,
        comments_for_post,
        contact_submit,
        consultation_submit,
        cta_inquiry_submit,
        subscribe,
        unsubscribe,
        preferences_get,
        preferences_save,
        commenter_get,
        commenter_save,
        commenter_forget,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(valid_email("billing@clinic.test"));
        assert!(valid_email("  dr.lee+ar@practice.co.uk "));
        assert!(!valid_email("no-at-sign.test"));
        assert!(!valid_email("two@@clinic.test"));
        assert!(!valid_email("nodot@clinic"));
    }

    #[test]
    fn honeypot_only_counts_when_filled() {
        assert!(!is_bot(&None));
        assert!(!is_bot(&Some("  ".to_string())));
        assert!(is_bot(&Some("http://spam".to_string())));
    }
}
