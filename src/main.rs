#[macro_use]
extern crate rocket;

use rocket::data::{Limits, ToByteUnit};
use rocket::fs::{FileServer, Options};
use rocket::serde::json::{json, Json, Value};
use rocket::{Build, Request, Rocket};
use std::sync::Arc;

mod auth;
mod boot;
mod content;
mod dashboard;
mod db;
mod error;
mod models;
mod prefs;
mod rate_limit;
mod routes;
mod rss;
mod tasks;
mod uploads;


use db::DbPool;
use models::settings::Setting;
use rate_limit::RateLimiter;

#[catch(400)]
fn bad_request() -> Json<Value> {
    Json(json!({ "error": "Malformed request" }))
}

#[catch(401)]
fn unauthorized() -> Json<Value> {
    Json(json!({ "error": "Session expired, please log in again" }))
}

#[catch(404)]
fn not_found(req: &Request) -> Json<Value> {
    Json(json!({ "error": format!("Nothing at {}", req.uri().path()) }))
}

#[catch(422)]
fn unprocessable() -> Json<Value> {
    Json(json!({ "error": "Request body is missing required fields" }))
}

#[catch(500)]
fn server_error() -> Json<Value> {
    Json(json!({ "error": "Internal server error" }))
}

/// Assemble the service around an initialised pool.
pub fn build_rocket(pool: DbPool) -> Rocket<Build> {
    let uploads_dir = Setting::get_or(&pool, "uploads_path", "website/uploads/");
    let uploads_mount = Setting::get_or(&pool, "uploads_url_prefix", "/uploads/");

    // Base64 image payloads outgrow Rocket's 1 MiB JSON default
    let upload_mb = Setting::get_i64_or(&pool, "uploads_max_mb", 5).max(1) as u64;
    let limits = Limits::default().limit("json", (upload_mb * 2).mebibytes());
    let figment = rocket::Config::figment().merge(("limits", limits));

    rocket::custom(figment)
        .manage(pool)
        .manage(Arc::new(RateLimiter::new()))
        .attach(tasks::BackgroundTasks)
        .mount(
            uploads_mount.trim_end_matches('/'),
            FileServer::new(uploads_dir, Options::Missing),
        )
        .mount("/", routes::public::routes())
        .mount("/api", routes::api::routes())
        .mount("/admin", routes::auth::routes())
        .mount("/admin/api", routes::admin_api::routes())
        .register(
            "/",
            catchers![bad_request, unauthorized, not_found, unprocessable, server_error],
        )
}

#[launch]
fn rocket() -> _ {
    env_logger::init();

    // Boot check: create directories, verify storage is writable
    if !boot::run().ok() {
        std::process::exit(1);
    }

    let pool = db::init_pool().expect("Failed to initialize database pool");
    db::run_migrations(&pool).expect("Failed to run database migrations");
    db::seed_defaults(&pool).expect("Failed to seed default settings");

    build_rocket(pool)
}
