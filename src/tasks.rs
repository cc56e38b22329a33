use rocket::fairing::{Fairing, Info, Kind};
use rocket::tokio;
use rocket::{Orbit, Rocket};
use std::time::Duration;

use crate::auth;
use crate::db::DbPool;
use crate::models::settings::Setting;
use crate::rate_limit::{RateLimiter, WINDOW};

pub struct BackgroundTasks;

#[rocket::async_trait]
impl Fairing for BackgroundTasks {
    fn info(&self) -> Info {
        Info {
            name: "Background Tasks",
            kind: Kind::Liftoff,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let pool = match rocket.state::<DbPool>() {
            Some(pool) => pool.clone(),
            None => {
                log::error!("[task] Database pool not managed; background tasks disabled");
                return;
            }
        };

        // Session cleanup task
        let p = pool.clone();
        tokio::spawn(async move {
            loop {
                let interval = get_interval(&p, "task_session_cleanup_interval", 30);
                tokio::time::sleep(Duration::from_secs(interval * 60)).await;
                match auth::cleanup_expired_sessions(&p) {
                    Ok(count) => {
                        if count > 0 {
                            log::info!("[task] Cleaned up {} expired sessions", count);
                        }
                    }
                    Err(e) => log::error!("[task] Session cleanup failed: {}", e),
                }
            }
        });

        // Rate limiter pruning, on the same cadence as the window
        if let Some(limiter) = rocket.state::<std::sync::Arc<RateLimiter>>() {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(WINDOW).await;
                    limiter.cleanup(WINDOW);
                    log::debug!("[task] Rate limiter tracking {} keys", limiter.tracked_keys());
                }
            });
        }

        log::info!("[task] Background tasks started");
    }
}

/// Interval setting in minutes, at least one.
fn get_interval(pool: &DbPool, key: &str, default: i64) -> u64 {
    Setting::get_i64_or(pool, key, default).max(1) as u64
}
