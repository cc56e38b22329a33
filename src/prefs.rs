//! Visitor state kept in cookies: cookie-consent choices and the details a
//! commenter asked us to remember.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, NaiveDateTime};
use rocket::http::{Cookie, CookieJar, SameSite};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const PREFERENCES_COOKIE: &str = "claimdesk_prefs";
pub const COMMENTER_COOKIE: &str = "claimdesk_commenter";

pub const PREFERENCES_DAYS: i64 = 365;
pub const COMMENTER_DAYS: i64 = 30;

/// Cookie-consent choices. Necessary cookies cannot be declined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookiePreferences {
    pub necessary: bool,
    pub analytics: bool,
    pub marketing: bool,
    pub saved_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct PreferencesForm {
    #[serde(default)]
    pub analytics: bool,
    #[serde(default)]
    pub marketing: bool,
}

impl CookiePreferences {
    pub fn new(form: &PreferencesForm, now: NaiveDateTime) -> Self {
        CookiePreferences {
            necessary: true,
            analytics: form.analytics,
            marketing: form.marketing,
            saved_at: now,
        }
    }

    /// Choices older than a year are stale and the banner is shown again.
    pub fn is_current(&self, now: NaiveDateTime) -> bool {
        now - self.saved_at < Duration::days(PREFERENCES_DAYS)
    }

    pub fn load(cookies: &CookieJar<'_>, now: NaiveDateTime) -> Option<Self> {
        let prefs: Self = read_cookie(cookies, PREFERENCES_COOKIE)?;
        prefs.is_current(now).then_some(prefs)
    }

    pub fn store(&self, cookies: &CookieJar<'_>) {
        write_cookie(cookies, PREFERENCES_COOKIE, self, PREFERENCES_DAYS);
    }
}

/// Name, email and website pre-filled into the comment form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommenterInfo {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub website: String,
}

impl CommenterInfo {
    pub fn load(cookies: &CookieJar<'_>) -> Option<Self> {
        read_cookie(cookies, COMMENTER_COOKIE)
    }

    pub fn store(&self, cookies: &CookieJar<'_>) {
        write_cookie(cookies, COMMENTER_COOKIE, self, COMMENTER_DAYS);
    }

    pub fn clear(cookies: &CookieJar<'_>) {
        cookies.remove(Cookie::from(COMMENTER_COOKIE));
    }
}

pub fn encode<T: Serialize>(value: &T) -> Option<String> {
    serde_json::to_vec(value)
        .ok()
        .map(|json| URL_SAFE_NO_PAD.encode(json))
}

pub fn decode<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let json = URL_SAFE_NO_PAD.decode(raw.trim()).ok()?;
    serde_json::from_slice(&json).ok()
}

fn read_cookie<T: DeserializeOwned>(cookies: &CookieJar<'_>, name: &str) -> Option<T> {
    cookies.get(name).and_then(|c| decode(c.value()))
}

fn write_cookie<T: Serialize>(cookies: &CookieJar<'_>, name: &'static str, value: &T, days: i64) {
    let Some(encoded) = encode(value) else {
        log::warn!("Could not encode {} cookie", name);
        return;
    };
    let mut cookie = Cookie::new(name, encoded);
    cookie.set_path("/");
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(rocket::time::Duration::days(days));
    cookies.add(cookie);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::fixtures::at;

    #[test]
    fn preferences_expire_after_a_year() {
        let form = PreferencesForm {
            analytics: true,
            marketing: false,
        };
        let prefs = CookiePreferences::new(&form, at(2024, 1, 1, 0, 0));
        assert!(prefs.necessary);
        assert!(prefs.is_current(at(2024, 12, 30, 0, 0)));
        assert!(!prefs.is_current(at(2025, 1, 1, 0, 0)));
    }

    #[test]
    fn cookie_values_survive_encoding() {
        let info = CommenterInfo {
            name: "Dr. Patel".to_string(),
            email: "patel@clinic.test".to_string(),
            website: String::new(),
        };
        let raw = encode(&info).unwrap();
        assert!(!raw.contains('='));
        assert_eq!(decode::<CommenterInfo>(&raw), Some(info));
        assert_eq!(decode::<CommenterInfo>("garbage"), None);
    }
}
