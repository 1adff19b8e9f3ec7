use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::config::Config;

/// Bearer token issued by the backend
pub const TOKEN_COOKIE: &str = "auth_token";

/// Unix time of the last authenticated page request
pub const ACTIVITY_COOKIE: &str = "auth_activity";

fn base(name: &'static str, value: String, config: &Config) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .same_site(SameSite::Lax)
        .http_only(true)
        .secure(config.production)
        .max_age(time::Duration::days(config.session_days))
        .build()
}

/// Stores a fresh session after login
pub fn start(jar: CookieJar, token: &str, config: &Config, now: i64) -> CookieJar {
    jar.add(base(TOKEN_COOKIE, token.to_string(), config))
        .add(base(ACTIVITY_COOKIE, now.to_string(), config))
}

/// Records activity so idle sessions can be detected
pub fn touch(jar: CookieJar, config: &Config, now: i64) -> CookieJar {
    jar.add(base(ACTIVITY_COOKIE, now.to_string(), config))
}

/// Removes both session cookies
pub fn clear(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(TOKEN_COOKIE).path("/"))
        .remove(Cookie::build(ACTIVITY_COOKIE).path("/"))
}

/// Token stored in the jar, if any
pub fn token(jar: &CookieJar) -> Option<String> {
    jar.get(TOKEN_COOKIE)
        .map(|cookie| cookie.value().trim().to_string())
        .filter(|token| !token.is_empty())
}

/// True when the last recorded activity is older than the inactivity limit
///
/// A missing or unreadable activity cookie counts as active: the session
/// predates activity tracking.
pub fn is_idle(jar: &CookieJar, now: i64, inactivity_minutes: i64) -> bool {
    jar.get(ACTIVITY_COOKIE)
        .and_then(|cookie| cookie.value().parse::<i64>().ok())
        .is_some_and(|last| now - last > inactivity_minutes * 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_sets_both_cookies() {
        let config = Config::default();
        let jar = start(CookieJar::new(), "abc.def.ghi", &config, 1_000);
        assert_eq!(token(&jar).as_deref(), Some("abc.def.ghi"));

        let cookie = jar.get(TOKEN_COOKIE).unwrap();
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(7)));
        assert_eq!(jar.get(ACTIVITY_COOKIE).unwrap().value(), "1000");
    }

    #[test]
    fn idle_after_limit() {
        let config = Config::default();
        let jar = start(CookieJar::new(), "t.t.t", &config, 1_000);
        assert!(!is_idle(&jar, 1_000 + 30 * 60, 30));
        assert!(is_idle(&jar, 1_000 + 30 * 60 + 1, 30));
        assert!(!is_idle(&CookieJar::new(), 99_999, 30));
    }

    #[test]
    fn clear_drops_the_token() {
        let jar = start(CookieJar::new(), "t.t.t", &Config::default(), 0);
        let jar = clear(jar);
        assert_eq!(token(&jar), None);
    }
}
