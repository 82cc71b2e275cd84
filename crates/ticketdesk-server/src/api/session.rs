//! The `token` session cookie.

use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use cookie::time::Duration;
use cookie::{Cookie, SameSite};

use crate::auth::SessionToken;

/// How session cookies are written and read.
#[derive(Debug, Clone)]
pub struct SessionCookies {
    name: String,
    /// `false` only in development mode, where the cookie drops to
    /// `SameSite=Lax` since browsers refuse `SameSite=None` without `Secure`.
    secure: bool,
}

impl SessionCookies {
    pub fn new(name: impl Into<String>, secure: bool) -> Self {
        Self {
            name: name.into(),
            secure,
        }
    }

    /// Cookie carrying a freshly issued session.
    pub fn issue(&self, session: &SessionToken) -> Cookie<'static> {
        self.base(session.token.clone())
            .max_age(Duration::seconds(session.ttl_secs))
            .build()
    }

    /// Cookie that makes the browser drop the session.
    pub fn clear(&self) -> Cookie<'static> {
        let mut cookie = self.base(String::new()).build();
        cookie.make_removal();
        cookie
    }

    /// Session token from the cookie, or from an `Authorization: Bearer` header.
    pub fn token_from(&self, headers: &HeaderMap) -> Option<String> {
        let from_cookie = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|c| c.name() == self.name)
            .map(|c| c.value().to_string());

        from_cookie.or_else(|| {
            headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string)
        })
    }

    fn base(&self, value: String) -> cookie::CookieBuilder<'static> {
        let same_site = if self.secure {
            SameSite::None
        } else {
            SameSite::Lax
        };
        Cookie::build((self.name.clone(), value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(same_site)
    }
}
