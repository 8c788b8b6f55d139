use chrono::{DateTime, Duration, Utc};
use headers::HeaderMapExt;
use http::header::{HeaderMap, HeaderValue, SET_COOKIE};

use crate::config::SessionConfig;

/// Read access to the cookies of the inbound request.
pub trait RequestCookies: Sync {
    fn cookie(&self, name: &str) -> Option<String>;
}

/// Write access to the cookies of the outbound response.
pub trait ResponseCookies: Send {
    /// Issue `cookie`. Returns false when the transport could not accept it.
    fn set_cookie(&mut self, cookie: &SessionCookie) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    /// Lifetime in seconds; `0` leaves the cookie to the browser session.
    pub expires: u64,
    pub path: String,
    pub domain: String,
    pub secure: bool,
    pub http_only: bool,
}

impl SessionCookie {
    pub fn from_config(config: &SessionConfig, value: &str) -> Self {
        Self {
            name: config.cookie_name.clone(),
            value: value.to_string(),
            expires: config.cookie_expires,
            path: config.cookie_path.clone(),
            domain: config.cookie_domain.clone(),
            secure: config.cookie_secure,
            http_only: config.cookie_http_only,
        }
    }

    /// `Set-Cookie` header value, with `Expires` computed from `now`.
    pub fn header_value_at(&self, now: DateTime<Utc>) -> String {
        let mut cookie = format!("{}={}", self.name, self.value);
        if self.expires > 0 {
            // Past the representable date range only Max-Age is sent
            let expires_at = i64::try_from(self.expires)
                .ok()
                .and_then(Duration::try_seconds)
                .and_then(|lifetime| now.checked_add_signed(lifetime));
            if let Some(expires_at) = expires_at {
                cookie.push_str(&format!(
                    "; Expires={}",
                    expires_at.format("%a, %d %b %Y %H:%M:%S GMT")
                ));
            }
            cookie.push_str(&format!("; Max-Age={}", self.expires));
        }
        if !self.path.is_empty() {
            cookie.push_str(&format!("; Path={}", self.path));
        }
        if !self.domain.is_empty() {
            cookie.push_str(&format!("; Domain={}", self.domain));
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        cookie
    }

    pub fn header_value(&self) -> String {
        self.header_value_at(Utc::now())
    }
}

impl RequestCookies for HeaderMap {
    fn cookie(&self, name: &str) -> Option<String> {
        let Some(cookies) = self.typed_get::<headers::Cookie>() else {
            tracing::debug!("No cookie header found");
            return None;
        };
        cookies.get(name).map(str::to_string)
    }
}

impl ResponseCookies for HeaderMap {
    fn set_cookie(&mut self, cookie: &SessionCookie) -> bool {
        match HeaderValue::from_str(&cookie.header_value()) {
            Ok(value) => {
                self.append(SET_COOKIE, value);
                true
            }
            Err(e) => {
                tracing::error!("Failed to build Set-Cookie header for {}: {}", cookie.name, e);
                false
            }
        }
    }
}
