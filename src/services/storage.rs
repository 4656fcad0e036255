//! Key/value storage scopes and the session mirror cookie

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::config::keys;

/// One browser-like storage scope (durable or tab-scoped)
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);
}

/// In-memory storage scope
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// Expiry used for "remember me" cookies
pub const FAR_FUTURE_EXPIRES: &str = "Fri, 31 Dec 9999 23:59:59 GMT";

/// A cookie written so the edge layer can see the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    /// Far-future expiry when true, browser-session cookie otherwise
    pub persistent: bool,
    pub secure: bool,
}

impl SessionCookie {
    pub fn token(value: impl Into<String>, persistent: bool) -> Self {
        Self {
            name: keys::TOKEN.to_string(),
            value: value.into(),
            persistent,
            secure: false,
        }
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// `Set-Cookie` header value
    pub fn header_value(&self) -> String {
        let mut out = format!(
            "{}={}; Path=/; SameSite=Lax",
            self.name,
            urlencoding::encode(&self.value)
        );
        if self.persistent {
            out.push_str("; Expires=");
            out.push_str(FAR_FUTURE_EXPIRES);
        }
        if self.secure {
            out.push_str("; Secure");
        }
        out
    }

    /// `Set-Cookie` header value that deletes the named cookie
    pub fn removal_header(name: &str) -> String {
        format!(
            "{}=; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
            name
        )
    }
}

/// Cookie sink mirrored by the session store
pub trait CookieJar: Send + Sync {
    fn get(&self, name: &str) -> Option<SessionCookie>;
    fn set(&self, cookie: SessionCookie);
    fn remove(&self, name: &str);
}

#[derive(Debug, Default)]
pub struct MemoryCookieJar {
    cookies: RwLock<HashMap<String, SessionCookie>>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Cookie` request header built from the jar, as a browser would send it
    pub fn request_header(&self) -> Option<String> {
        let cookies = self.cookies.read().unwrap_or_else(PoisonError::into_inner);
        if cookies.is_empty() {
            return None;
        }
        let mut pairs: Vec<String> = cookies
            .values()
            .map(|c| format!("{}={}", c.name, urlencoding::encode(&c.value)))
            .collect();
        pairs.sort();
        Some(pairs.join("; "))
    }
}

impl CookieJar for MemoryCookieJar {
    fn get(&self, name: &str) -> Option<SessionCookie> {
        self.cookies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn set(&self, cookie: SessionCookie) {
        self.cookies
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(cookie.name.clone(), cookie);
    }

    fn remove(&self, name: &str) {
        self.cookies
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
    }
}

/// Reads a cookie value out of a `Cookie` request header
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| k.trim() == name)
        .map(|(_, v)| v.trim().trim_matches('"'))
        .filter(|v| !v.is_empty())
        .map(|v| {
            urlencoding::decode(v)
                .map(|d| d.into_owned())
                .unwrap_or_else(|_| v.to_string())
        })
}
