use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Base URL of the BioConnect REST backend
    pub api_url: String,
    /// Treat the `master` login as ADMIN regardless of its role claims
    pub master_superuser: bool,
    /// Settle delay applied by the client route guard before checking
    pub guard_delay_ms: u64,
    /// Mark session cookies as `Secure`
    pub secure_cookies: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            api_url: "http://localhost:8080".to_string(),
            master_superuser: true,
            guard_delay_ms: 100,
            secure_cookies: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("BIOCONNECT_HOST") {
            config.host = host;
        }

        if let Some(port) = lookup("BIOCONNECT_PORT") {
            if let Ok(p) = port.parse() {
                config.port = p;
            }
        }

        if let Some(url) = lookup("BIOCONNECT_API_URL").or_else(|| lookup("NEXT_PUBLIC_API_URL")) {
            let url = url.trim().trim_end_matches('/');
            if !url.is_empty() {
                config.api_url = url.to_string();
            }
        }

        if let Some(flag) = lookup("BIOCONNECT_MASTER_SUPERUSER") {
            if let Some(b) = parse_flag(&flag) {
                config.master_superuser = b;
            }
        }

        if let Some(delay) = lookup("BIOCONNECT_GUARD_DELAY_MS") {
            if let Ok(d) = delay.parse() {
                config.guard_delay_ms = d;
            }
        }

        if let Some(flag) = lookup("BIOCONNECT_SECURE_COOKIES") {
            if let Some(b) = parse_flag(&flag) {
                config.secure_cookies = b;
            }
        }

        config
    }

    pub fn guard_delay(&self) -> Duration {
        Duration::from_millis(self.guard_delay_ms)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// Names shared between the storage scopes, the mirror cookie and the edge layer
pub mod keys {
    pub const TOKEN: &str = "bioconnect_token";
    pub const USER: &str = "bioconnect_user";
    /// Fallback header carrying the credential when no cookie is present
    pub const TOKEN_HEADER: &str = "x-bioconnect-token";
    pub const CALLBACK_PARAM: &str = "callbackUrl";
}
