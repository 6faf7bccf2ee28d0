//! Configuration Module
//!
//! Handles loading and managing worker configuration from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

const DEFAULT_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_UPSTREAM: &str = "http://localhost:8080";

// == Role ==
/// Which flavour of the clinic app this worker serves.
///
/// The role selects the role-specific scripts of the manifest and is part of
/// every partition name, so an admin worker never prunes a users worker's caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Admin,
    Users,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Users => "users",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "users" | "user" => Ok(Role::Users),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

// == Payload Policy ==
/// What to do with a push payload or client message that is not valid JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadPolicy {
    /// Treat the payload as an empty object and carry on with defaults
    #[default]
    DefaultToEmpty,
    /// Fail the event with `WorkerError::MalformedPayload`
    Reject,
}

impl FromStr for PayloadPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default-empty" | "default" | "empty" => Ok(PayloadPolicy::DefaultToEmpty),
            "reject" => Ok(PayloadPolicy::Reject),
            other => Err(format!("unknown payload policy '{}'", other)),
        }
    }
}

/// Worker configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Application slug used in partition names
    pub app_name: String,
    /// Human readable application name used in notifications
    pub display_name: String,
    /// Which app flavour (and manifest) this worker serves
    pub role: Role,
    /// Deploy-time version token baked into partition names
    pub version: String,
    /// The serving origin; only GETs to this origin are intercepted
    pub origin: Url,
    /// Where network fetches are sent
    pub upstream: Url,
    /// HTTP gateway port
    pub server_port: u16,
    /// Deadline for every network fetch, in milliseconds
    pub fetch_timeout_ms: u64,
    /// Handling of malformed push payloads and client messages
    pub payload_policy: PayloadPolicy,
    /// Registered pages not polled for this many seconds are disconnected
    pub client_idle_secs: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `APP_NAME` - Partition name prefix (default: thynktech)
    /// - `APP_DISPLAY_NAME` - Notification title prefix (default: ThynkTech)
    /// - `APP_ROLE` - `admin` or `users` (default: admin)
    /// - `CACHE_VERSION` - Version token (default: 1)
    /// - `ORIGIN` - Serving origin (default: http://localhost:3000)
    /// - `UPSTREAM_URL` - Network origin (default: http://localhost:8080)
    /// - `SERVER_PORT` - HTTP gateway port (default: 3000)
    /// - `FETCH_TIMEOUT_MS` - Network deadline in ms (default: 10000)
    /// - `PAYLOAD_POLICY` - `default-empty` or `reject` (default: default-empty)
    /// - `CLIENT_IDLE_SECS` - Idle window before an unpolled page is dropped (default: 300)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            app_name: env::var("APP_NAME").unwrap_or(defaults.app_name),
            display_name: env::var("APP_DISPLAY_NAME").unwrap_or(defaults.display_name),
            role: env::var("APP_ROLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.role),
            version: env::var("CACHE_VERSION").unwrap_or(defaults.version),
            origin: env::var("ORIGIN")
                .ok()
                .and_then(|v| Url::parse(&v).ok())
                .unwrap_or(defaults.origin),
            upstream: env::var("UPSTREAM_URL")
                .ok()
                .and_then(|v| Url::parse(&v).ok())
                .unwrap_or(defaults.upstream),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            fetch_timeout_ms: env::var("FETCH_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.fetch_timeout_ms),
            payload_policy: env::var("PAYLOAD_POLICY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.payload_policy),
            client_idle_secs: env::var("CLIENT_IDLE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.client_idle_secs),
        }
    }

    /// The fetch deadline as a Duration.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// The page idle window as a Duration.
    pub fn client_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.client_idle_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "thynktech".to_string(),
            display_name: "ThynkTech".to_string(),
            role: Role::Admin,
            version: "1".to_string(),
            origin: Url::parse(DEFAULT_ORIGIN).expect("default origin is a valid URL"),
            upstream: Url::parse(DEFAULT_UPSTREAM).expect("default upstream is a valid URL"),
            server_port: 3000,
            fetch_timeout_ms: 10_000,
            payload_policy: PayloadPolicy::DefaultToEmpty,
            client_idle_secs: 300,
        }
    }
}
