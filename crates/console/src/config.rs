//! Console configuration (environment driven).

use bankconsole_gateway::{Capability, GatewayCapabilities, HttpGateway};

use crate::error::{ConsoleError, ConsoleResult};
use crate::session::SessionSettings;

pub const ENV_API_URL: &str = "BANK_API_URL";
pub const ENV_AUTH_TOKEN: &str = "BANK_AUTH_TOKEN";
pub const ENV_DISABLED_OPERATIONS: &str = "BANK_DISABLED_OPERATIONS";
pub const ENV_STRICT_CAPABILITIES: &str = "BANK_STRICT_CAPABILITIES";
pub const ENV_LISTING_PATH: &str = "BANK_LISTING_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub api_url: String,
    pub auth_token: Option<String>,
    /// Aliases this deployment does not implement.
    pub disabled_operations: Vec<Capability>,
    /// Turn an exhausted verb chain into an error instead of a silent no-op.
    pub strict_capabilities: bool,
    pub listing_path: String,
    /// Id probed when a screen mounts without any route context.
    pub default_probe_id: i64,
    /// Password sent when a customer is created without one.
    pub default_password: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".to_string(),
            auth_token: None,
            disabled_operations: Vec::new(),
            strict_capabilities: false,
            listing_path: "/bank".to_string(),
            default_probe_id: 1,
            default_password: "Password@123".to_string(),
        }
    }
}

impl ConsoleConfig {
    pub fn from_env() -> ConsoleResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConsoleResult<Self> {
        let mut config = Self::default();

        if let Some(url) = non_empty(lookup(ENV_API_URL)) {
            config.api_url = url;
        }
        config.auth_token = non_empty(lookup(ENV_AUTH_TOKEN));

        if let Some(list) = lookup(ENV_DISABLED_OPERATIONS) {
            config.disabled_operations = GatewayCapabilities::parse_tags(&list)
                .map_err(|e| ConsoleError::config(format!("{ENV_DISABLED_OPERATIONS}: {e}")))?;
        }
        if let Some(flag) = non_empty(lookup(ENV_STRICT_CAPABILITIES)) {
            config.strict_capabilities = parse_bool(&flag).ok_or_else(|| {
                ConsoleError::config(format!("{ENV_STRICT_CAPABILITIES}: not a boolean: {flag:?}"))
            })?;
        }
        if let Some(path) = non_empty(lookup(ENV_LISTING_PATH)) {
            if !path.starts_with('/') {
                return Err(ConsoleError::config(format!(
                    "{ENV_LISTING_PATH}: must be an absolute path, got {path:?}"
                )));
            }
            config.listing_path = path;
        }

        Ok(config)
    }

    /// Full backend surface minus the disabled aliases.
    pub fn capabilities(&self) -> GatewayCapabilities {
        let mut caps = GatewayCapabilities::all();
        caps.remove_all(&self.disabled_operations);
        caps
    }

    pub fn http_gateway(&self) -> HttpGateway {
        let gateway = match &self.auth_token {
            Some(token) => HttpGateway::with_token(&self.api_url, token),
            None => HttpGateway::new(&self.api_url),
        };
        gateway.with_capabilities(self.capabilities())
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            default_probe_id: self.default_probe_id,
            default_password: self.default_password.clone(),
            listing_path: self.listing_path.clone(),
            strict_capabilities: self.strict_capabilities,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
