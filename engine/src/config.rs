//! Server configuration from environment variables.
//!
//! | Variable                | Default   |
//! |-------------------------|-----------|
//! | `HTTP_PORT`             | `21000`   |
//! | `BIND_ADDR`             | `0.0.0.0` |
//! | `DEFAULT_MAX_PRIORITY`  | `10`      |
//! | `DEFAULT_DELAY_SECONDS` | `0`       |
//! | `MAX_MESSAGE_SIZE`      | `65536`   |
//!
//! Unparseable or out-of-range values fall back to the default with a warning.
//! `LOG_FORMAT` is read by `telemetry`, before any of these are parsed.

use std::str::FromStr;

use tracing::warn;

use crate::protocol::QueueOptions;

pub const DEFAULT_HTTP_PORT: u16 = 21000;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub http_port: u16,
    pub bind_addr: String,
    /// Starting point for every queue created through the directory.
    pub queue_defaults: QueueOptions,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: DEFAULT_HTTP_PORT,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            queue_defaults: QueueOptions::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let http_port = parse_or(&lookup, "HTTP_PORT", defaults.http_port);
        let http_port = if http_port == 0 {
            warn!(key = "HTTP_PORT", "Port must be 1-65535, using default");
            DEFAULT_HTTP_PORT
        } else {
            http_port
        };

        let bind_addr = lookup("BIND_ADDR")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.bind_addr);

        let mut queue_defaults = QueueOptions::default()
            .with_max_priority(parse_or(
                &lookup,
                "DEFAULT_MAX_PRIORITY",
                QueueOptions::DEFAULT_MAX_PRIORITY,
            ))
            .with_delay_seconds(parse_or(&lookup, "DEFAULT_DELAY_SECONDS", 0))
            .with_max_message_size(parse_or(
                &lookup,
                "MAX_MESSAGE_SIZE",
                QueueOptions::DEFAULT_MAX_MESSAGE_SIZE,
            ));
        if let Err(e) = queue_defaults.validate() {
            warn!(error = %e, "Invalid queue defaults, using built-in defaults");
            queue_defaults = QueueOptions::default();
        }

        Self {
            http_port,
            bind_addr,
            queue_defaults,
        }
    }

    #[inline]
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.http_port)
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key, value = %raw, "Invalid value, using default");
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]);
        assert_eq!(cfg, ServerConfig::default());
        assert_eq!(cfg.http_addr(), "0.0.0.0:21000");
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("HTTP_PORT", "8080"),
            ("BIND_ADDR", "127.0.0.1"),
            ("DEFAULT_MAX_PRIORITY", "20"),
            ("DEFAULT_DELAY_SECONDS", "3"),
            ("MAX_MESSAGE_SIZE", "1024"),
        ]);
        assert_eq!(cfg.http_addr(), "127.0.0.1:8080");
        assert_eq!(cfg.queue_defaults.max_priority, 20);
        assert_eq!(cfg.queue_defaults.delay_seconds, 3);
        assert_eq!(cfg.queue_defaults.max_message_size, 1024);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let cfg = config(&[
            ("HTTP_PORT", "0"),
            ("DEFAULT_MAX_PRIORITY", "lots"),
            ("MAX_MESSAGE_SIZE", "-5"),
        ]);
        assert_eq!(cfg.http_port, DEFAULT_HTTP_PORT);
        assert_eq!(cfg.queue_defaults, QueueOptions::default());
    }

    #[test]
    fn test_out_of_range_defaults_rejected() {
        let cfg = config(&[("DEFAULT_MAX_PRIORITY", "5000")]);
        assert_eq!(cfg.queue_defaults, QueueOptions::default());
    }
}
