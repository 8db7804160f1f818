use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::processors::template::Template;

pub const DEFAULT_LOKI_ENDPOINT: &str = "http://localhost:3100";
pub const LOKI_PUSH_PATH: &str = "/loki/api/v1/push";
pub const DEFAULT_LOG_TEMPLATE: &str = "$message";
pub const DEFAULT_LOG_TEMPLATE_VARIABLES: &str = "message";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid LOKI_ENDPOINT {endpoint:?}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
}

/// Per-invocation configuration, read from the Lambda environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Full push URL (base endpoint joined with `/loki/api/v1/push`)
    pub loki_endpoint: Url,

    /// JSON fields promoted to stream labels, in configured order
    pub log_labels: Vec<String>,

    /// Message template; `None` when labels are not configured
    pub log_template: Option<Template>,

    /// JSON fields made available to the template
    pub log_template_variables: Vec<String>,

    /// Drop records whose message does not start with `{`
    pub log_ignore_non_json: bool,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup (used in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint =
            lookup("LOKI_ENDPOINT").unwrap_or_else(|| DEFAULT_LOKI_ENDPOINT.to_string());
        let loki_endpoint = push_url(&endpoint)?;

        let log_labels = lookup("LOG_LABELS")
            .map(|s| split_list(&s))
            .unwrap_or_default();

        let explicit_template = lookup("LOG_TEMPLATE");
        let log_template = if log_labels.is_empty() {
            if let Some(ref template) = explicit_template {
                warn!(
                    template = %template,
                    "LOG_TEMPLATE is set but LOG_LABELS is empty, ignoring template"
                );
            }
            None
        } else {
            let source = explicit_template.unwrap_or_else(|| DEFAULT_LOG_TEMPLATE.to_string());
            Some(Template::parse(&source))
        };

        let log_template_variables = split_list(
            &lookup("LOG_TEMPLATE_VARIABLES")
                .unwrap_or_else(|| DEFAULT_LOG_TEMPLATE_VARIABLES.to_string()),
        );

        if let Some(ref template) = log_template {
            for name in template.placeholders() {
                if !log_template_variables.iter().any(|v| v == name) {
                    warn!(
                        placeholder = %name,
                        "Template placeholder is not in LOG_TEMPLATE_VARIABLES, it will be left as-is"
                    );
                }
            }
        }

        let log_ignore_non_json = lookup("LOG_IGNORE_NON_JSON")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        Ok(Self {
            loki_endpoint,
            log_labels,
            log_template,
            log_template_variables,
            log_ignore_non_json,
        })
    }

    /// Whether messages are rendered through the template.
    pub fn templating_enabled(&self) -> bool {
        !self.log_labels.is_empty() && self.log_template.is_some()
    }

    /// Print the effective configuration
    pub fn print_config(&self) {
        info!("Loki push URL: {}", self.loki_endpoint);
        info!("Log labels: {:?}", self.log_labels);
        match self.log_template {
            Some(ref template) => info!(
                "Log template: {} (variables: {:?})",
                template.source(),
                self.log_template_variables
            ),
            None => info!("Log template: disabled"),
        }
        info!("Ignore non-JSON records: {}", self.log_ignore_non_json);
    }
}

/// Join a base URL with the Loki push path.
///
/// The push path is absolute, so any path on the base URL is replaced.
pub fn push_url(endpoint: &str) -> Result<Url, ConfigError> {
    Url::parse(endpoint)
        .and_then(|base| base.join(LOKI_PUSH_PATH))
        .map_err(|source| ConfigError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            source,
        })
}

fn split_list(value: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !items.iter().any(|existing| existing == item) {
            items.push(item.to_string());
        }
    }
    items
}

fn parse_flag(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true")
}
