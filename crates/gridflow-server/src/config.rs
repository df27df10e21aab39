//! Configuration for the Gridflow Server
//!
//! Settings come from an optional YAML file (path in `GRIDFLOW_CONFIG`),
//! then environment variables override individual fields.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{ServerError, ServerResult};

/// Default authorization attributes attached to every request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthzDefaults {
    /// Required role, if any
    #[serde(default)]
    pub role: Option<String>,
    /// Required group, if any
    #[serde(default)]
    pub group: Option<String>,
    /// Required site, if any
    #[serde(default)]
    pub site: Option<String>,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host to bind to
    #[serde(default = "default_host")]
    pub bind_address: String,

    /// Application name, first path segment of every resource
    #[serde(default = "default_application")]
    pub application: String,

    /// Maximum number of requests handled concurrently
    #[serde(default = "default_thread_pool")]
    pub thread_pool: usize,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Operator contact address
    #[serde(default = "default_admin")]
    pub admin: String,

    #[serde(default = "default_description")]
    pub description: String,

    #[serde(default = "default_title")]
    pub title: String,

    /// URL of the workflow manager; `memory://` selects the in-process manager
    #[serde(default = "default_manager_url")]
    pub manager_url: String,

    /// Monitoring database
    #[serde(default = "default_couch_url")]
    pub monitoring_url: String,
    #[serde(default = "default_monitoring_name")]
    pub monitoring_name: String,

    /// Configuration cache database
    #[serde(default = "default_couch_url")]
    pub configcache_url: String,
    #[serde(default = "default_configcache_name")]
    pub configcache_name: String,

    /// Request manager database
    #[serde(default = "default_couch_url")]
    pub reqmgr_url: String,
    #[serde(default = "default_reqmgr_name")]
    pub reqmgr_name: String,

    /// Header carrying the caller DN, set by the authenticating front-end
    #[serde(default = "default_dn_header")]
    pub dn_header: String,

    /// Header carrying the caller login
    #[serde(default = "default_login_header")]
    pub login_header: String,

    #[serde(default)]
    pub authz_defaults: AuthzDefaults,
}

fn default_port() -> u16 {
    8270
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_application() -> String {
    "crabserver".to_string()
}

fn default_thread_pool() -> usize {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_admin() -> String {
    "cms.analysis.ops@cern.ch".to_string()
}

fn default_description() -> String {
    "CRABServer RESTFull API".to_string()
}

fn default_title() -> String {
    "CRABRESTFull".to_string()
}

fn default_manager_url() -> String {
    "memory://local".to_string()
}

fn default_couch_url() -> String {
    "http://localhost:5984".to_string()
}

fn default_monitoring_name() -> String {
    "wmstats".to_string()
}

fn default_configcache_name() -> String {
    "wmagent_configcache".to_string()
}

fn default_reqmgr_name() -> String {
    "reqmgrdb".to_string()
}

fn default_dn_header() -> String {
    "cms-authn-dn".to_string()
}

fn default_login_header() -> String {
    "cms-authn-login".to_string()
}

impl ServerConfig {
    /// Load configuration from the optional config file and environment variables
    pub fn load() -> ServerResult<Self> {
        let mut config = match env::var("GRIDFLOW_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };

        config.apply_env();
        config.validate()?;

        info!(application = %config.application, port = config.port, "Loaded server configuration");
        Ok(config)
    }

    /// Read a YAML configuration file; absent fields take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ServerError::ConfigurationError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&contents)
    }

    /// Parse a YAML configuration document
    pub fn from_yaml(contents: &str) -> ServerResult<Self> {
        let config: ServerConfig = serde_yaml::from_str(contents)?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(port) = env::var("SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.port = port;
            } else {
                warn!("Invalid SERVER_PORT value: {}", port);
            }
        }

        if let Ok(host) = env::var("SERVER_HOST") {
            self.bind_address = host;
        }

        if let Ok(application) = env::var("SERVER_APPLICATION") {
            self.application = application;
        }

        if let Ok(pool) = env::var("SERVER_THREAD_POOL") {
            if let Ok(pool) = pool.parse::<usize>() {
                self.thread_pool = pool;
            } else {
                warn!("Invalid SERVER_THREAD_POOL value: {}", pool);
            }
        }

        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.log_level = log_level;
        }

        if let Ok(manager_url) = env::var("WORKFLOW_MANAGER_URL") {
            self.manager_url = manager_url;
        }

        if let Ok(header) = env::var("AUTHN_DN_HEADER") {
            self.dn_header = header;
        }

        if let Ok(header) = env::var("AUTHN_LOGIN_HEADER") {
            self.login_header = header;
        }
    }

    /// Check the settings that cannot be defaulted away
    pub fn validate(&self) -> ServerResult<()> {
        if self.thread_pool == 0 {
            return Err(ServerError::ConfigurationError(
                "thread_pool must be at least 1".to_string(),
            ));
        }

        if self.application.is_empty() || self.application.contains('/') {
            return Err(ServerError::ConfigurationError(format!(
                "Invalid application name '{}'",
                self.application
            )));
        }

        if self.dn_header.is_empty() || self.login_header.is_empty() {
            return Err(ServerError::ConfigurationError(
                "Identity header names must not be empty".to_string(),
            ));
        }

        if !self.manager_url.starts_with("memory://") {
            warn!(manager_url = %self.manager_url, "Workflow manager URL scheme is not recognized");
        }

        Ok(())
    }

    /// Path of the workflow resource, e.g. `/crabserver/workflow`
    pub fn workflow_path(&self) -> String {
        format!("/{}/workflow", self.application)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_host(),
            application: default_application(),
            thread_pool: default_thread_pool(),
            log_level: default_log_level(),
            admin: default_admin(),
            description: default_description(),
            title: default_title(),
            manager_url: default_manager_url(),
            monitoring_url: default_couch_url(),
            monitoring_name: default_monitoring_name(),
            configcache_url: default_couch_url(),
            configcache_name: default_configcache_name(),
            reqmgr_url: default_couch_url(),
            reqmgr_name: default_reqmgr_name(),
            dn_header: default_dn_header(),
            login_header: default_login_header(),
            authz_defaults: AuthzDefaults::default(),
        }
    }
}
