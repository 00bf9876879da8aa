//! Database connection configuration
//!
//! Account, API key and endpoints for the hosted database, read from the
//! environment with placeholder defaults.

use serde::{Deserialize, Serialize};

/// Connection settings for the hosted document database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudantConfig {
    /// Account name (env: `CLOUDANT_ID`)
    #[serde(default = "default_account")]
    pub account: String,

    /// Explicit account URL (env: `CLOUDANT_URL`); derived from the account when unset
    #[serde(default)]
    pub url: Option<String>,

    /// IAM API key (env: `CLOUDANT_IAM_APIKEY`)
    #[serde(default = "default_api_key")]
    pub api_key: String,

    /// IAM token endpoint (env: `CLOUDANT_IAM_URL`)
    #[serde(default = "default_iam_url")]
    pub iam_url: String,
}

fn default_account() -> String {
    "<cloudant_id>".to_string()
}

fn default_api_key() -> String {
    "<cloudant_apikey>".to_string()
}

fn default_iam_url() -> String {
    "https://iam.cloud.ibm.com/identity/token".to_string()
}

impl Default for CloudantConfig {
    fn default() -> Self {
        Self {
            account: default_account(),
            url: None,
            api_key: default_api_key(),
            iam_url: default_iam_url(),
        }
    }
}

impl CloudantConfig {
    /// Load from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key lookup; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            account: get("CLOUDANT_ID").unwrap_or(defaults.account),
            url: get("CLOUDANT_URL"),
            api_key: get("CLOUDANT_IAM_APIKEY").unwrap_or(defaults.api_key),
            iam_url: get("CLOUDANT_IAM_URL").unwrap_or(defaults.iam_url),
        }
    }

    /// Base URL of the account
    pub fn account_url(&self) -> String {
        match &self.url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}.cloudant.com", self.account),
        }
    }
}
