//! GCP Authentication
//!
//! Resolves one credential source per call from the action parameters:
//! a pre-minted access token, inline service account key material, a key
//! file on disk, or Application Default Credentials.

use crate::error::{ActionError, Result};
use gcp_auth::{CustomServiceAccount, TokenProvider};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default scopes for GCP API access
pub const DEFAULT_SCOPES: &[&str] = &["https://www.googleapis.com/auth/cloud-platform"];

/// Where credentials for a single call come from
#[derive(Clone, PartialEq)]
pub enum AuthStrategy {
    /// Bearer token used verbatim
    AccessToken(String),
    /// Service account key JSON
    Inline(String),
    /// Path to a service account key file
    KeyFile(PathBuf),
    /// Application Default Credentials
    ApplicationDefault,
}

impl fmt::Debug for AuthStrategy {
    // Key material and tokens never reach the logs
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthStrategy::AccessToken(_) => f.write_str("AccessToken(..)"),
            AuthStrategy::Inline(_) => f.write_str("Inline(..)"),
            AuthStrategy::KeyFile(path) => f.debug_tuple("KeyFile").field(path).finish(),
            AuthStrategy::ApplicationDefault => f.write_str("ApplicationDefault"),
        }
    }
}

impl AuthStrategy {
    /// Pick a strategy from action params.
    /// Precedence: ACCESS_TOKEN, CREDENTIALS, KEYFILE, then ADC.
    pub fn from_params(
        access_token: Option<&str>,
        credentials: Option<&Value>,
        key_file: Option<&str>,
    ) -> Result<Self> {
        if let Some(token) = access_token.filter(|t| !t.is_empty()) {
            return Ok(AuthStrategy::AccessToken(token.to_string()));
        }

        match credentials {
            Some(key @ Value::Object(_)) => {
                return Ok(AuthStrategy::Inline(serde_json::to_string(key)?));
            },
            Some(Value::String(s)) if !s.trim().is_empty() => {
                return Ok(AuthStrategy::Inline(s.clone()));
            },
            Some(Value::Null) | Some(Value::String(_)) | None => {},
            Some(_) => {
                return Err(ActionError::InvalidParam {
                    name: "CREDENTIALS",
                    reason: "expected a service account key object or JSON string".to_string(),
                });
            },
        }

        if let Some(path) = key_file.filter(|p| !p.is_empty()) {
            return Ok(AuthStrategy::KeyFile(PathBuf::from(path)));
        }

        Ok(AuthStrategy::ApplicationDefault)
    }
}

/// Token source resolved for one call
#[derive(Clone)]
pub struct GcpCredentials {
    source: TokenSource,
}

#[derive(Clone)]
enum TokenSource {
    Static(String),
    ServiceAccount(Arc<CustomServiceAccount>),
    ApplicationDefault(Arc<dyn TokenProvider>),
}

impl GcpCredentials {
    /// Build credentials for the given strategy
    pub async fn new(strategy: &AuthStrategy) -> Result<Self> {
        tracing::debug!("Resolving credentials: {:?}", strategy);

        let source = match strategy {
            AuthStrategy::AccessToken(token) => TokenSource::Static(token.clone()),
            AuthStrategy::Inline(json) => {
                TokenSource::ServiceAccount(Arc::new(CustomServiceAccount::from_json(json)?))
            },
            AuthStrategy::KeyFile(path) => {
                TokenSource::ServiceAccount(Arc::new(CustomServiceAccount::from_file(path)?))
            },
            AuthStrategy::ApplicationDefault => {
                TokenSource::ApplicationDefault(gcp_auth::provider().await?)
            },
        };

        Ok(Self { source })
    }

    /// Get an access token for API calls
    pub async fn get_token(&self) -> Result<String> {
        let token = match &self.source {
            TokenSource::Static(token) => return Ok(token.clone()),
            TokenSource::ServiceAccount(account) => account.token(DEFAULT_SCOPES).await?,
            TokenSource::ApplicationDefault(provider) => provider.token(DEFAULT_SCOPES).await?,
        };
        Ok(token.as_str().to_string())
    }

    /// Project named in an explicit service account key
    pub fn key_project_id(&self) -> Option<String> {
        match &self.source {
            TokenSource::ServiceAccount(account) => account.project_id().map(str::to_string),
            TokenSource::Static(_) | TokenSource::ApplicationDefault(_) => None,
        }
    }

    /// Project reported by Application Default Credentials.
    ///
    /// This can be a quota project or the metadata server's project, so it
    /// only ranks below every configured default.
    pub async fn ambient_project_id(&self) -> Option<String> {
        let TokenSource::ApplicationDefault(provider) = &self.source else {
            return None;
        };

        match provider.project_id().await {
            Ok(project) => Some(project.to_string()),
            Err(e) => {
                tracing::debug!("Default credentials carry no project: {}", e);
                None
            },
        }
    }
}

/// Get the gcloud configuration directory
pub fn get_gcloud_config_dir() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CLOUDSDK_CONFIG") {
        return Some(PathBuf::from(path));
    }

    dirs::config_dir().map(|p| p.join("gcloud"))
}

/// Validate a GCP project ID format
/// Project IDs must be 6-30 characters, lowercase letters, digits, and hyphens
/// Must start with a letter and cannot end with a hyphen
pub fn validate_project_id(project: &str) -> bool {
    if project.len() < 6 || project.len() > 30 {
        return false;
    }

    match project.chars().next() {
        Some(c) if c.is_ascii_lowercase() => {},
        _ => return false,
    }

    if project.ends_with('-') {
        return false;
    }

    project.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Read `key` from `[section]` of an INI-style gcloud file
fn read_gcloud_property(content: &str, section: &str, key: &str) -> Option<String> {
    let header = format!("[{}]", section);
    let mut in_section = false;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') {
            in_section = line == header;
            continue;
        }
        if !in_section {
            continue;
        }
        if let Some((name, value)) = line.split_once('=') {
            if name.trim() == key {
                return Some(value.trim().to_string());
            }
        }
    }

    None
}

/// Contents of the active gcloud configuration file
fn read_active_gcloud_config() -> Option<String> {
    let config_dir = get_gcloud_config_dir()?;
    let active_config = std::fs::read_to_string(config_dir.join("active_config")).ok()?;
    let config_name = active_config.trim();

    // Reject names that could escape the configurations directory
    if !config_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        tracing::warn!("Invalid characters in active_config name");
        return None;
    }

    let config_path = config_dir
        .join("configurations")
        .join(format!("config_{}", config_name));
    std::fs::read_to_string(config_path).ok()
}

/// Read the default project from the environment or gcloud configuration
pub fn get_default_project() -> Option<String> {
    for var in ["CLOUDSDK_CORE_PROJECT", "GOOGLE_CLOUD_PROJECT", "GCLOUD_PROJECT"] {
        if let Ok(project) = std::env::var(var) {
            if validate_project_id(&project) {
                return Some(project);
            }
            tracing::warn!("Invalid project ID format in {}", var);
        }
    }

    let config_dir = get_gcloud_config_dir()?;
    if let Ok(content) = std::fs::read_to_string(config_dir.join("properties")) {
        if let Some(project) = read_gcloud_property(&content, "core", "project") {
            if validate_project_id(&project) {
                return Some(project);
            }
        }
    }

    read_active_gcloud_config()
        .and_then(|content| read_gcloud_property(&content, "core", "project"))
        .filter(|project| validate_project_id(project))
}

/// Get the default zone from the environment or gcloud configuration
pub fn get_default_zone() -> Option<String> {
    if let Ok(zone) = std::env::var("CLOUDSDK_COMPUTE_ZONE") {
        return Some(zone);
    }

    read_active_gcloud_config().and_then(|content| read_gcloud_property(&content, "compute", "zone"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_access_token_wins() {
        let creds = json!({"type": "service_account"});
        let strategy =
            AuthStrategy::from_params(Some("ya29.token"), Some(&creds), Some("/tmp/key.json"))
                .unwrap();
        assert_eq!(strategy, AuthStrategy::AccessToken("ya29.token".to_string()));
    }

    #[test]
    fn test_inline_object_beats_key_file() {
        let creds = json!({"type": "service_account", "client_email": "a@b.iam"});
        let strategy = AuthStrategy::from_params(None, Some(&creds), Some("/tmp/key.json")).unwrap();
        match strategy {
            AuthStrategy::Inline(json) => {
                let parsed: Value = serde_json::from_str(&json).unwrap();
                assert_eq!(parsed, creds);
            },
            other => panic!("unexpected strategy {:?}", other),
        }
    }

    #[test]
    fn test_inline_string_is_passed_through() {
        let creds = json!("{\"type\": \"service_account\"}");
        let strategy = AuthStrategy::from_params(None, Some(&creds), None).unwrap();
        assert_eq!(
            strategy,
            AuthStrategy::Inline("{\"type\": \"service_account\"}".to_string())
        );
    }

    #[test]
    fn test_key_file_then_adc() {
        let strategy = AuthStrategy::from_params(None, None, Some("/etc/key.json")).unwrap();
        assert_eq!(strategy, AuthStrategy::KeyFile(PathBuf::from("/etc/key.json")));

        let blank = json!("  ");
        let strategy = AuthStrategy::from_params(Some(""), Some(&blank), None).unwrap();
        assert_eq!(strategy, AuthStrategy::ApplicationDefault);
    }

    #[test]
    fn test_credentials_of_wrong_type_rejected() {
        let creds = json!(42);
        let err = AuthStrategy::from_params(None, Some(&creds), None).unwrap_err();
        assert!(matches!(err, ActionError::InvalidParam { name: "CREDENTIALS", .. }));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let strategy = AuthStrategy::AccessToken("ya29.secret".to_string());
        assert!(!format!("{:?}", strategy).contains("secret"));
        let strategy = AuthStrategy::Inline("{\"private_key\": \"secret\"}".to_string());
        assert!(!format!("{:?}", strategy).contains("secret"));
    }

    #[test]
    fn test_static_token_credentials() {
        let creds = tokio_test::block_on(GcpCredentials::new(&AuthStrategy::AccessToken(
            "static".to_string(),
        )))
        .unwrap();
        assert_eq!(tokio_test::block_on(creds.get_token()).unwrap(), "static");
        assert_eq!(creds.key_project_id(), None);
        assert_eq!(tokio_test::block_on(creds.ambient_project_id()), None);
    }

    #[test]
    fn test_only_service_account_keys_name_a_project() {
        let key = json!({
            "type": "service_account",
            "project_id": "key-project",
            "client_email": "svc@key-project.iam.gserviceaccount.com",
            "private_key": include_str!(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/tests/fixtures/service-account-key.pem"
            )),
            "token_uri": "http://127.0.0.1:9/token",
        });
        let strategy = AuthStrategy::from_params(None, Some(&key), None).unwrap();
        let creds = tokio_test::block_on(GcpCredentials::new(&strategy)).unwrap();

        assert_eq!(creds.key_project_id().as_deref(), Some("key-project"));
        assert_eq!(tokio_test::block_on(creds.ambient_project_id()), None);
    }

    #[test]
    fn test_validate_project_id() {
        assert!(validate_project_id("my-project-123"));
        assert!(!validate_project_id("short"));
        assert!(!validate_project_id("1starts-with-digit"));
        assert!(!validate_project_id("ends-with-hyphen-"));
        assert!(!validate_project_id("Has-Upper-Case"));
    }

    #[test]
    fn test_read_gcloud_property_sections() {
        let content = "\
[core]
account = me@example.com
project = core-project

[compute]
# comment
zone = europe-west1-b
region=europe-west1
";
        assert_eq!(
            read_gcloud_property(content, "core", "project").as_deref(),
            Some("core-project")
        );
        assert_eq!(
            read_gcloud_property(content, "compute", "zone").as_deref(),
            Some("europe-west1-b")
        );
        assert_eq!(
            read_gcloud_property(content, "compute", "region").as_deref(),
            Some("europe-west1")
        );
        assert_eq!(read_gcloud_property(content, "compute", "project"), None);
    }
}
