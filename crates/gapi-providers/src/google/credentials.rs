//! The persisted OAuth credential set and its on-disk store.
//!
//! The file layout is plain JSON:
//!
//! ```json
//! {
//!   "token": "ya29...",
//!   "refresh_token": "1//0g...",
//!   "token_uri": "https://oauth2.googleapis.com/token",
//!   "client_id": "....apps.googleusercontent.com",
//!   "client_secret": "...",
//!   "scopes": ["https://www.googleapis.com/auth/calendar", "..."],
//!   "expiry": "2026-02-28T10:00:00Z"
//! }
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

use super::config::{DEFAULT_TOKEN_URI, required_scopes};
use super::oauth::TokenGrant;

/// Seconds subtracted from `expires_in` so a token is refreshed before the
/// service starts rejecting it.
const EXPIRY_SKEW_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Tokens plus everything needed to refresh them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSet {
    /// Short-lived access token.
    #[serde(default)]
    pub token: String,

    /// Long-lived refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Token endpoint used for refresh.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,

    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: String,

    /// Granted scopes.
    #[serde(default = "required_scopes")]
    pub scopes: Vec<String>,

    /// When the access token stops being usable.
    #[serde(
        default,
        with = "expiry_format",
        skip_serializing_if = "Option::is_none"
    )]
    pub expiry: Option<DateTime<Utc>>,
}

impl CredentialSet {
    /// Returns true if the access token must be refreshed before use.
    pub fn is_expired(&self) -> bool {
        self.expiry.is_some_and(|expiry| Utc::now() >= expiry)
    }

    /// Returns true if every required scope was granted.
    pub fn has_scopes(&self, required: &[String]) -> bool {
        required.iter().all(|scope| self.scopes.contains(scope))
    }

    /// Returns true if the access token can be sent right now.
    pub fn is_usable(&self, required: &[String]) -> bool {
        !self.token.is_empty() && self.has_scopes(required) && !self.is_expired()
    }

    /// Returns true if a refresh exchange can be attempted.
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Applies a token endpoint response.
    ///
    /// The refresh token and scope list are only replaced when the response
    /// carries new ones.
    pub fn apply_grant(&mut self, grant: TokenGrant) {
        self.token = grant.access_token;
        self.expiry = grant.expires_in.map(expiry_from_now);
        if let Some(refresh_token) = grant.refresh_token {
            self.refresh_token = Some(refresh_token);
        }
        if let Some(scopes) = grant.scopes {
            self.scopes = scopes;
        }
    }
}

/// `now + expires_in - 60s`.
pub fn expiry_from_now(expires_in_secs: i64) -> DateTime<Utc> {
    Utc::now() + Duration::seconds(expires_in_secs) - Duration::seconds(EXPIRY_SKEW_SECS)
}

/// RFC 3339 on write; RFC 3339 or offset-less ISO 8601 (taken as UTC) on read.
mod expiry_format {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(expiry) => {
                serializer.serialize_some(&expiry.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|value| {
            parse(&value).ok_or_else(|| D::Error::custom(format!("invalid expiry {value:?}")))
        })
        .transpose()
    }

    fn parse(value: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// File-backed persistence of a [`CredentialSet`].
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads the credential set. A missing file means "not yet authorized".
    pub fn load(&self) -> ProviderResult<Option<CredentialSet>> {
        if !self.path.exists() {
            debug!("no credential file at {:?}", self.path);
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            ProviderError::corrupt_store(format!(
                "failed to read {}: {}",
                self.path.display(),
                e
            ))
            .with_source(e)
        })?;

        let credentials: CredentialSet = serde_json::from_str(&content).map_err(|e| {
            ProviderError::corrupt_store(format!(
                "failed to parse {}: {}",
                self.path.display(),
                e
            ))
            .with_source(e)
        })?;

        debug!("loaded credentials from {:?}", self.path);
        Ok(Some(credentials))
    }

    /// Overwrites the file with `credentials`.
    ///
    /// The content goes to a sibling temp file that is renamed over the
    /// target, so a crash never leaves a half-written file behind.
    pub fn save(&self, credentials: &CredentialSet) -> ProviderResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                ProviderError::internal(format!(
                    "failed to create credential directory {}: {}",
                    parent.display(),
                    e
                ))
                .with_source(e)
            })?;
        }

        let content = serde_json::to_string_pretty(credentials).map_err(|e| {
            ProviderError::internal(format!("failed to serialize credentials: {}", e))
        })?;

        let temp_path = self.path.with_extension("json.tmp");
        write_private(&temp_path, content.as_bytes()).map_err(|e| {
            ProviderError::internal(format!(
                "failed to write {}: {}",
                temp_path.display(),
                e
            ))
            .with_source(e)
        })?;

        fs::rename(&temp_path, &self.path).map_err(|e| {
            ProviderError::internal(format!(
                "failed to replace {}: {}",
                self.path.display(),
                e
            ))
            .with_source(e)
        })?;

        info!("saved credentials to {:?}", self.path);
        Ok(())
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Writes a file readable only by the owner (on Unix).
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(content)?;
    file.sync_all()?;

    // `mode` only applies on creation; tighten a leftover temp file too.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(expiry: Option<DateTime<Utc>>) -> CredentialSet {
        CredentialSet {
            token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
            client_id: "id.apps.googleusercontent.com".to_string(),
            client_secret: "secret".to_string(),
            scopes: required_scopes(),
            expiry,
        }
    }

    #[test]
    fn expiry_checks() {
        let mut creds = sample(None);
        assert!(!creds.is_expired());
        assert!(creds.is_usable(&required_scopes()));

        creds.expiry = Some(Utc::now() - Duration::minutes(5));
        assert!(creds.is_expired());
        assert!(!creds.is_usable(&required_scopes()));

        creds.expiry = Some(Utc::now() + Duration::minutes(5));
        assert!(creds.is_usable(&required_scopes()));
    }

    #[test]
    fn missing_scope_is_unusable() {
        let mut creds = sample(None);
        creds.scopes.pop();
        assert!(!creds.has_scopes(&required_scopes()));
        assert!(!creds.is_usable(&required_scopes()));
    }

    #[test]
    fn apply_grant_keeps_refresh_token() {
        let mut creds = sample(Some(Utc::now() - Duration::hours(1)));
        creds.apply_grant(TokenGrant {
            access_token: "new-access".to_string(),
            refresh_token: None,
            expires_in: Some(3600),
            scopes: None,
        });

        assert_eq!(creds.token, "new-access");
        assert_eq!(creds.refresh_token.as_deref(), Some("refresh"));
        assert_eq!(creds.scopes, required_scopes());
        let expiry = creds.expiry.unwrap();
        let remaining = expiry - Utc::now();
        assert!(remaining <= Duration::seconds(3600 - 60));
        assert!(remaining > Duration::seconds(3600 - 120));
    }

    #[test]
    fn round_trip_with_and_without_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));

        let with_expiry = sample(Some(Utc.with_ymd_and_hms(2026, 2, 28, 10, 0, 0).unwrap()));
        store.save(&with_expiry).unwrap();
        assert_eq!(store.load().unwrap(), Some(with_expiry));

        let without_expiry = sample(None);
        store.save(&without_expiry).unwrap();
        assert_eq!(store.load().unwrap(), Some(without_expiry));

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(!raw.contains("expiry"));
    }

    #[test]
    fn round_trip_keeps_subsecond_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));

        let creds = sample(Some(expiry_from_now(3599)));
        store.save(&creds).unwrap();
        assert_eq!(store.load().unwrap(), Some(creds));
    }

    #[test]
    fn load_absent_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("missing.json"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn load_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(&path, "{ not json").unwrap();

        let err = CredentialStore::new(&path).load().unwrap_err();
        assert_eq!(err.code(), crate::ProviderErrorCode::CorruptStore);
    }

    #[test]
    fn load_fills_defaults_and_naive_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(
            &path,
            r#"{
                "token": "t",
                "refresh_token": "r",
                "client_id": "c",
                "client_secret": "s",
                "expiry": "2026-02-28T10:00:00.123456"
            }"#,
        )
        .unwrap();

        let creds = CredentialStore::new(&path).load().unwrap().unwrap();
        assert_eq!(creds.token_uri, DEFAULT_TOKEN_URI);
        assert_eq!(creds.scopes, required_scopes());
        let expected = Utc.with_ymd_and_hms(2026, 2, 28, 10, 0, 0).unwrap()
            + Duration::microseconds(123_456);
        assert_eq!(creds.expiry, Some(expected));
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("gapi").join("credentials.json");
        let store = CredentialStore::new(&path);

        store.save(&sample(None)).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));
        store.save(&sample(None)).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
