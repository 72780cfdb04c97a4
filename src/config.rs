//! Configuration types for an extraction run
//!
//! An `ExtractConfig` is built once at process start (YAML file, then
//! environment overrides, then validation) and passed by value into the
//! orchestrator. Nothing in the crate reads configuration from ambient state.

use crate::error::{Error, Result};
use crate::types::{format_watermark, run_id_at, Method, OptionStringExt};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Top-Level Run Config
// ============================================================================

/// Complete configuration for one extraction run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Source name used in storage layouts (`raw/<source>/...`)
    #[serde(default = "default_source")]
    pub source: String,

    /// Base URL of the upstream API
    pub api_base: String,

    /// Path segment between the base URL and each resource (e.g. "v1")
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Destination bucket URL (`gs://bucket/prefix`, `s3://...`, or a local path)
    pub bucket: String,

    /// Run identifier; generated from the start time when unset
    #[serde(default)]
    pub run_id: Option<String>,

    /// Lookback window for the first-run default watermark
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Where the API token comes from
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Record normalization settings
    #[serde(default)]
    pub normalize: NormalizeConfig,

    /// Field names that may wrap the records of a page
    #[serde(default = "default_records_fields")]
    pub records_fields: Vec<String>,

    /// Candidate cursor fields, first present wins
    #[serde(default = "default_cursor_fields")]
    pub cursor_fields: Vec<String>,

    /// Per-endpoint ceiling on the number of pages fetched
    #[serde(default)]
    pub max_pages: Option<u32>,

    /// Maximum endpoints extracted in parallel within one dependency level
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Endpoint table keyed by endpoint identifier
    #[serde(default)]
    pub endpoints: BTreeMap<String, EndpointSpec>,
}

fn default_source() -> String {
    "scope".to_string()
}

fn default_api_prefix() -> String {
    "v1".to_string()
}

fn default_lookback_days() -> u32 {
    7
}

fn default_records_fields() -> Vec<String> {
    vec!["data".to_string(), "items".to_string(), "results".to_string()]
}

fn default_cursor_fields() -> Vec<String> {
    vec![
        "updated_at".to_string(),
        "updatedAt".to_string(),
        "modifiedAt".to_string(),
    ]
}

fn default_concurrency() -> usize {
    1
}

impl ExtractConfig {
    /// Create a config with no endpoints
    pub fn new(api_base: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            source: default_source(),
            api_base: api_base.into(),
            api_prefix: default_api_prefix(),
            bucket: bucket.into(),
            run_id: None,
            lookback_days: default_lookback_days(),
            credentials: CredentialsConfig::default(),
            http: HttpConfig::default(),
            normalize: NormalizeConfig::default(),
            records_fields: default_records_fields(),
            cursor_fields: default_cursor_fields(),
            max_pages: None,
            concurrency: default_concurrency(),
            endpoints: BTreeMap::new(),
        }
    }

    /// The Scope endpoint table with production defaults
    pub fn builtin() -> Self {
        let mut config = Self::new("https://api.scope.ws", "gs://scope-ws-extract");
        config.endpoints = builtin_endpoints();
        config
    }

    /// Parse a config from YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a config from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Add or replace an endpoint
    #[must_use]
    pub fn with_endpoint(mut self, name: impl Into<String>, spec: EndpointSpec) -> Self {
        self.endpoints.insert(name.into(), spec);
        self
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base) = lookup("API_BASE").none_if_empty() {
            self.api_base = base;
        }
        if let Some(bucket) = lookup("BUCKET").none_if_empty() {
            self.bucket = bucket;
        }
        if let Some(run_id) = lookup("RUN_ID").none_if_empty() {
            self.run_id = Some(run_id);
        }
        if let Some(secret) = lookup("SCOPE_API_TOKEN_SECRET").none_if_empty() {
            self.credentials.secret_name = secret;
        }
        if let Some(days) = lookup("LOOKBACK_DAYS").none_if_empty() {
            self.lookback_days = days
                .trim()
                .parse()
                .map_err(|_| Error::invalid_value("LOOKBACK_DAYS", format!("'{days}' is not a number")))?;
        }
        Ok(())
    }

    /// Check the config for values no run could succeed with
    pub fn validate(&self) -> Result<()> {
        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(Error::invalid_value(
                "api_base",
                "must be a full http(s) URL",
            ));
        }
        url::Url::parse(&self.api_base)?;

        if self.bucket.trim().is_empty() {
            return Err(Error::missing_field("bucket"));
        }
        if self.source.trim().is_empty() {
            return Err(Error::missing_field("source"));
        }
        if self.endpoints.is_empty() {
            return Err(Error::config("No endpoints configured"));
        }
        if self.http.max_attempts == 0 {
            return Err(Error::invalid_value("http.max_attempts", "must be at least 1"));
        }
        if self.concurrency == 0 {
            return Err(Error::invalid_value("concurrency", "must be at least 1"));
        }
        self.default_watermark(Utc::now())?;

        let mut state_keys = HashSet::new();
        for (name, spec) in &self.endpoints {
            if spec.resource.trim().is_empty() {
                return Err(Error::invalid_value(
                    format!("endpoints.{name}.resource"),
                    "must not be empty",
                ));
            }
            if spec.page_size == 0 {
                return Err(Error::invalid_value(
                    format!("endpoints.{name}.page_size"),
                    "must be positive",
                ));
            }
            let key = spec.state_key();
            if !state_keys.insert(key.clone()) {
                return Err(Error::invalid_value(
                    format!("endpoints.{name}.state_key"),
                    format!("state key '{key}' is used by more than one endpoint"),
                ));
            }
        }
        Ok(())
    }

    /// Full URL for an endpoint's resource
    pub fn endpoint_url(&self, spec: &EndpointSpec) -> String {
        let base = self.api_base.trim_end_matches('/');
        let resource = spec.resource.trim_start_matches('/');
        let prefix = self.api_prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("{base}/{resource}")
        } else {
            format!("{base}/{prefix}/{resource}")
        }
    }

    /// Run identifier for a run started at `now`
    pub fn resolved_run_id(&self, now: DateTime<Utc>) -> String {
        self.run_id.clone().unwrap_or_else(|| run_id_at(now))
    }

    /// Watermark used when an endpoint has no persisted state
    ///
    /// Fails when `lookback_days` reaches back before the Unix epoch.
    pub fn default_watermark(&self, now: DateTime<Utc>) -> Result<String> {
        now.checked_sub_signed(ChronoDuration::days(i64::from(self.lookback_days)))
            .filter(|start| start.timestamp() >= 0)
            .map(format_watermark)
            .ok_or_else(|| {
                Error::invalid_value(
                    "lookback_days",
                    format!("{} days reaches back before 1970", self.lookback_days),
                )
            })
    }
}

// ============================================================================
// Endpoint Spec
// ============================================================================

/// Immutable descriptor of one upstream endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSpec {
    /// Resource path segment (e.g., "companies/search")
    pub resource: String,

    /// Records requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Watermark key; derived from `resource` when unset
    #[serde(default)]
    pub state_key: Option<String>,

    /// Endpoints that must complete before this one
    #[serde(default)]
    pub dependencies: BTreeSet<String>,

    /// Page protocol
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Static query parameters sent with every page request
    #[serde(default)]
    pub query: BTreeMap<String, String>,
}

fn default_page_size() -> u32 {
    10
}

impl EndpointSpec {
    /// Create an endpoint spec with default settings
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            page_size: default_page_size(),
            state_key: None,
            dependencies: BTreeSet::new(),
            pagination: PaginationConfig::default(),
            query: BTreeMap::new(),
        }
    }

    /// Set page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set an explicit state key
    #[must_use]
    pub fn with_state_key(mut self, key: impl Into<String>) -> Self {
        self.state_key = Some(key.into());
        self
    }

    /// Declare dependencies
    #[must_use]
    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(deps.into_iter().map(Into::into));
        self
    }

    /// Set the page protocol
    #[must_use]
    pub fn with_pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }

    /// Add a static query parameter
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Watermark key for this endpoint
    pub fn state_key(&self) -> String {
        match &self.state_key {
            Some(key) if !key.is_empty() => key.clone(),
            _ => self.resource.trim_matches('/').replace('/', "_"),
        }
    }
}

// ============================================================================
// Pagination Config
// ============================================================================

/// Page protocol for an endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaginationConfig {
    /// POST a JSON body `{offset, limit}`, advancing the offset by the page size
    Offset {
        #[serde(default = "default_offset_field")]
        offset_field: String,
        #[serde(default = "default_limit_field")]
        limit_field: String,
    },

    /// GET with a limit and an opaque "after" token read from each response
    Cursor {
        #[serde(default = "default_limit_field")]
        limit_param: String,
        #[serde(default = "default_cursor_param")]
        cursor_param: String,
        #[serde(default = "default_cursor_path")]
        cursor_path: String,
    },
}

fn default_offset_field() -> String {
    "offset".to_string()
}

fn default_limit_field() -> String {
    "limit".to_string()
}

fn default_cursor_param() -> String {
    "after".to_string()
}

fn default_cursor_path() -> String {
    "paging.next.after".to_string()
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self::offset()
    }
}

impl PaginationConfig {
    /// Offset pagination with the standard field names
    pub fn offset() -> Self {
        Self::Offset {
            offset_field: default_offset_field(),
            limit_field: default_limit_field(),
        }
    }

    /// Cursor pagination with the standard parameter names
    pub fn cursor() -> Self {
        Self::Cursor {
            limit_param: default_limit_field(),
            cursor_param: default_cursor_param(),
            cursor_path: default_cursor_path(),
        }
    }

    /// HTTP method used for page requests
    pub fn method(&self) -> Method {
        match self {
            Self::Offset { .. } => Method::POST,
            Self::Cursor { .. } => Method::GET,
        }
    }
}

// ============================================================================
// Credentials / HTTP / Normalization Config
// ============================================================================

/// Token source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Environment variable holding the token
    #[serde(default = "default_token_env")]
    pub env_var: String,

    /// Secret name, resolved as a file inside `secret_dir`
    #[serde(default = "default_secret_name")]
    pub secret_name: String,

    /// Directory where secrets are mounted
    #[serde(default)]
    pub secret_dir: Option<PathBuf>,
}

fn default_token_env() -> String {
    "SCOPE_API_TOKEN".to_string()
}

fn default_secret_name() -> String {
    "scope-ws-api-key".to_string()
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            env_var: default_token_env(),
            secret_name: default_secret_name(),
            secret_dir: None,
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Total attempts per page, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Backoff ceiling in seconds
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,

    /// Client-side request rate limit
    #[serde(default)]
    pub requests_per_second: Option<u32>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_backoff_ms() -> u64 {
    1000
}

fn default_max_backoff_secs() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_secs: default_max_backoff_secs(),
            requests_per_second: None,
        }
    }
}

impl HttpConfig {
    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Initial backoff as a duration
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    /// Backoff ceiling as a duration
    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs)
    }
}

/// Record normalization settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Key suffix the target storage rejects
    #[serde(default = "default_marker_suffix")]
    pub marker_suffix: String,

    /// Stripped names that take an `is_` prefix
    #[serde(default = "default_boolean_vocabulary")]
    pub boolean_vocabulary: BTreeSet<String>,

    /// Fields whose object values are flattened into key/value pairs
    #[serde(default = "default_dynamic_map_fields")]
    pub dynamic_map_fields: BTreeSet<String>,

    /// Top-level keys checked, before normalization, for the archival flag
    #[serde(default = "default_archived_keys")]
    pub archived_keys: Vec<String>,
}

fn default_marker_suffix() -> String {
    "?".to_string()
}

fn default_boolean_vocabulary() -> BTreeSet<String> {
    [
        "archived",
        "published",
        "active",
        "enabled",
        "disabled",
        "show_resources",
        "published_for_web",
        "visible",
        "hidden",
        "required",
        "optional",
        "default",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_dynamic_map_fields() -> BTreeSet<String> {
    BTreeSet::from(["roles_users".to_string()])
}

fn default_archived_keys() -> Vec<String> {
    vec!["archived?".to_string(), "archived".to_string()]
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            marker_suffix: default_marker_suffix(),
            boolean_vocabulary: default_boolean_vocabulary(),
            dynamic_map_fields: default_dynamic_map_fields(),
            archived_keys: default_archived_keys(),
        }
    }
}

// ============================================================================
// Built-in Endpoint Table
// ============================================================================

fn builtin_endpoints() -> BTreeMap<String, EndpointSpec> {
    let table = [
        ("companies", EndpointSpec::new("companies/search").with_page_size(25)),
        ("task_statuses", EndpointSpec::new("task-statuses/search").with_page_size(100)),
        ("task_types", EndpointSpec::new("task-types/search").with_page_size(100)),
        ("users", EndpointSpec::new("users/search").with_page_size(50)),
        (
            "company_users",
            EndpointSpec::new("company-users/search")
                .with_page_size(50)
                .with_dependencies(["companies"]),
        ),
        (
            "lists",
            EndpointSpec::new("lists/search")
                .with_page_size(25)
                .with_dependencies(["users"]),
        ),
        (
            "tasks",
            EndpointSpec::new("tasks/search")
                .with_page_size(20)
                .with_dependencies(["lists", "task_statuses", "task_types", "companies"]),
        ),
        ("field_groups", EndpointSpec::new("field-groups/search").with_page_size(100)),
        (
            "fields",
            EndpointSpec::new("fields/search")
                .with_page_size(100)
                .with_dependencies(["field_groups"]),
        ),
        (
            "tags",
            EndpointSpec::new("tags/search")
                .with_page_size(50)
                .with_dependencies(["fields"]),
        ),
    ];

    table
        .into_iter()
        .map(|(name, spec)| (name.to_string(), spec))
        .collect()
}
