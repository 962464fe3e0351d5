//! Loader for service configuration with YAML + environment overlays.
//!
//! Precedence, lowest first: built-in defaults, YAML files/snippets in the
//! order they were added, `REELCAP_`-prefixed environment variables (nested
//! keys joined with `__`, e.g. `REELCAP_FETCH__TIMEOUT_SECS=5`), and finally
//! the plain `PORT` variable for the listen port. `${VAR}` placeholders inside
//! values are expanded after merging.
//!
//! ```yaml
//! server:
//!   port: 8080
//! fetch:
//!   timeout_secs: 5
//!   page_profile: mobile
//! profiles:
//!   mobile:
//!     user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)"
//!     accept_language: "en-US"
//! logging:
//!   format: json
//! ```
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use reelcap_common::HeaderProfile;
use reelcap_common::observability::{LogConfig, LogFormat};
use serde::Deserialize;
use serde_json::Value;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "REELCAP";
const PORT_ENV: &str = "PORT";
const SHORTCODE_PLACEHOLDER: &str = "{shortcode}";

pub const DESKTOP_CHROME: &str = "desktop-chrome";
pub const DESKTOP_BASIC: &str = "desktop-basic";
pub const INSTAGRAM_WEB: &str = "instagram-web";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReelcapConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Named header profiles; merged over [`builtin_profiles`] by the loader.
    #[serde(default)]
    pub profiles: BTreeMap<String, HeaderProfile>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Internal API endpoint; `{shortcode}` is substituted per request.
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,
    #[serde(default = "default_api_profile")]
    pub api_profile: String,
    #[serde(default = "default_page_profile")]
    pub page_profile: String,
    /// Page fetch target with a `{shortcode}` placeholder, e.g. the embed
    /// page. Unset means the caller's URL is fetched as given.
    #[serde(default)]
    pub page_endpoint: Option<String>,
    /// Scrape the post page when the API attempt fails.
    #[serde(default = "default_true")]
    pub fallback: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            api_endpoint: default_api_endpoint(),
            api_profile: default_api_profile(),
            page_profile: default_page_profile(),
            page_endpoint: None,
            fallback: true,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_true")]
    pub emit_stderr: bool,
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            emit_stderr: true,
            dir: None,
            filter: default_filter(),
        }
    }
}

impl LoggingConfig {
    pub fn to_log_config(&self, app_name: &'static str) -> LogConfig {
        LogConfig {
            app_name,
            log_dir: self.dir.clone(),
            emit_stderr: self.emit_stderr,
            format: self.format,
            default_filter: self.filter.clone(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    3000
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_api_endpoint() -> String {
    "https://www.instagram.com/p/{shortcode}/?__a=1&__d=dis".into()
}
fn default_api_profile() -> String {
    DESKTOP_CHROME.into()
}
fn default_page_profile() -> String {
    DESKTOP_BASIC.into()
}
fn default_filter() -> String {
    "info,tower_http=debug".into()
}
fn default_true() -> bool {
    true
}

/// Header profiles that ship with the service.
///
/// ```
/// let profiles = reelcap_config::builtin_profiles();
/// assert!(profiles.contains_key("desktop-chrome"));
/// assert!(profiles.contains_key("desktop-basic"));
/// ```
pub fn builtin_profiles() -> BTreeMap<String, HeaderProfile> {
    let mut chrome = HeaderProfile::new(
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    );
    chrome.accept =
        Some("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8".into());
    chrome.accept_language = Some("en-US,en;q=0.5".into());

    let basic = HeaderProfile::new("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36");

    let mut web = HeaderProfile::new(
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    );
    web.accept = Some("*/*".into());
    web.accept_language = Some("en-US,en;q=0.9".into());
    web.referer = Some("https://www.instagram.com/".into());
    web.headers.insert("x-ig-app-id".into(), "936619743392459".into());
    web.headers.insert("x-requested-with".into(), "XMLHttpRequest".into());

    BTreeMap::from([
        (DESKTOP_CHROME.to_string(), chrome),
        (DESKTOP_BASIC.to_string(), basic),
        (INSTAGRAM_WEB.to_string(), web),
    ])
}

impl ReelcapConfig {
    /// Look up a header profile by name.
    pub fn profile(&self, name: &str) -> Option<&HeaderProfile> {
        self.profiles.get(name)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for name in [&self.fetch.api_profile, &self.fetch.page_profile] {
            if self.profile(name).is_none() {
                return Err(ConfigError::Message(format!(
                    "unknown header profile `{name}`"
                )));
            }
        }
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Message(
                "fetch.timeout_secs must be greater than zero".into(),
            ));
        }
        if !self.fetch.api_endpoint.contains(SHORTCODE_PLACEHOLDER) {
            return Err(ConfigError::Message(format!(
                "fetch.api_endpoint must contain {SHORTCODE_PLACEHOLDER}"
            )));
        }
        let page = self.fetch.page_endpoint.as_deref();
        if page.is_some_and(|p| !p.contains(SHORTCODE_PLACEHOLDER)) {
            return Err(ConfigError::Message(format!(
                "fetch.page_endpoint must contain {SHORTCODE_PLACEHOLDER}"
            )));
        }
        Ok(())
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => break,
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

fn port_from_env() -> Result<Option<u16>, ConfigError> {
    match std::env::var(PORT_ENV) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<u16>()
            .map(Some)
            .map_err(|e| ConfigError::Message(format!("invalid {PORT_ENV} `{raw}`: {e}"))),
        _ => Ok(None),
    }
}

/// Builder hiding the `config` crate wiring (YAML + env overrides).
pub struct ReelcapConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for ReelcapConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ReelcapConfigLoader {
    /// Start with defaults only; environment overrides are applied at [`load`](Self::load).
    ///
    /// ```
    /// use reelcap_config::ReelcapConfigLoader;
    ///
    /// let config = ReelcapConfigLoader::new()
    ///     .with_yaml_str("fetch:\n  timeout_secs: 3")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.fetch.timeout_secs, 3);
    /// assert!(config.fetch.fallback);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a required YAML/TOML/JSON file; the format is inferred from the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent, for deployments driven purely by env.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use reelcap_config::ReelcapConfigLoader;
    ///
    /// let cfg = ReelcapConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// fetch:
    ///   page_profile: phone
    /// profiles:
    ///   phone:
    ///     user_agent: "Mozilla/5.0 (iPhone)"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.profile("phone").unwrap().user_agent, "Mozilla/5.0 (iPhone)");
    /// assert!(cfg.profile("desktop-chrome").is_some());
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    ///
    /// Environment overlays are added last so they win over files, then
    /// `${VAR}` placeholders are expanded, built-in profiles are merged under
    /// the configured ones, and the result is validated.
    pub fn load(self) -> Result<ReelcapConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.port", port_from_env()?.map(i64::from))?
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let mut typed: ReelcapConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        let mut profiles = builtin_profiles();
        profiles.append(&mut typed.profiles);
        typed.profiles = profiles;

        typed.validate()?;
        Ok(typed)
    }
}
