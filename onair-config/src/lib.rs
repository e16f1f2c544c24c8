//! Loader for onair configuration with YAML + environment overlays.
//!
//! Sources are merged in this order, later ones winning:
//!
//! 1. the embedded defaults ([`DEFAULT_YAML`]),
//! 2. any YAML file or inline snippet attached to the loader,
//! 3. `ONAIR__`-prefixed environment variables (`ONAIR__RUN__ONLY_TODAY=true`).
//!
//! Every string value then goes through `${VAR}` / `${VAR:-default}`
//! expansion, so the defaults can point at the plain variables a `.env`
//! file provides (`TODOIST_API_TOKEN`, `TODOIST_TIGERS_PROJECT_ID`, ...).
use chrono::FixedOffset;
use config::{Config, Environment, File, FileFormat};
use onair_common::Division;
use onair_common::observability::LogFormat;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub use config::ConfigError;

mod de;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "ONAIR";

/// Built-in defaults, overridable by files and the environment.
pub const DEFAULT_YAML: &str = r#"
todoist:
  api_token: "${TODOIST_API_TOKEN:-}"
  project_id: "${TODOIST_TIGERS_PROJECT_ID:-}"
  base_url: "https://api.todoist.com/rest/v2/"
schedule:
  sources:
    - url: "https://hanshintigers.jp/news/media/live.html"
  detail_url_prefix: "https:"
  pacing_ms: 1000
  utc_offset: "+09:00"
  http_timeout_secs: 30
filters:
  include_team_channel: "${INCLUDE_TORA_TELE:-false}"
  include_region_locked: "${INCLUDE_DAZN:-false}"
run:
  enabled: "${ENABLE_RUN:-false}"
  only_today: "${ONLY_TODAY:-false}"
  reconcile: true
  placeholder: true
log:
  format: text
  stderr: true
"#;

#[derive(Debug, Clone, Deserialize)]
pub struct OnairConfig {
    pub todoist: TodoistConfig,
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TodoistConfig {
    #[serde(default)]
    pub api_token: String,
    #[serde(default, deserialize_with = "de::string")]
    pub project_id: String,
    #[serde(default = "default_todoist_base")]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    pub sources: Vec<SourceConfig>,
    #[serde(default = "default_detail_prefix")]
    pub detail_url_prefix: String,
    #[serde(default = "default_pacing_ms", deserialize_with = "de::number")]
    pub pacing_ms: u64,
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
    #[serde(default = "default_http_timeout", deserialize_with = "de::number")]
    pub http_timeout_secs: u64,
}

/// One schedule page to scrape. Sources are processed in list order.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SourceConfig {
    pub url: String,
    #[serde(default)]
    pub division: Option<Division>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterConfig {
    /// Re-enable the team-branded subscription channel.
    #[serde(default, deserialize_with = "de::flag")]
    pub include_team_channel: bool,
    /// Re-enable the region-locked streaming service.
    #[serde(default, deserialize_with = "de::flag")]
    pub include_region_locked: bool,
    #[serde(default)]
    pub excluded_broadcasters: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Kill switch; nothing happens unless this is set.
    #[serde(default, deserialize_with = "de::flag")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "de::flag")]
    pub only_today: bool,
    #[serde(default = "default_true", deserialize_with = "de::flag")]
    pub reconcile: bool,
    #[serde(default = "default_true", deserialize_with = "de::flag")]
    pub placeholder: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            only_today: false,
            reconcile: true,
            placeholder: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_true", deserialize_with = "de::flag")]
    pub stderr: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            dir: None,
            format: LogFormat::Text,
            stderr: true,
        }
    }
}

fn default_todoist_base() -> String {
    "https://api.todoist.com/rest/v2/".into()
}
fn default_detail_prefix() -> String {
    "https:".into()
}
fn default_pacing_ms() -> u64 {
    1000
}
fn default_utc_offset() -> String {
    "+09:00".into()
}
fn default_http_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

impl ScheduleConfig {
    /// Parse `utc_offset` (`+09:00`, `-0530`, `Z`) into a chrono offset.
    pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
        parse_utc_offset(&self.utc_offset).ok_or_else(|| {
            ConfigError::Message(format!(
                "schedule.utc_offset is not a valid offset: {:?}",
                self.utc_offset
            ))
        })
    }
}

impl OnairConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.schedule.sources.is_empty() {
            return Err(ConfigError::Message(
                "schedule.sources must list at least one page".into(),
            ));
        }
        for source in &self.schedule.sources {
            if source.url.trim().is_empty() {
                return Err(ConfigError::Message("schedule.sources[].url is empty".into()));
            }
        }
        self.schedule.offset()?;

        // Credentials only matter once the kill switch is flipped.
        if self.run.enabled {
            require("todoist.api_token", &self.todoist.api_token)?;
            require("todoist.project_id", &self.todoist.project_id)?;
        }
        Ok(())
    }
}

fn require(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() || value.contains("${") {
        return Err(ConfigError::Message(format!("{key} is required")));
    }
    Ok(())
}

fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
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

/// Builder hiding the `config` crate wiring.
pub struct OnairConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for OnairConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl OnairConfigLoader {
    /// Start from the embedded defaults.
    ///
    /// ```
    /// use onair_config::OnairConfigLoader;
    ///
    /// let config = OnairConfigLoader::new().load().expect("defaults are valid");
    /// assert_eq!(config.schedule.sources.len(), 1);
    /// assert_eq!(config.schedule.pacing_ms, 1000);
    /// assert!(config.run.reconcile);
    /// ```
    pub fn new() -> Self {
        let builder =
            Config::builder().add_source(File::from_str(DEFAULT_YAML, FileFormat::Yaml));
        Self { builder }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent (headless deployments run on env alone).
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use onair_config::OnairConfigLoader;
    ///
    /// let cfg = OnairConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// schedule:
    ///   sources:
    ///     - url: "https://example.com/live.html"
    ///       division: primary
    ///     - url: "https://example.com/farm.html"
    ///       division: farm
    /// filters:
    ///   include_team_channel: true
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.schedule.sources.len(), 2);
    /// assert!(cfg.filters.include_team_channel);
    /// assert!(!cfg.filters.include_region_locked);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self.builder.add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    /// Consume the builder, apply the `ONAIR__` environment overlay, expand
    /// `${VAR}` placeholders and validate.
    pub fn load(self) -> Result<OnairConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: OnairConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.validate()?;
        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_defaults_when_unset() {
        temp_env::with_var_unset("ONAIR_TEST_UNSET_FLAG", || {
            let mut v = json!({ "flag": "${ONAIR_TEST_UNSET_FLAG:-false}" });
            expand_env_in_value(&mut v);
            assert_eq!(v, json!({ "flag": "false" }));
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("ONAIR_T_BAZ", Some("qux")),
                ("ONAIR_T_BAR", Some("mid-${ONAIR_T_BAZ}")),
            ],
            || {
                let mut v = json!(["x=${ONAIR_T_BAR}", 42, true]);
                expand_env_in_value(&mut v);
                assert_eq!(v, json!(["x=mid-qux", 42, true]));
            },
        );
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${ONAIR_DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${ONAIR_DOES_NOT_EXIST}"));
    }

    #[test]
    fn parses_offsets() {
        assert_eq!(parse_utc_offset("+09:00"), FixedOffset::east_opt(9 * 3600));
        assert_eq!(parse_utc_offset("-0530"), FixedOffset::east_opt(-(5 * 3600 + 1800)));
        assert_eq!(parse_utc_offset("Z"), FixedOffset::east_opt(0));
        assert_eq!(parse_utc_offset("09:00"), None);
        assert_eq!(parse_utc_offset("+25:00"), None);
    }

    #[test]
    fn unexpanded_placeholder_counts_as_missing() {
        assert!(require("todoist.api_token", "${TODOIST_API_TOKEN}").is_err());
        assert!(require("todoist.api_token", "  ").is_err());
        assert!(require("todoist.api_token", "abc123").is_ok());
    }
}
