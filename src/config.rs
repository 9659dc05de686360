use std::collections::HashMap;
use std::fs;

use chrono_tz::Tz;

use crate::clients::{calendar_client, openai_client};
use crate::error::ConfigError;

pub const DEFAULT_MODEL: &str = "gpt-4-1106-preview";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_CALENDAR_ID: &str = "primary";
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Seoul;

/// Values read from a `KEY=VALUE` file.
#[derive(Debug, Default, Clone)]
pub struct AppConfig {
    values: HashMap<String, String>,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(ConfigError::InvalidLine {
                    line: idx + 1,
                    content: line.to_string(),
                });
            };
            let key = key.trim();
            let mut value = value.trim().to_string();
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = value[1..value.len() - 1].to_string();
            }
            values.insert(key.to_string(), value);
        }
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Per-session settings, fixed once the orchestrator is built.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub model: String,
    pub max_tokens: Option<u32>,
    pub json_output: bool,
    pub calendar_id: String,
    pub timezone: Tz,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: Some(DEFAULT_MAX_TOKENS),
            json_output: false,
            calendar_id: DEFAULT_CALENDAR_ID.to_string(),
            timezone: DEFAULT_TIMEZONE,
        }
    }
}

/// Everything needed to build the service clients and the session.
#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub calendar_token: String,
    pub calendar_base_url: String,
    pub session: SessionConfig,
}

impl Settings {
    /// Resolves settings from a key lookup, typically the config file with
    /// the process environment as fallback.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let openai_api_key = get("OPENAI_API_KEY").ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;
        let calendar_token =
            get("GOOGLE_CALENDAR_TOKEN").ok_or(ConfigError::Missing("GOOGLE_CALENDAR_TOKEN"))?;

        let mut session = SessionConfig::default();
        if let Some(model) = get("OPENAI_MODEL") {
            session.model = model;
        }
        if let Some(raw) = get("OPENAI_MAX_TOKENS") {
            session.max_tokens = parse_max_tokens(&raw)?;
        }
        if let Some(raw) = get("OPENAI_JSON_OUTPUT") {
            session.json_output = parse_bool("OPENAI_JSON_OUTPUT", &raw)?;
        }
        if let Some(calendar_id) = get("CALENDAR_ID") {
            session.calendar_id = calendar_id;
        }
        if let Some(raw) = get("CALENDAR_TIMEZONE") {
            session.timezone = parse_timezone(&raw)?;
        }

        Ok(Self {
            openai_api_key,
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| openai_client::DEFAULT_BASE_URL.to_string()),
            calendar_token,
            calendar_base_url: get("GOOGLE_CALENDAR_BASE_URL")
                .unwrap_or_else(|| calendar_client::DEFAULT_BASE_URL.to_string()),
            session,
        })
    }
}

/// `0` disables the cap.
pub fn parse_max_tokens(raw: &str) -> Result<Option<u32>, ConfigError> {
    match raw.trim().parse::<u32>() {
        Ok(0) => Ok(None),
        Ok(n) => Ok(Some(n)),
        Err(_) => Err(ConfigError::InvalidValue {
            key: "OPENAI_MAX_TOKENS",
            value: raw.to_string(),
        }),
    }
}

pub fn parse_timezone(raw: &str) -> Result<Tz, ConfigError> {
    raw.trim().parse::<Tz>().map_err(|_| ConfigError::InvalidValue {
        key: "CALENDAR_TIMEZONE",
        value: raw.to_string(),
    })
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn parses_file_with_comments_exports_and_quotes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "# credentials\nexport OPENAI_API_KEY=\"sk-abc\"\nCALENDAR_ID='team'\n\nOPENAI_MODEL = gpt-4o"
        )
        .unwrap();

        let config = AppConfig::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.get("OPENAI_API_KEY").as_deref(), Some("sk-abc"));
        assert_eq!(config.get("CALENDAR_ID").as_deref(), Some("team"));
        assert_eq!(config.get("OPENAI_MODEL").as_deref(), Some("gpt-4o"));
        assert_eq!(config.get("MISSING"), None);
    }

    #[test]
    fn rejects_lines_without_equals() {
        let err = AppConfig::parse("OPENAI_API_KEY=sk\nnot a pair").unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidLine {
                line: 2,
                content: "not a pair".to_string()
            }
        );
    }

    #[test]
    fn missing_file_is_a_read_error() {
        assert!(matches!(
            AppConfig::from_file("/definitely/not/here.env"),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn settings_use_defaults() {
        let settings = Settings::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk"),
            ("GOOGLE_CALENDAR_TOKEN", "ya29"),
        ]))
        .unwrap();
        assert_eq!(settings.session, SessionConfig::default());
        assert_eq!(settings.openai_base_url, openai_client::DEFAULT_BASE_URL);
        assert_eq!(settings.calendar_base_url, calendar_client::DEFAULT_BASE_URL);
    }

    #[test]
    fn settings_read_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk"),
            ("GOOGLE_CALENDAR_TOKEN", "ya29"),
            ("OPENAI_MAX_TOKENS", "0"),
            ("OPENAI_JSON_OUTPUT", "yes"),
            ("CALENDAR_TIMEZONE", "America/Los_Angeles"),
        ]))
        .unwrap();
        assert_eq!(settings.session.max_tokens, None);
        assert!(settings.session.json_output);
        assert_eq!(settings.session.timezone, chrono_tz::America::Los_Angeles);
    }

    #[test]
    fn settings_require_credentials() {
        let err = Settings::from_lookup(lookup(&[("OPENAI_API_KEY", "sk")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("GOOGLE_CALENDAR_TOKEN"));
    }

    #[test]
    fn settings_reject_unknown_timezone() {
        let err = Settings::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk"),
            ("GOOGLE_CALENDAR_TOKEN", "ya29"),
            ("CALENDAR_TIMEZONE", "Korean Standard Time"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "CALENDAR_TIMEZONE", .. }));
    }
}
