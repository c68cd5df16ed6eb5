use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub base_url: Option<String>,
    pub csrf_token: Option<String>,
    pub session_id: Option<String>,
    pub timeout: Duration,
    /// Pins "today" for the exam window check.
    pub today: Option<NaiveDate>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            csrf_token: None,
            session_id: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            today: None,
        }
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let timeout = match non_empty(get("BULLETIND_TIMEOUT_SECS")) {
            Some(v) => Duration::from_secs(
                v.parse::<u64>()
                    .with_context(|| format!("BULLETIND_TIMEOUT_SECS is not a number: {v}"))?,
            ),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };
        let today = match non_empty(get("BULLETIND_TODAY")) {
            Some(v) => Some(
                NaiveDate::parse_from_str(&v, "%Y-%m-%d")
                    .with_context(|| format!("BULLETIND_TODAY must be YYYY-MM-DD, got {v}"))?,
            ),
            None => None,
        };

        Ok(Self {
            base_url: non_empty(get("BULLETIND_BASE_URL")),
            csrf_token: non_empty(get("BULLETIND_CSRF_TOKEN")),
            session_id: non_empty(get("BULLETIND_SESSION_ID")),
            timeout,
            today,
        })
    }

    /// Applies `session.configure` params; absent keys keep current values.
    pub fn apply_params(&mut self, params: &serde_json::Value) {
        let get = |key: &str| non_empty(params.get(key).and_then(|v| v.as_str()).map(str::to_string));
        if let Some(v) = get("baseUrl") {
            self.base_url = Some(v);
        }
        if let Some(v) = get("csrfToken") {
            self.csrf_token = Some(v);
        }
        if let Some(v) = get("sessionId") {
            self.session_id = Some(v);
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}
