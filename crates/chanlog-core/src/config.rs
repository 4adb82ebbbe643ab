use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{domain::ChatId, errors::Error, messaging::throttled::ThrottleConfig, Result};

/// Typed configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    pub telegram_allowed_users: Vec<i64>,
    pub log_channel_id: ChatId,

    // Welcome messages
    pub welcome_chats: Vec<i64>,
    pub welcome_file: PathBuf,
    pub welcome_delete_timeout: Duration,

    // Command replies
    pub msg_delete_timeout: Duration,

    // Telegram limits
    pub telegram_message_limit: usize,
    pub throttle: ThrottleConfig,

    // Rate limiting
    pub rate_limit_enabled: bool,
    pub rate_limit_requests: u32,
    pub rate_limit_window: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (env, map in tests).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env_u64 = |key: &str| get(key).and_then(|s| s.trim().parse::<u64>().ok());
        let env_bool = |key: &str| {
            get(key).map(|s| matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        };

        // Required env vars
        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        let telegram_allowed_users = parse_csv_i64(get("TELEGRAM_ALLOWED_USERS"));

        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }
        if telegram_allowed_users.is_empty() {
            return Err(Error::Config(
                "TELEGRAM_ALLOWED_USERS environment variable is required".to_string(),
            ));
        }
        let log_channel_id = parse_log_channel(get("LOG_CHANNEL_ID"))?;

        let welcome_chats = parse_csv_i64(get("WELCOME_CHATS"));
        let welcome_file = PathBuf::from(
            get("WELCOME_FILE").unwrap_or("/tmp/chanlog-welcome.json".to_string()),
        );
        let welcome_delete_timeout =
            Duration::from_secs(env_u64("WELCOME_DELETE_TIMEOUT").unwrap_or(0));
        let msg_delete_timeout = Duration::from_secs(env_u64("MSG_DELETE_TIMEOUT").unwrap_or(120));

        let telegram_message_limit = env_u64("TELEGRAM_MESSAGE_LIMIT")
            .map(|v| v as usize)
            .unwrap_or(4096);
        let defaults = ThrottleConfig::default();
        let throttle = ThrottleConfig {
            global_min_interval: env_u64("THROTTLE_GLOBAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.global_min_interval),
            per_chat_min_interval: env_u64("THROTTLE_PER_CHAT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.per_chat_min_interval),
        };

        let rate_limit_enabled = env_bool("RATE_LIMIT_ENABLED").unwrap_or(true);
        let rate_limit_requests = env_u64("RATE_LIMIT_REQUESTS")
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(20);
        let rate_limit_window = Duration::from_secs(env_u64("RATE_LIMIT_WINDOW").unwrap_or(60));

        Ok(Self {
            telegram_bot_token,
            telegram_allowed_users,
            log_channel_id,
            welcome_chats,
            welcome_file,
            welcome_delete_timeout,
            msg_delete_timeout,
            telegram_message_limit,
            throttle,
            rate_limit_enabled,
            rate_limit_requests,
            rate_limit_window,
        })
    }

    pub fn is_welcome_chat(&self, chat_id: ChatId) -> bool {
        self.welcome_chats.contains(&chat_id.0)
    }
}

fn parse_log_channel(raw: Option<String>) -> Result<ChatId> {
    let Some(raw) = raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) else {
        return Err(Error::Config(
            "LOG_CHANNEL_ID environment variable is required".to_string(),
        ));
    };
    match raw.parse::<i64>() {
        Ok(0) | Err(_) => Err(Error::Config(format!(
            "LOG_CHANNEL_ID must be a non-zero chat id, got {raw:?}"
        ))),
        Ok(id) => Ok(ChatId(id)),
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("TELEGRAM_BOT_TOKEN", "123:abc"),
        ("TELEGRAM_ALLOWED_USERS", "1, 2,x"),
        ("LOG_CHANNEL_ID", "-1001234567890"),
    ];

    #[test]
    fn loads_required_values_and_defaults() {
        let cfg = Config::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(cfg.telegram_allowed_users, vec![1, 2]);
        assert_eq!(cfg.log_channel_id, ChatId(-1001234567890));
        assert!(cfg.welcome_chats.is_empty());
        assert_eq!(cfg.msg_delete_timeout, Duration::from_secs(120));
        assert_eq!(cfg.welcome_delete_timeout, Duration::ZERO);
        assert_eq!(cfg.telegram_message_limit, 4096);
        assert!(cfg.rate_limit_enabled);
    }

    #[test]
    fn overrides_optional_values() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("WELCOME_CHATS", "-100111,-100222"),
            ("WELCOME_DELETE_TIMEOUT", "30"),
            ("THROTTLE_PER_CHAT_MS", "0"),
            ("RATE_LIMIT_ENABLED", "off"),
        ]);
        let cfg = Config::from_lookup(lookup(&pairs)).unwrap();
        assert!(cfg.is_welcome_chat(ChatId(-100222)));
        assert_eq!(cfg.welcome_delete_timeout, Duration::from_secs(30));
        assert_eq!(cfg.throttle.per_chat_min_interval, Duration::ZERO);
        assert!(!cfg.rate_limit_enabled);
    }

    #[test]
    fn rejects_missing_or_zero_log_channel() {
        let pairs = &REQUIRED[..2];
        assert!(matches!(
            Config::from_lookup(lookup(pairs)),
            Err(Error::Config(_))
        ));

        let mut pairs = REQUIRED.to_vec();
        pairs[2] = ("LOG_CHANNEL_ID", "0");
        assert!(Config::from_lookup(lookup(&pairs)).is_err());
        pairs[2] = ("LOG_CHANNEL_ID", "channel");
        assert!(Config::from_lookup(lookup(&pairs)).is_err());
    }
}
