use std::{fmt, fs, path::PathBuf, time::Duration};

/* Config is loaded once at startup and handed to the components that need it.
 * Nothing reads the environment after that.
 */

const TOKEN_ENV: &str = "TELOXIDE_TOKEN";
const TOKEN_FILE_ENV: &str = "TOKEN_FILE";
const API_URL_ENV: &str = "STATS_API_URL";
const TIMEOUT_ENV: &str = "STATS_API_TIMEOUT_SECS";

const TOKEN_FILE_DEFAULT: &str = "token";
pub const API_URL_DEFAULT: &str = "http://moneroblocks.info/api/";
pub const TIMEOUT_SECS_DEFAULT: u64 = 10;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("No bot token found: set TELOXIDE_TOKEN or provide a token file")]
    MissingToken,
    #[error("Unable to read token file {path}: {source}")]
    TokenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid STATS_API_TIMEOUT_SECS value: {0}")]
    InvalidTimeout(String),
}

#[derive(Clone)]
pub struct BotConfig {
    pub token: String,
    pub api_base_url: String,
    pub request_timeout: Duration,
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

// The default token file sits next to the executable.
fn default_token_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(TOKEN_FILE_DEFAULT)))
        .unwrap_or_else(|| PathBuf::from(TOKEN_FILE_DEFAULT))
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl BotConfig {
    pub fn from_env() -> Result<BotConfig, ConfigError> {
        BotConfig::from_lookup(|key| std::env::var(key).ok())
    }

    /* Builds the config from a key lookup.
     * Token precedence: TELOXIDE_TOKEN, then the file named by TOKEN_FILE,
     * then `token` next to the executable.
     */
    pub fn from_lookup<F>(lookup: F) -> Result<BotConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = match lookup(TOKEN_ENV).as_deref().and_then(non_empty) {
            Some(token) => token,
            None => {
                let path = lookup(TOKEN_FILE_ENV)
                    .map(PathBuf::from)
                    .unwrap_or_else(default_token_path);
                let contents = fs::read_to_string(&path)
                    .map_err(|source| ConfigError::TokenFile { path, source })?;
                non_empty(&contents).ok_or(ConfigError::MissingToken)?
            }
        };

        let api_base_url = lookup(API_URL_ENV)
            .as_deref()
            .and_then(non_empty)
            .unwrap_or_else(|| API_URL_DEFAULT.to_string());

        let timeout_secs = match lookup(TIMEOUT_ENV) {
            Some(value) => {
                let parsed = value.trim().parse::<u64>();
                match parsed {
                    Ok(secs) if secs > 0 => secs,
                    _ => return Err(ConfigError::InvalidTimeout(value)),
                }
            }
            None => TIMEOUT_SECS_DEFAULT,
        };

        Ok(BotConfig {
            token,
            api_base_url,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
