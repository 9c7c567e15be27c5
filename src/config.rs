use std::path::PathBuf;

pub const DEFAULT_SHARPSPRING_API_URL: &str = "https://api.sharpspring.com/pubapi/v1";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub sharpspring_api_url: String,
    pub sharpspring_timeout_secs: u64,
    pub settings_path: Option<PathBuf>,
    pub seed_account_id: Option<String>,
    pub seed_secret_key: Option<String>,
    pub admin_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            sharpspring_api_url: DEFAULT_SHARPSPRING_API_URL.to_string(),
            sharpspring_timeout_secs: 30,
            settings_path: None,
            seed_account_id: None,
            seed_secret_key: None,
            admin_token: None,
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            sharpspring_api_url: std::env::var("SHARPSPRING_API_URL")
                .unwrap_or_else(|_| DEFAULT_SHARPSPRING_API_URL.to_string())
                .trim()
                .trim_end_matches('/')
                .to_string(),
            sharpspring_timeout_secs: std::env::var("SHARPSPRING_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SHARPSPRING_TIMEOUT_SECS must be a whole number"))
                .and_then(|secs: u64| {
                    if secs == 0 {
                        anyhow::bail!("SHARPSPRING_TIMEOUT_SECS must be greater than zero");
                    }
                    Ok(secs)
                })?,
            settings_path: optional_var("SETTINGS_PATH").map(PathBuf::from),
            seed_account_id: optional_var("SHARPSPRING_ACCOUNT_ID"),
            seed_secret_key: optional_var("SHARPSPRING_SECRET_KEY"),
            admin_token: optional_var("ADMIN_TOKEN"),
        };

        config.validate()?;

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("SharpSpring API URL: {}", config.sharpspring_api_url);
        tracing::debug!("Server Port: {}", config.port);
        match config.settings_path {
            Some(ref path) => tracing::info!("Settings file: {}", path.display()),
            None => tracing::warn!("SETTINGS_PATH not set, credentials are kept in memory only"),
        }
        if config.admin_token.is_none() {
            tracing::warn!("ADMIN_TOKEN not set, the settings page is disabled");
        }

        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = &self.sharpspring_api_url;
        if url.is_empty() {
            anyhow::bail!("SHARPSPRING_API_URL cannot be empty");
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            anyhow::bail!("SHARPSPRING_API_URL must start with http:// or https://");
        }
        url::Url::parse(url)
            .map_err(|e| anyhow::anyhow!("SHARPSPRING_API_URL is not a valid URL: {}", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_points_at_sharpspring() {
        let config = Config::default();
        assert_eq!(config.sharpspring_api_url, DEFAULT_SHARPSPRING_API_URL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_http_url() {
        let config = Config {
            sharpspring_api_url: "ftp://api.sharpspring.com".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_url() {
        let config = Config {
            sharpspring_api_url: String::new(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
