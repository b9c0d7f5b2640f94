use thiserror::Error;

use crate::s3::S3Config;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
}

pub fn load_s3_config() -> Result<S3Config, ConfigError> {
    s3_config_from(|key| std::env::var(key).ok())
}

pub fn s3_config_from(lookup: impl Fn(&str) -> Option<String>) -> Result<S3Config, ConfigError> {
    let value = |key: &str| {
        lookup(key).and_then(|value| {
            let trimmed = value.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        })
    };

    let endpoint_url = value("S3_ENDPOINT_URL")
        .or_else(|| value("AWS_ENDPOINT_URL"))
        .ok_or(ConfigError::Missing("S3_ENDPOINT_URL or AWS_ENDPOINT_URL"))?;
    let access_key = value("AWS_ACCESS_KEY_ID").ok_or(ConfigError::Missing("AWS_ACCESS_KEY_ID"))?;
    let secret_key =
        value("AWS_SECRET_ACCESS_KEY").ok_or(ConfigError::Missing("AWS_SECRET_ACCESS_KEY"))?;

    let mut config = S3Config::new(endpoint_url, access_key, secret_key);
    if let Some(region) = value("AWS_REGION") {
        config = config.with_region(region);
    }
    Ok(config)
}
