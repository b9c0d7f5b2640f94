use aws_sdk_s3::config::{BehaviorVersion, Builder, Credentials, Region};
use aws_sdk_s3::Client;
use tracing::{error, info, instrument};
use url::Url;

use super::errors::S3Error;

pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Clone)]
pub struct S3Config {
    pub endpoint_url: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub force_path_style: bool,
}

impl S3Config {
    pub fn new(
        endpoint_url: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: DEFAULT_REGION.to_string(),
            force_path_style: true,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_force_path_style(mut self, force_path_style: bool) -> Self {
        self.force_path_style = force_path_style;
        self
    }
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("endpoint_url", &self.endpoint_url)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

/// Build an S3 client for the configured endpoint.
/// Nothing is sent over the network until the client is first used.
#[instrument(skip_all, fields(endpoint = %config.endpoint_url, region = %config.region))]
pub fn connect_s3(config: &S3Config) -> Result<Client, S3Error> {
    info!("initializing S3 client");

    if let Err(reason) = validate_endpoint(&config.endpoint_url) {
        let err = S3Error::InvalidEndpoint {
            endpoint: config.endpoint_url.clone(),
            reason,
        };
        error!(error = %err, "failed to connect to S3");
        return Err(err);
    }

    let credentials = Credentials::new(
        config.access_key.clone(),
        config.secret_key.clone(),
        None,
        None,
        "delta-table-utils",
    );
    let sdk_config = Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .endpoint_url(config.endpoint_url.clone())
        .credentials_provider(credentials)
        .force_path_style(config.force_path_style)
        .build();

    info!("S3 client ready");
    Ok(Client::from_conf(sdk_config))
}

fn validate_endpoint(endpoint: &str) -> Result<(), String> {
    let url = Url::parse(endpoint).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported scheme '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_client_without_network() {
        let config = S3Config::new("http://localhost:9000", "minio", "minio123");
        let client = connect_s3(&config).unwrap();

        let conf = client.config();
        assert_eq!(conf.region().map(|r| r.as_ref()), Some("us-east-1"));
    }

    #[test]
    fn rejects_malformed_endpoints() {
        for endpoint in ["minio-host", "localhost:9000", "ftp://minio:21"] {
            let config = S3Config::new(endpoint, "minio", "minio123").with_region("eu-west-1");
            let err = connect_s3(&config).unwrap_err();
            assert!(matches!(err, S3Error::InvalidEndpoint { .. }), "{endpoint}");
        }
    }

    #[test]
    fn debug_output_hides_secret() {
        let config = S3Config::new("http://localhost:9000", "minio", "minio123");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("minio123"));
    }
}
