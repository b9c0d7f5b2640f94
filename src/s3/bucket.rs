use aws_sdk_s3::Client;
use tracing::{error, info, instrument};

use super::errors::S3Error;

/// Create `bucket` unless a bucket with that name is already listed.
///
/// Listing and creating are separate requests, so two callers racing on the
/// same name can both attempt the create; the service decides the outcome.
#[instrument(skip(client))]
pub async fn ensure_bucket_exists(client: &Client, bucket: &str) -> Result<(), S3Error> {
    let result = ensure_inner(client, bucket).await;
    if let Err(e) = &result {
        error!(error = %e, "failed to check/create bucket");
    }
    result
}

async fn ensure_inner(client: &Client, bucket: &str) -> Result<(), S3Error> {
    if bucket.trim().is_empty() {
        return Err(S3Error::InvalidArgument(
            "bucket name must not be empty".to_string(),
        ));
    }

    let listed = client
        .list_buckets()
        .send()
        .await
        .map_err(aws_sdk_s3::Error::from)?;
    let exists = listed.buckets().iter().any(|b| b.name() == Some(bucket));

    if exists {
        info!("bucket already exists");
        return Ok(());
    }

    client
        .create_bucket()
        .bucket(bucket)
        .send()
        .await
        .map_err(aws_sdk_s3::Error::from)?;
    info!("bucket created");
    Ok(())
}
