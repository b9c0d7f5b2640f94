use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Once;

use deltalake::operations::DeltaOps;
use deltalake::{ensure_table_uri, DeltaTable, DeltaTableError};
use tracing::{error, info, instrument, warn};
use url::Url;

use super::errors::{DeltaUtilsError, Result};

/// Options forwarded verbatim to the object store behind a table.
pub type StorageOptions = HashMap<String, String>;

static REGISTER_HANDLERS: Once = Once::new();

fn register_object_store_handlers() {
    REGISTER_HANDLERS.call_once(|| deltalake::aws::register_handlers(None));
}

fn non_blank(location: &str) -> Result<&str> {
    let trimmed = location.trim();
    if trimmed.is_empty() {
        return Err(DeltaUtilsError::invalid("table location must not be empty"));
    }
    Ok(trimmed)
}

/// Returns the filesystem path for plain paths and `file://` URLs.
fn local_path(location: &str) -> Option<PathBuf> {
    match Url::parse(location) {
        Ok(url) if url.scheme() == "file" => url.to_file_path().ok(),
        Ok(_) => None,
        Err(_) => Some(PathBuf::from(location)),
    }
}

fn missing_locally(location: &str) -> bool {
    local_path(location).is_some_and(|path| !path.exists())
}

/// Normalise a location into a table URL. Local directories are created when
/// missing, which is what a write needs.
pub fn table_url(location: &str) -> Result<Url> {
    let location = non_blank(location)?;
    register_object_store_handlers();
    Ok(ensure_table_uri(location)?)
}

/// Open the latest version of an existing table.
pub async fn open_table(location: &str, storage_options: StorageOptions) -> Result<DeltaTable> {
    let location = non_blank(location)?;
    if missing_locally(location) {
        return Err(DeltaTableError::NotATable(location.to_string()).into());
    }
    let url = table_url(location)?;
    Ok(deltalake::open_table_with_storage_options(url, storage_options).await?)
}

/// Handle on a location that may or may not hold a table yet.
pub(crate) async fn table_ops(location: &str, storage_options: StorageOptions) -> Result<DeltaOps> {
    let url = table_url(location)?;
    Ok(DeltaOps::try_from_uri_with_storage_options(url, storage_options).await?)
}

/// Whether `location` holds a Delta table.
///
/// A readable location without a Delta log, or a local path that does not
/// exist, answers `false`. A blank location is rejected with
/// [`DeltaUtilsError::InvalidArgument`] rather than answered `false`, and
/// failures reaching the location (permissions, network) are returned as errors.
#[instrument(skip_all, fields(table_uri = %location))]
pub async fn check_if_delta_table(location: &str, storage_options: StorageOptions) -> Result<bool> {
    info!("checking for a Delta table");

    let result = exists_inner(location, storage_options).await;

    match &result {
        Ok(true) => info!("location contains a valid Delta table"),
        Ok(false) => warn!("location does not contain a Delta table or does not exist"),
        Err(e) => error!(error = %e, "failed to check whether location is a Delta table"),
    }
    result
}

async fn exists_inner(location: &str, storage_options: StorageOptions) -> Result<bool> {
    let location = non_blank(location)?;
    if missing_locally(location) {
        return Ok(false);
    }
    let DeltaOps(table) = table_ops(location, storage_options).await?;
    Ok(table.verify_deltatable_existence().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_paths_and_file_urls_are_local() {
        assert_eq!(local_path("/tmp/table"), Some(PathBuf::from("/tmp/table")));
        assert_eq!(local_path("file:///tmp/table"), Some(PathBuf::from("/tmp/table")));
        assert_eq!(local_path("s3://bucket/table"), None);
    }

    #[test]
    fn blank_location_is_rejected() {
        let err = table_url("   ").unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn remote_locations_are_never_missing_locally() {
        assert!(!missing_locally("s3://bucket/does-not-exist"));
    }
}
