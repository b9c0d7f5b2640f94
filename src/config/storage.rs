use crate::delta::StorageOptions;

/// Load object-store configuration from environment variables.
/// Works for S3, MinIO, local FS.
pub fn load_storage_options() -> StorageOptions {
    storage_options_from(std::env::vars())
}

pub fn storage_options_from(vars: impl IntoIterator<Item = (String, String)>) -> StorageOptions {
    vars.into_iter()
        .filter(|(k, _)| k.starts_with("AWS_"))
        .collect()
}
