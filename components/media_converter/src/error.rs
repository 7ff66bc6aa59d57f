use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// The requested container or codec has no preset; reported before
    /// anything is spawned.
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
}
