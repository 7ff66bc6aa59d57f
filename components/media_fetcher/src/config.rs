use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Caller-supplied knobs for fetch jobs.
///
/// The engine never reads configuration files itself; the base resolves
/// settings and passes them in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Browser cookie export, forwarded to the fetching tool when set.
    pub cookie_file: Option<PathBuf>,
}
