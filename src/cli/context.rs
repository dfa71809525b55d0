use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Name of the data directory under the platform data location.
const APP_DIR_NAME: &str = "passync";

/// Initialize the global data directory.
/// Uses `custom` when given, otherwise `<platform data dir>/passync`.
pub fn init(custom: Option<&Path>) {
    let dir = custom
        .map(Path::to_path_buf)
        .unwrap_or_else(default_data_dir);
    tracing::debug!(path = %dir.display(), "data directory");
    let _ = DATA_DIR.set(dir);
}

/// Get the current data directory.
pub fn data_dir() -> &'static Path {
    DATA_DIR.get_or_init(default_data_dir).as_path()
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(".passync"))
}
