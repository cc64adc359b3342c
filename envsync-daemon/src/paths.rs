use std::path::{Path, PathBuf};
use std::time::Duration;

/// Writes this soon after a refresh tick are assumed to come from the pull.
pub const GUARD_WINDOW: Duration = Duration::from_secs(3);
pub const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(5);
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Directory watched alongside the target to see rename-based saves.
pub fn parent_dir(target: &Path) -> Option<PathBuf> {
    target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

/// Exact path, or same file name (backends may report canonical paths,
/// e.g. `/private/var/...` on macOS).
pub fn matches_target(path: &Path, target: &Path) -> bool {
    path == target || (path.file_name().is_some() && path.file_name() == target.file_name())
}
