use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt as _;

/// Where the token bytes for `token_file` should live.
///
/// A `token_file` containing a path separator is taken verbatim; a bare
/// file name is co-located with the kubeconfig itself.
pub fn resolve_token_path(token_file: &str, kubeconfig: &Path) -> PathBuf {
    if token_file.contains(std::path::MAIN_SEPARATOR) {
        return PathBuf::from(token_file);
    }

    match kubeconfig.parent() {
        Some(dir) => dir.join(token_file),
        None => PathBuf::from(token_file),
    }
}

/// Writes the literal token to `path`, truncating existing content. The
/// file is created owner read/write only.
pub fn write_token(path: &Path, token: &str) -> anyhow::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options
        .open(path)
        .with_context(|| format!("Opening token file {}", path.display()))?;
    file.write_all(token.as_bytes())
        .with_context(|| format!("Writing token file {}", path.display()))?;

    Ok(())
}
