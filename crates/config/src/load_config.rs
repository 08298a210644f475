// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use path_clean::clean;
use std::path::{Path, PathBuf};

/// File name looked up when no `--config` is given
pub const DEFAULT_CONFIG_NAME: &str = "violations.config.yaml";

pub type FindInParent = fn(&Path, &str) -> Option<PathBuf>;

/// Walk from `start` towards the filesystem root looking for `filename`
pub fn find_in_parent(start: &Path, filename: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(filename))
        .find(|candidate| candidate.is_file())
}

/// Where to look for the configuration file
pub struct ConfigSearch<'a> {
    pub cwd: &'a Path,
    pub default_dir: &'a Path,
    pub filename: &'a str,
}

/// Pick the configuration file: an explicit path wins, then the nearest
/// `filename` above `cwd`, then `default_dir/filename`.
pub fn resolve_config_path(
    find: FindInParent,
    search: &ConfigSearch<'_>,
    cli_file: Option<&Path>,
) -> PathBuf {
    match cli_file {
        Some(file) if file.is_absolute() => file.to_path_buf(),
        Some(file) => clean(search.cwd.join(file)),
        None => find(search.cwd, search.filename)
            .unwrap_or_else(|| clean(search.default_dir.join(search.filename))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;

    fn not_found(_: &Path, _: &str) -> Option<PathBuf> {
        None
    }

    fn found(_: &Path, _: &str) -> Option<PathBuf> {
        Some(PathBuf::from("/srv/violations.config.yaml"))
    }

    fn search() -> ConfigSearch<'static> {
        ConfigSearch {
            cwd: Path::new("/srv/app"),
            default_dir: Path::new("/home/me/.config/violations"),
            filename: DEFAULT_CONFIG_NAME,
        }
    }

    #[test]
    fn test_resolve_order() {
        assert_eq!(
            resolve_config_path(not_found, &search(), None),
            PathBuf::from("/home/me/.config/violations/violations.config.yaml")
        );
        assert_eq!(
            resolve_config_path(found, &search(), None),
            PathBuf::from("/srv/violations.config.yaml")
        );
        assert_eq!(
            resolve_config_path(found, &search(), Some(Path::new("/etc/tvr.yaml"))),
            PathBuf::from("/etc/tvr.yaml")
        );
        assert_eq!(
            resolve_config_path(found, &search(), Some(Path::new("../conf/tvr.yaml"))),
            PathBuf::from("/srv/conf/tvr.yaml")
        );
    }

    #[test]
    fn test_find_in_parent_walks_up() -> Result<()> {
        let root = tempfile::tempdir()?;
        let nested = root.path().join("a/b/c");
        fs::create_dir_all(&nested)?;
        assert_eq!(find_in_parent(&nested, DEFAULT_CONFIG_NAME), None);

        let file = root.path().join("a").join(DEFAULT_CONFIG_NAME);
        fs::write(&file, "jurisdiction: 1\n")?;
        assert_eq!(find_in_parent(&nested, DEFAULT_CONFIG_NAME), Some(file));
        Ok(())
    }
}
