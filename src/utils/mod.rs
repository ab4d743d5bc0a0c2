use std::path::{Path, PathBuf};

/// Staging location for `target`: its base name inside `scratch_dir`.
pub fn staging_path_for(target: &Path, scratch_dir: &Path) -> Option<PathBuf> {
    target.file_name().map(|name| scratch_dir.join(name))
}

/// Hidden file next to `target`, used when the staged file cannot be renamed
/// straight into place.
pub fn partial_sibling(target: &Path) -> Option<PathBuf> {
    let name = target.file_name()?;
    let sibling = format!(".{}.partial", name.to_string_lossy());
    Some(match target.parent() {
        Some(parent) => parent.join(sibling),
        None => PathBuf::from(sibling),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staging_path_for() {
        assert_eq!(
            staging_path_for(Path::new("/data/out.bin"), Path::new("/tmp")),
            Some(PathBuf::from("/tmp/out.bin"))
        );
        assert_eq!(staging_path_for(Path::new("/"), Path::new("/tmp")), None);
    }

    #[test]
    fn test_partial_sibling() {
        assert_eq!(
            partial_sibling(Path::new("/data/out.bin")),
            Some(PathBuf::from("/data/.out.bin.partial"))
        );
        assert_eq!(
            partial_sibling(Path::new("out.bin")),
            Some(PathBuf::from(".out.bin.partial"))
        );
    }
}
