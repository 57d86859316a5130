// medallion-core/src/infrastructure/fs.rs

use crate::infrastructure::error::InfrastructureError;
use std::io::Write;
use std::path::Path;

/// Write bytes to `path` so readers see either the old or the new content.
///
/// The temporary file lives next to the target so the final rename never
/// crosses a filesystem boundary. Missing parent directories are created.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
    temp_file.write_all(content.as_ref())?;
    temp_file.flush()?;
    temp_file
        .persist(path)
        .map_err(|e| InfrastructureError::Io(e.error))?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_creates_parents() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("gold").join("ca_by_year.parquet");

        atomic_write(&file_path, b"PAR1")?;

        assert_eq!(fs::read(&file_path)?, b"PAR1");
        Ok(())
    }

    #[test]
    fn test_atomic_write_replaces_and_leaves_no_temp_files() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("run_results.json");

        atomic_write(&file_path, "{}")?;
        atomic_write(&file_path, "{\"success\":true}")?;

        assert_eq!(fs::read_to_string(&file_path)?, "{\"success\":true}");
        let entries = fs::read_dir(dir.path())?.count();
        assert_eq!(entries, 1);
        Ok(())
    }
}
