use std::path::{Path, PathBuf};

/// Vector files: GeoJSON under either common extension.
const VECTOR_EXTENSIONS: &[&str] = &["geojson", "json"];
/// Tables: CSV first, Parquet as an alternative with the same stem.
const TABLE_EXTENSIONS: &[&str] = &["csv", "parquet"];

/// First existing `<dir>/<stem>.<ext>`, or the preferred name when none
/// exists (so missing-input reports show the conventional file name).
fn resolve(dir: &Path, stem: &str, extensions: &[&str]) -> PathBuf {
    extensions
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|p| p.is_file())
        .unwrap_or_else(|| dir.join(format!("{stem}.{}", extensions[0])))
}

pub fn resolve_vector(dir: &Path, stem: &str) -> PathBuf {
    resolve(dir, stem, VECTOR_EXTENSIONS)
}

pub fn resolve_table(dir: &Path, stem: &str) -> PathBuf {
    resolve(dir, stem, TABLE_EXTENSIONS)
}
