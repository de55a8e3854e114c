use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Appended to the container name to form the cache file name.
pub const CACHE_EXTENSION: &str = ".hdtcache";

/// Compression suffixes stripped before the cache extension is appended.
pub const COMPRESSED_SUFFIXES: [&str; 3] = [".gz", ".bz2", ".xz"];

/// `data.hdt.gz` -> `data.hdt.hdtcache`; `data.hdt` -> `data.hdt.hdtcache`.
///
/// At most one compression suffix is stripped, compared case-insensitively.
/// A file name that is nothing but a suffix keeps it.
pub fn derive_cache_path(container: &Path) -> PathBuf {
    let Some(file_name) = container.file_name() else {
        let mut derived = container.as_os_str().to_owned();
        derived.push(CACHE_EXTENSION);
        return PathBuf::from(derived);
    };
    let name = file_name.to_string_lossy();
    let lower = name.to_ascii_lowercase();
    let stem_len = COMPRESSED_SUFFIXES
        .iter()
        .find(|suffix| lower.ends_with(*suffix) && lower.len() > suffix.len())
        .map_or(name.len(), |suffix| name.len() - suffix.len());

    let mut derived = OsString::from(&name[..stem_len]);
    derived.push(CACHE_EXTENSION);
    container.with_file_name(derived)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_one_compression_suffix() {
        assert_eq!(
            derive_cache_path(Path::new("dumps/dbpedia.hdt.gz")),
            PathBuf::from("dumps/dbpedia.hdt.hdtcache")
        );
        assert_eq!(
            derive_cache_path(Path::new("a.hdt.XZ")),
            PathBuf::from("a.hdt.hdtcache")
        );
        assert_eq!(
            derive_cache_path(Path::new("a.gz.gz")),
            PathBuf::from("a.gz.hdtcache")
        );
    }

    #[test]
    fn uncompressed_name_is_kept() {
        assert_eq!(
            derive_cache_path(Path::new("/data/swdf.hdt")),
            PathBuf::from("/data/swdf.hdt.hdtcache")
        );
    }

    #[test]
    fn bare_suffix_is_not_stripped_to_nothing() {
        assert_eq!(derive_cache_path(Path::new(".gz")), PathBuf::from(".gz.hdtcache"));
        assert_eq!(
            derive_cache_path(Path::new("dumps/.gz")),
            PathBuf::from("dumps/.gz.hdtcache")
        );
        assert_eq!(
            derive_cache_path(Path::new("/data/.XZ")),
            PathBuf::from("/data/.XZ.hdtcache")
        );
    }
}
