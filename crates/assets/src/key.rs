//! Helpers for reading names and extensions out of asset keys.
//!
//! A key is either a filesystem path (absolute or root-relative) or, for
//! external assets, an `http(s)` URL.

/// Returns the path component of an `http://` or `https://` key, without
/// query string or fragment. `None` when the key is not a web URL.
pub fn url_path(key: &str) -> Option<&str> {
    let trimmed = key.trim();
    let lowered = trimmed.get(..8).unwrap_or(trimmed).to_ascii_lowercase();
    let rest = if lowered.starts_with("https://") {
        &trimmed[8..]
    } else if lowered.starts_with("http://") {
        &trimmed[7..]
    } else {
        return None;
    };

    let Some(start) = rest.find(['/', '?', '#']) else {
        return Some("");
    };
    if !rest[start..].starts_with('/') {
        return Some("");
    }
    let path = &rest[start..];
    let end = path.find(['?', '#']).unwrap_or(path.len());
    Some(&path[..end])
}

/// Last segment of a key. For URLs this is the last segment of the URL path.
pub fn asset_name(key: &str) -> Option<&str> {
    let source = match url_path(key) {
        Some(path) => path,
        None => key.trim(),
    };
    let source = source.trim_end_matches(['/', '\\']);
    let name = source.rsplit(['/', '\\']).next().unwrap_or(source);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Lower-cased extension of the asset name. Names without a dot, or whose
/// only dot is the leading character (`.Rprofile`), have no extension.
pub fn extension(key: &str) -> Option<String> {
    let name = asset_name(key)?;
    let pos = name.rfind('.')?;
    if pos == 0 || pos + 1 == name.len() {
        return None;
    }
    Some(name[pos + 1..].to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_path_strips_query_and_fragment() {
        assert_eq!(
            url_path("https://github.com/test/content/test.py?ref=_1234&test2.py4"),
            Some("/test/content/test.py")
        );
        assert_eq!(url_path("HTTP://example.org/a.R#L10"), Some("/a.R"));
        assert_eq!(url_path("http://test.py"), Some(""));
        assert_eq!(url_path("/home/user/test.py"), None);
    }

    #[test]
    fn asset_name_handles_paths_and_urls() {
        assert_eq!(asset_name("/home/user/analysis.R"), Some("analysis.R"));
        assert_eq!(asset_name("C:\\data\\raw.csv"), Some("raw.csv"));
        assert_eq!(asset_name("/home/user/dir/"), Some("dir"));
        assert_eq!(asset_name("https://example.org/x/y.md?raw=1"), Some("y.md"));
        assert_eq!(asset_name("http://test.py"), None);
        assert_eq!(asset_name("  "), None);
    }

    #[test]
    fn extension_requires_a_stem() {
        assert_eq!(extension("/p/model.PY"), Some("py".to_string()));
        assert_eq!(extension("/p/archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(extension("/p/.Rprofile"), None);
        assert_eq!(extension("/p/Makefile"), None);
        assert_eq!(extension("/p/trailing."), None);
    }
}
