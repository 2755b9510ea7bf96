//! Front-end assets of a tool: panel scripts and declared imports.
//!
//! Tool assets live under `<static_dir>/tools/<tool-id>/` and are served to
//! the browser from `/static/tools/<tool-id>/`.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::warn;

use crate::core::security::{PathSecurityError, confine_path, is_descending, validate_segment};

/// URL prefix the static directory is mounted at.
pub const STATIC_URL_PREFIX: &str = "/static";

/// Directory holding panel scripts inside a tool's asset directory.
pub const PANELS_DIR: &str = "panels";

/// Asset directory of a tool on disk.
pub fn tool_asset_dir(static_dir: &Path, tool_id: &str) -> PathBuf {
    static_dir.join("tools").join(tool_id)
}

/// Names (file stems) of the `*.js` panel scripts a tool ships, sorted.
///
/// A tool without a panels directory has no panels; that is not an error.
pub fn list_panels(static_dir: &Path, tool_id: &str) -> Result<Vec<String>, PathSecurityError> {
    let tool_id = validate_segment(tool_id)?;
    let panels_dir = tool_asset_dir(static_dir, tool_id).join(PANELS_DIR);
    if !panels_dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(&panels_dir).map_err(|e| PathSecurityError::IoError {
        path: panels_dir.clone(),
        error: e,
    })?;

    let mut panels: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "js"))
        .filter_map(|path| path.file_stem()?.to_str().map(str::to_string))
        .collect();
    panels.sort();
    Ok(panels)
}

/// Resolve a tool's declared imports into URLs the browser can load.
///
/// - absolute URLs (`http://`, `https://`, `//`) pass through unchanged;
/// - wildcard paths expand to the matching files on disk at call time;
/// - other relative paths are rewritten under the tool's static URL.
///
/// Entries that try to leave the tool's asset directory are dropped.
pub fn resolve_imports(static_dir: &Path, tool_id: &str, imports: &[String]) -> Vec<String> {
    let asset_dir = tool_asset_dir(static_dir, tool_id);
    let mut resolved = Vec::with_capacity(imports.len());

    for import in imports {
        if is_absolute_url(import) {
            resolved.push(import.clone());
            continue;
        }

        if !is_descending(import) {
            warn!("Ignoring import '{}' of tool {}: leaves the tool directory", import, tool_id);
            continue;
        }

        if is_wildcard(import) {
            resolved.extend(expand_wildcard(&asset_dir, tool_id, import));
        } else {
            resolved.push(static_url(tool_id, Path::new(import)));
        }
    }

    resolved
}

fn is_absolute_url(import: &str) -> bool {
    import.starts_with("http://") || import.starts_with("https://") || import.starts_with("//")
}

fn is_wildcard(import: &str) -> bool {
    import.contains(['*', '?', '['])
}

fn expand_wildcard(asset_dir: &Path, tool_id: &str, pattern: &str) -> Vec<String> {
    let Some(base) = asset_dir.to_str() else {
        warn!("Asset directory of tool {} is not valid UTF-8", tool_id);
        return Vec::new();
    };
    let full_pattern = format!("{}/{}", glob::Pattern::escape(base), pattern);

    let paths = match glob::glob(&full_pattern) {
        Ok(paths) => paths,
        Err(e) => {
            warn!("Invalid import pattern '{}' of tool {}: {}", pattern, tool_id, e);
            return Vec::new();
        }
    };

    let mut matches: Vec<PathBuf> = paths
        .filter_map(Result::ok)
        .filter(|path| path.is_file())
        .filter(|path| confine_path(path, asset_dir).is_ok())
        .collect();
    matches.sort();

    matches
        .iter()
        .filter_map(|path| path.strip_prefix(asset_dir).ok())
        .map(|relative| static_url(tool_id, relative))
        .collect()
}

fn static_url(tool_id: &str, relative: &Path) -> String {
    let parts: Vec<_> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();
    format!("{}/tools/{}/{}", STATIC_URL_PREFIX, tool_id, parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "// js").unwrap();
    }

    #[test]
    fn test_list_panels() {
        let temp = TempDir::new().unwrap();
        let panels = tool_asset_dir(temp.path(), "senseip").join(PANELS_DIR);
        touch(&panels.join("k8slogs.js"));
        touch(&panels.join("jobjs.js"));
        touch(&panels.join("notes.txt"));

        assert_eq!(
            list_panels(temp.path(), "senseip").unwrap(),
            ["jobjs", "k8slogs"]
        );
    }

    #[test]
    fn test_list_panels_without_directory() {
        let temp = TempDir::new().unwrap();
        assert!(list_panels(temp.path(), "welcome").unwrap().is_empty());
    }

    #[test]
    fn test_list_panels_rejects_traversal() {
        let temp = TempDir::new().unwrap();
        assert!(list_panels(temp.path(), "..").is_err());
        assert!(list_panels(temp.path(), "a/b").is_err());
    }

    #[test]
    fn test_wildcard_expands_to_files_on_disk() {
        let temp = TempDir::new().unwrap();
        let dir = tool_asset_dir(temp.path(), "conv");
        touch(&dir.join("components/MembersList.js"));
        touch(&dir.join("components/GroupSelection.js"));
        touch(&dir.join("components/readme.md"));

        let imports = vec![
            "components/*.js".to_string(),
            "https://cdn.example.com/chart.js".to_string(),
        ];
        let resolved = resolve_imports(temp.path(), "conv", &imports);

        assert_eq!(
            resolved,
            [
                "/static/tools/conv/components/GroupSelection.js",
                "/static/tools/conv/components/MembersList.js",
                "https://cdn.example.com/chart.js",
            ]
        );
    }

    #[test]
    fn test_wildcard_reflects_disk_at_call_time() {
        let temp = TempDir::new().unwrap();
        let dir = tool_asset_dir(temp.path(), "conv");
        let imports = vec!["components/*.js".to_string()];

        assert!(resolve_imports(temp.path(), "conv", &imports).is_empty());

        touch(&dir.join("components/New.js"));
        assert_eq!(
            resolve_imports(temp.path(), "conv", &imports),
            ["/static/tools/conv/components/New.js"]
        );
    }

    #[test]
    fn test_plain_and_escaping_imports() {
        let temp = TempDir::new().unwrap();
        let imports = vec![
            "./utils.js".to_string(),
            "../other-tool/script.js".to_string(),
            "//cdn.example.com/lib.js".to_string(),
        ];
        assert_eq!(
            resolve_imports(temp.path(), "conv", &imports),
            ["/static/tools/conv/utils.js", "//cdn.example.com/lib.js"]
        );
    }
}
