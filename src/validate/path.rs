//! Containment check for config-driven relative paths

use std::path::{Component, Path, PathBuf};

/// Returns true when `rel` stays inside `base`.
///
/// Rejects absolute paths, anything containing `..`, and anything whose
/// lexical resolution against `base` leaves it. Resolution is purely
/// lexical so targets do not have to exist yet.
pub fn is_safe(rel: &str, base: &Path) -> bool {
    if rel.is_empty() || rel.contains("..") {
        return false;
    }

    let rel_path = Path::new(rel);
    if rel_path.is_absolute() || rel_path.has_root() {
        return false;
    }
    // Windows drive-relative forms like `C:foo`
    if rel_path
        .components()
        .any(|c| matches!(c, Component::Prefix(_)))
    {
        return false;
    }

    let base = normalize(base);
    let resolved = normalize(&base.join(rel_path));
    resolved == base || resolved.starts_with(&base)
}

/// [`is_safe`], and `rel` must name something below `base`, never `base`
/// itself: `.` and `./` are rejected.
pub fn is_strictly_inside(rel: &str, base: &Path) -> bool {
    is_safe(rel, base) && normalize(&base.join(rel)) != normalize(base)
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_traversal_and_absolute() {
        let base = Path::new("/work/repo");
        assert!(!is_safe("../x", base));
        assert!(!is_safe("a/../../x", base));
        assert!(!is_safe("/etc/passwd", base));
        assert!(!is_safe("", base));
    }

    #[test]
    fn accepts_nested_relative_paths() {
        let base = Path::new("/work/repo");
        assert!(is_safe("a/b", base));
        assert!(is_safe(".env.local", base));
        assert!(is_safe("./config/dev.json", base));
        assert!(is_safe(".", base));
    }

    #[test]
    fn base_itself_is_not_strictly_inside() {
        let base = Path::new("/work/repo");
        for rel in [".", "./", "./.", "a/.."] {
            assert!(!is_strictly_inside(rel, base), "{rel}");
        }
        assert!(is_strictly_inside("node_modules", base));
        assert!(is_strictly_inside("./config/dev.json", base));
    }

    #[test]
    fn prefix_check_respects_component_boundaries() {
        let base = Path::new("/work/repo");
        assert!(!normalize(&base.join("x")).starts_with("/work/rep"));
        assert!(is_safe("repo-sibling", base));
    }
}
