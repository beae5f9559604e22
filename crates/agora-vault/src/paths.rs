//! Path arithmetic and link creation for event directories.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Resolve `.` and `..` components without touching the filesystem.
pub(crate) fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Path of `target` as seen from inside the directory `base`.
///
/// Relative inputs are anchored at the current directory first.
pub(crate) fn relative_to(target: &Path, base: &Path) -> io::Result<PathBuf> {
    let target = normalize_lexically(&std::path::absolute(target)?);
    let base = normalize_lexically(&std::path::absolute(base)?);

    let mut target_parts = target.components().peekable();
    let mut base_parts = base.components().peekable();
    while let (Some(t), Some(b)) = (target_parts.peek(), base_parts.peek()) {
        if t != b {
            break;
        }
        target_parts.next();
        base_parts.next();
    }

    let mut relative: PathBuf = base_parts.map(|_| Component::ParentDir).collect();
    relative.extend(target_parts);
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    Ok(relative)
}

/// Create a symbolic link at `link` pointing at `target`.
#[cfg(unix)]
pub(crate) fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

/// Create a symbolic link at `link` pointing at `target`.
#[cfg(windows)]
pub(crate) fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_drops_cur_dir_and_resolves_parents() {
        assert_eq!(
            normalize_lexically(Path::new("log/./2024-01-01-00:00:00/../../inbox/a.eml")),
            PathBuf::from("inbox/a.eml")
        );
        assert_eq!(
            normalize_lexically(Path::new("../x/../y")),
            PathBuf::from("../y")
        );
        assert_eq!(normalize_lexically(Path::new("/../a")), PathBuf::from("/a"));
    }

    #[test]
    fn relative_path_climbs_out_of_event_directory() {
        let rel = relative_to(
            Path::new("/archive/inbox/a@b.eml"),
            Path::new("/archive/log/2024-01-01-00:00:00"),
        )
        .unwrap();
        assert_eq!(rel, PathBuf::from("../../inbox/a@b.eml"));
    }

    #[test]
    fn relative_path_within_base() {
        let rel = relative_to(Path::new("/a/b/c"), Path::new("/a")).unwrap();
        assert_eq!(rel, PathBuf::from("b/c"));

        let rel = relative_to(Path::new("/a"), Path::new("/a")).unwrap();
        assert_eq!(rel, PathBuf::from("."));
    }

    #[test]
    fn relative_inputs_share_the_current_directory() {
        let rel = relative_to(
            Path::new("inbox/a.eml"),
            Path::new("log/2024-01-01-00:00:00"),
        )
        .unwrap();
        assert_eq!(rel, PathBuf::from("../../inbox/a.eml"));
    }
}
