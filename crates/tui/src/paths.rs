use std::path::{Path, PathBuf};

const ELLIPSIS: &str = "…/";

/// Path as shown to the user: relative to `root` when it lives below it
pub fn relative_to(path: &Path, root: Option<&Path>) -> PathBuf {
    root.and_then(|root| path.strip_prefix(root).ok())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| path.to_path_buf())
}

/// Shorten a path to at most `max_width` characters.
///
/// The file name is always kept whole. Leading directories are dropped first,
/// replaced by `…/`.
pub fn truncate(path: &str, max_width: usize) -> String {
    if path.chars().count() <= max_width {
        return path.to_string();
    }

    let (dir, filename) = match path.rsplit_once('/') {
        Some((dir, filename)) => (dir, filename),
        None => return path.to_string(),
    };
    let filename_width = filename.chars().count();
    let ellipsis_width = ELLIPSIS.chars().count();
    if filename_width + ellipsis_width >= max_width {
        return filename.to_string();
    }

    let mut available = max_width - filename_width - ellipsis_width;
    let mut kept: Vec<&str> = Vec::new();
    for part in dir.rsplit('/').filter(|part| !part.is_empty()) {
        let width = part.chars().count() + 1;
        if width > available {
            break;
        }
        available -= width;
        kept.push(part);
    }
    kept.reverse();

    let mut out = String::from(ELLIPSIS);
    for part in kept {
        out.push_str(part);
        out.push('/');
    }
    out.push_str(filename);
    out
}
