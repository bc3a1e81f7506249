//! Path string helpers
//!
//! Paths here are strings typed by a user or returned by the service; they
//! may name a different machine, so nothing touches the local filesystem.

const FORBIDDEN: [char; 8] = ['<', '>', '"', '|', '?', '*', '\n', '\r'];

/// Cheap sanity check for a directory path
///
/// Accepts Windows drive paths (`C:\Photos`), UNC shares
/// (`\\server\share\...`) and absolute POSIX paths. Used for warnings only.
pub fn is_plausible_directory(path: &str) -> bool {
    let path = path.trim();
    if path.is_empty() || path.contains(FORBIDDEN) {
        return false;
    }

    if let Some(rest) = path.strip_prefix("\\\\") {
        // server\share, both non-empty
        let mut parts = rest.splitn(2, '\\');
        let server = parts.next().unwrap_or("");
        let share = parts.next().unwrap_or("");
        return !server.is_empty() && !server.contains(':') && !share.is_empty();
    }

    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        let rest = &path[2..];
        return (rest.is_empty() || rest.starts_with('\\')) && !rest.contains(':');
    }

    path.starts_with('/')
}

/// Split a path into (parent directory with trailing separator, file name)
pub fn split_file_name(path: &str) -> (&str, &str) {
    match path.rfind(['\\', '/']) {
        Some(idx) => (&path[..=idx], &path[idx + 1..]),
        None => ("", path),
    }
}
