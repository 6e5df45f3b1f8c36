//! Which repository blobs are worth indexing.

use std::collections::BTreeSet;

/// Binary, media, archive, lock and build-artifact extensions (lowercase, no dot).
const EXCLUDED_EXTENSIONS: &[&str] = &[
    // images
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "icns", "webp", "svg", "tif", "tiff", "psd",
    "avif", "heic",
    // fonts
    "woff", "woff2", "ttf", "otf", "eot",
    // audio and video
    "mp3", "mp4", "wav", "ogg", "flac", "aac", "m4a", "webm", "mov", "avi", "mkv",
    // archives
    "zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "rar", "jar", "war",
    // compiled and binary
    "exe", "dll", "so", "dylib", "a", "o", "obj", "class", "pyc", "pyo", "wasm", "bin",
    "dat", "node",
    // documents and data blobs
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "sqlite", "db",
    // lock files and build output
    "lock", "lockb", "map",
];

/// Lock files matched by exact file name.
const EXCLUDED_FILE_NAMES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "bun.lockb",
    "Cargo.lock",
    "Gemfile.lock",
    "composer.lock",
    "poetry.lock",
    "Pipfile.lock",
    "go.sum",
];

/// Directories whose contents are never indexed, wherever they appear.
const EXCLUDED_DIRECTORIES: &[&str] = &[
    "node_modules",
    "dist",
    "build",
    "target",
    ".git",
    "vendor",
    ".next",
];

/// Decides from path and size alone whether a blob should be fetched.
#[derive(Debug, Clone)]
pub struct FileFilter {
    max_file_size_bytes: u64,
    extra_extensions: BTreeSet<Box<str>>,
}

impl FileFilter {
    /// Filter with a size cap and extra excluded extensions (lowercase, no dot).
    pub fn new(max_file_size_bytes: u64, extra_extensions: &[Box<str>]) -> Self {
        Self {
            max_file_size_bytes,
            extra_extensions: extra_extensions
                .iter()
                .map(|extension| extension.trim_start_matches('.').to_ascii_lowercase().into())
                .collect(),
        }
    }

    /// True when the blob at `path` with `size` bytes should be indexed.
    pub fn accepts(&self, path: &str, size: u64) -> bool {
        size <= self.max_file_size_bytes
            && !is_in_excluded_directory(path)
            && !self.has_excluded_name(path)
    }

    fn has_excluded_name(&self, path: &str) -> bool {
        let name = path.rsplit('/').next().unwrap_or(path);
        if EXCLUDED_FILE_NAMES.contains(&name) {
            return true;
        }
        let Some((_, extension)) = name.rsplit_once('.') else {
            return false;
        };
        let extension = extension.to_ascii_lowercase();
        EXCLUDED_EXTENSIONS.contains(&extension.as_str())
            || self.extra_extensions.contains(extension.as_str())
            || name.to_ascii_lowercase().ends_with(".min.js")
    }
}

fn is_in_excluded_directory(path: &str) -> bool {
    let mut segments: Vec<&str> = path.split('/').collect();
    segments.pop();
    segments
        .iter()
        .any(|segment| EXCLUDED_DIRECTORIES.contains(segment))
}
