//! Persistent, file-per-key memory backend (spec §4.B).
//!
//! A logical key `K` (which may contain `/` separators for nesting) maps to
//! a file at `<workspace>/memory/<K>.md`. Keys never escape that directory;
//! the dispatch layer is responsible for validating keys via
//! `SecurityPolicy::allow_path` when they are constructed from untrusted
//! model input.

use std::path::{Path, PathBuf};

pub struct MemoryBackend {
    root: PathBuf,
}

impl MemoryBackend {
    pub fn new(workspace_dir: &Path) -> Self {
        Self {
            root: workspace_dir.join("memory"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.md"))
    }

    /// Write `content` (plus a trailing newline) to `<key>.md`, truncating
    /// any existing content. Creates missing parent directories — this is
    /// what makes nested keys like `cron/t1/1700000000` work.
    pub fn store(&self, key: &str, content: &str) -> std::io::Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, format!("{content}\n"))
    }

    /// Return the content of `<key>.md` if it exists; otherwise scan the
    /// memory directory and concatenate every file whose name contains
    /// `key` as a substring.
    pub fn recall(&self, key: &str) -> String {
        let exact = self.path_for(key);
        if let Ok(content) = std::fs::read_to_string(&exact) {
            return content;
        }

        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return "(no memory yet)".to_string();
        };

        let mut matches: Vec<(String, String)> = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            if !name.contains(key) {
                continue;
            }
            if let Ok(content) = std::fs::read_to_string(&path) {
                matches.push((name.to_string(), content));
            }
        }

        if matches.is_empty() {
            return "(no matching memory found)".to_string();
        }

        matches.sort_by(|a, b| a.0.cmp(&b.0));
        matches
            .into_iter()
            .map(|(name, content)| format!("{name}:\n{content}"))
            .collect::<Vec<_>>()
            .join("\n---\n")
    }

    /// Delete `<key>.md`. Missing file is success (idempotent).
    pub fn forget(&self, key: &str) -> std::io::Result<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// List every stored key (file stem, `.md` stripped), one per line.
    pub fn list_keys(&self) -> String {
        let keys = self.all_keys();
        if keys.is_empty() {
            return "(no memory entries)".to_string();
        }
        keys.join("\n")
    }

    fn all_keys(&self) -> Vec<String> {
        let Ok(entries) = walk_md_files(&self.root) else {
            return Vec::new();
        };
        let mut keys: Vec<String> = entries
            .into_iter()
            .filter_map(|path| relative_stem(&self.root, &path))
            .collect();
        keys.sort();
        keys
    }

    /// Delete every entry whose stem starts with `prefix`. Returns the count
    /// of deleted entries.
    pub fn delete_prefix(&self, prefix: &str) -> usize {
        let mut deleted = 0;
        for key in self.all_keys() {
            if key.starts_with(prefix) && self.forget(&key).is_ok() {
                deleted += 1;
            }
        }
        deleted
    }
}

fn walk_md_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    if !dir.exists() {
        return Ok(out);
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            out.extend(walk_md_files(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "md") {
            out.push(path);
        }
    }
    Ok(out)
}

fn relative_stem(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let rel = rel.with_extension("");
    Some(rel.to_string_lossy().replace('\\', "/"))
}
