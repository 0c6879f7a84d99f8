//! Path allowlisting, shell-command blocklisting, and the append-only audit
//! trail every tool call traverses before execution (spec §4.A).

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Absolute path prefixes that are never allowed, regardless of workspace.
const FORBIDDEN_PREFIXES: &[&str] = &["/etc/", "/root/", "/usr/", "/proc/", "/sys/", "/dev/"];

/// Substrings that mark a path as sensitive no matter where it lives.
const SENSITIVE_SUBSTRINGS: &[&str] = &["/.ssh", "/.gnupg", "/.aws", "/.bareclaw/secrets"];

/// Shell-command patterns that are rejected outright. These are matched as a
/// prefix (after trimming leading whitespace) or as a substring, depending on
/// the pattern — see `allow_shell_command`.
const BLOCKED_SHELL_PATTERNS: &[&str] = &[
    "rm ", "rm\t", "/bin/rm", "/usr/bin/rm", "unlink ", "rmdir ", "shred ", "dd ", "> /", "mkfs",
    "fdisk", "parted", ":(){",
];

/// Immutable security boundary for a single process lifetime.
///
/// Invariant: `workspace_dir` is absolute and exists on disk.
#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    workspace_dir: PathBuf,
}

impl SecurityPolicy {
    /// Construct a policy rooted at `workspace_dir`.
    ///
    /// `workspace_dir` must already be an absolute, existing directory;
    /// callers (config loading, onboarding) are responsible for creating it
    /// first.
    pub fn new(workspace_dir: PathBuf) -> Self {
        debug_assert!(workspace_dir.is_absolute());
        Self { workspace_dir }
    }

    pub fn workspace_dir(&self) -> &Path {
        &self.workspace_dir
    }

    /// Whether `path` may be read or written by a tool.
    ///
    /// Rejects any segment equal to `..`, any forbidden prefix, any sensitive
    /// substring, and — for absolute paths — anything outside the workspace.
    /// Relative paths are accepted here; the caller resolves them against the
    /// workspace before touching the filesystem.
    pub fn allow_path(&self, path: &str) -> bool {
        if path
            .split('/')
            .any(|segment| segment == "..")
        {
            return false;
        }

        for prefix in FORBIDDEN_PREFIXES {
            if path.starts_with(prefix) {
                return false;
            }
        }

        for sensitive in SENSITIVE_SUBSTRINGS {
            if path.contains(sensitive) {
                return false;
            }
        }

        let as_path = Path::new(path);
        if as_path.is_absolute() {
            return as_path.starts_with(&self.workspace_dir);
        }

        true
    }

    /// Resolve a caller-provided path against the workspace, returning an
    /// absolute `PathBuf`. Does not itself call `allow_path` — callers must
    /// check that first.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let as_path = Path::new(path);
        if as_path.is_absolute() {
            as_path.to_path_buf()
        } else {
            self.workspace_dir.join(as_path)
        }
    }

    /// Whether `cmd` is allowed to be passed to `/bin/sh -c`.
    ///
    /// After trimming leading whitespace, rejects any prefix-matching or
    /// substring-matching blocked pattern. A substring match is suppressed
    /// if the command also contains `echo` (a safety valve for commands that
    /// merely print a blocked string literally rather than executing it).
    /// Rationale: defense-in-depth, not a sandbox.
    pub fn allow_shell_command(&self, cmd: &str) -> bool {
        let trimmed = cmd.trim_start();
        let has_echo = trimmed.contains("echo");

        for pattern in BLOCKED_SHELL_PATTERNS {
            if trimmed.starts_with(pattern) {
                return false;
            }
            if trimmed.contains(pattern) && !has_echo {
                return false;
            }
        }

        true
    }

    /// Append one audit entry. Best-effort: failure never aborts the tool
    /// call. Invoked before any side effect of the tool it describes.
    pub fn audit_log(&self, tool_name: &str, detail: &str) {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let Some(parent) = self.audit_log_path().parent().map(Path::to_path_buf) else {
            return;
        };
        if std::fs::create_dir_all(&parent).is_err() {
            return;
        }

        let line = format!(
            "{ts}\t{tool_name}\t{}\n",
            detail.replace('\t', " ").replace('\n', " ")
        );

        use std::io::Write as _;
        if let Ok(mut file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.audit_log_path())
        {
            let _ = file.write_all(line.as_bytes());
        }
    }

    pub fn audit_log_path(&self) -> PathBuf {
        self.workspace_dir.join("audit.log")
    }

    /// Return the last `n` lines of the audit log, newest last. Empty string
    /// if the log does not exist yet.
    pub fn tail_audit_log(&self, n: usize) -> String {
        let Ok(content) = std::fs::read_to_string(self.audit_log_path()) else {
            return String::new();
        };
        let lines: Vec<&str> = content.lines().collect();
        let start = lines.len().saturating_sub(n);
        lines[start..].join("\n")
    }
}

#[cfg(test)]
mod tests;
