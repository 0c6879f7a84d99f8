use super::*;
use tempfile::tempdir;

fn policy() -> (SecurityPolicy, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let policy = SecurityPolicy::new(dir.path().to_path_buf());
    (policy, dir)
}

#[test]
fn rejects_parent_traversal() {
    let (policy, _dir) = policy();
    assert!(!policy.allow_path("../etc/passwd"));
    assert!(!policy.allow_path("foo/../../etc/passwd"));
}

#[test]
fn rejects_forbidden_prefixes() {
    let (policy, _dir) = policy();
    assert!(!policy.allow_path("/etc/passwd"));
    assert!(!policy.allow_path("/root/.bashrc"));
    assert!(!policy.allow_path("/usr/bin/sh"));
    assert!(!policy.allow_path("/proc/1/maps"));
    assert!(!policy.allow_path("/sys/kernel"));
    assert!(!policy.allow_path("/dev/null"));
}

#[test]
fn rejects_sensitive_substrings() {
    let (policy, dir) = policy();
    let ssh = dir.path().join(".ssh/id_rsa");
    assert!(!policy.allow_path(ssh.to_str().unwrap()));
}

#[test]
fn accepts_absolute_paths_inside_workspace_only() {
    let (policy, dir) = policy();
    let inside = dir.path().join("notes.md");
    assert!(policy.allow_path(inside.to_str().unwrap()));

    let outside = "/home/other/notes.md";
    assert!(!policy.allow_path(outside));
}

#[test]
fn accepts_relative_paths() {
    let (policy, _dir) = policy();
    assert!(policy.allow_path("notes/today.md"));
}

#[test]
fn shell_blocklist_rejects_rm() {
    let (policy, _dir) = policy();
    assert!(!policy.allow_shell_command("rm -rf /tmp/foo"));
    assert!(!policy.allow_shell_command("  rm -rf /tmp/foo"));
    assert!(!policy.allow_shell_command("/bin/rm -rf /"));
    assert!(!policy.allow_shell_command("ls && rm -rf /"));
}

#[test]
fn shell_blocklist_echo_safety_valve() {
    let (policy, _dir) = policy();
    assert!(policy.allow_shell_command("echo 'rm -rf / is dangerous'"));
}

#[test]
fn shell_blocklist_other_patterns() {
    let (policy, _dir) = policy();
    assert!(!policy.allow_shell_command("dd if=/dev/zero of=/dev/sda"));
    assert!(!policy.allow_shell_command("mkfs.ext4 /dev/sda1"));
    assert!(!policy.allow_shell_command(":(){ :|:& };:"));
    assert!(!policy.allow_shell_command("cat x > /etc/passwd"));
}

#[test]
fn shell_blocklist_allows_safe_commands() {
    let (policy, _dir) = policy();
    assert!(policy.allow_shell_command("ls -la"));
    assert!(policy.allow_shell_command("git status"));
}

#[test]
fn audit_log_appends_tab_separated_lines() {
    let (policy, _dir) = policy();
    policy.audit_log("shell", "ls -la");
    policy.audit_log("file_read", "notes.md");

    let content = std::fs::read_to_string(policy.audit_log_path()).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    let fields: Vec<&str> = lines[0].split('\t').collect();
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[1], "shell");
    assert_eq!(fields[2], "ls -la");
}

#[test]
fn tail_audit_log_returns_last_n() {
    let (policy, _dir) = policy();
    for i in 0..5 {
        policy.audit_log("shell", &format!("cmd {i}"));
    }
    let tail = policy.tail_audit_log(2);
    let lines: Vec<&str> = tail.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].contains("cmd 4"));
}
