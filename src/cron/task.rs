//! TSV-backed cron task persistence (spec §4.G): one record per line, seven
//! tab-separated fields, `#`-prefixed comment lines, atomic full rewrite on
//! every mutation.

use std::io::Write;
use std::path::{Path, PathBuf};

/// One scheduled task: either a raw shell command or a prompt routed
/// through the agent loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronTask {
    pub id: String,
    pub schedule: String,
    pub command: String,
    pub enabled: bool,
    pub last_run: i64,
    pub next_run: i64,
    pub prompt: String,
}

impl CronTask {
    fn to_tsv_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.id,
            self.schedule,
            self.command,
            if self.enabled { 1 } else { 0 },
            self.last_run,
            self.next_run,
            self.prompt,
        )
    }

    /// Parse one TSV record. Trailing fields beyond what's present default
    /// to `enabled=1, last_run=0, next_run=0, prompt=""`.
    fn from_tsv_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 2 {
            return None;
        }
        let id = fields[0].to_string();
        let schedule = fields[1].to_string();
        let command = fields.get(2).copied().unwrap_or("").to_string();
        let enabled = fields.get(3).map(|s| *s != "0").unwrap_or(true);
        let last_run = fields.get(4).and_then(|s| s.parse().ok()).unwrap_or(0);
        let next_run = fields.get(5).and_then(|s| s.parse().ok()).unwrap_or(0);
        let prompt = fields.get(6).copied().unwrap_or("").to_string();
        Some(Self {
            id,
            schedule,
            command,
            enabled,
            last_run,
            next_run,
            prompt,
        })
    }
}

pub struct CronStore {
    path: PathBuf,
}

impl CronStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> std::io::Result<Vec<CronTask>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        Ok(content
            .lines()
            .filter(|line| !line.trim_start().starts_with('#') && !line.trim().is_empty())
            .filter_map(CronTask::from_tsv_line)
            .collect())
    }

    /// Rewrite the entire file from `tasks`, atomically via a temp-file
    /// rename within the same directory.
    pub fn save(&self, tasks: &[CronTask]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("tsv.tmp");
        {
            let mut file = std::fs::File::create(&tmp_path)?;
            for task in tasks {
                writeln!(file, "{}", task.to_tsv_line())?;
            }
        }
        std::fs::rename(&tmp_path, &self.path)
    }

    /// Next unused `t<N>` id.
    pub fn next_id(&self, tasks: &[CronTask]) -> String {
        let max = tasks
            .iter()
            .filter_map(|t| t.id.strip_prefix('t').and_then(|n| n.parse::<u64>().ok()))
            .max()
            .unwrap_or(0);
        format!("t{}", max + 1)
    }

    pub fn default_path(home: &Path) -> PathBuf {
        home.join(".bareclaw").join("cron.tsv")
    }
}

#[cfg(test)]
mod tests;
