//! The cron expression evaluator, task persistence, and task runner (spec
//! §4.G).

pub mod calendar;
pub mod expr;
pub mod runner;
pub mod task;

use crate::providers::Provider;
use crate::tools::{ToolContext, ToolRegistry};
use std::time::{SystemTime, UNIX_EPOCH};
use task::{CronStore, CronTask};

fn now_ts() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
}

/// Owns the TSV store and implements the `add`/`add-prompt`/`remove`/
/// `pause`/`resume`/`list`/`run` subcommands.
pub struct CronService {
    store: CronStore,
}

impl CronService {
    pub fn new(store: CronStore) -> Self {
        Self { store }
    }

    pub fn add_shell(&self, schedule: &str, command: &str) -> Result<CronTask, String> {
        let parsed = expr::parse_cron_expr(schedule)?;
        let mut tasks = self.store.load().map_err(|e| e.to_string())?;
        let id = self.store.next_id(&tasks);
        let next_run = expr::next_run_after(&parsed, now_ts());
        let task = CronTask {
            id,
            schedule: schedule.to_string(),
            command: command.to_string(),
            enabled: true,
            last_run: 0,
            next_run,
            prompt: String::new(),
        };
        tasks.push(task.clone());
        self.store.save(&tasks).map_err(|e| e.to_string())?;
        Ok(task)
    }

    pub fn add_prompt(&self, schedule: &str, prompt: &str) -> Result<CronTask, String> {
        let parsed = expr::parse_cron_expr(schedule)?;
        let mut tasks = self.store.load().map_err(|e| e.to_string())?;
        let id = self.store.next_id(&tasks);
        let next_run = expr::next_run_after(&parsed, now_ts());
        let task = CronTask {
            id,
            schedule: schedule.to_string(),
            command: "-".to_string(),
            enabled: true,
            last_run: 0,
            next_run,
            prompt: prompt.to_string(),
        };
        tasks.push(task.clone());
        self.store.save(&tasks).map_err(|e| e.to_string())?;
        Ok(task)
    }

    pub fn remove(&self, id: &str) -> Result<bool, String> {
        let mut tasks = self.store.load().map_err(|e| e.to_string())?;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        let removed = tasks.len() != before;
        if removed {
            self.store.save(&tasks).map_err(|e| e.to_string())?;
        }
        Ok(removed)
    }

    pub fn set_enabled(&self, id: &str, enabled: bool) -> Result<bool, String> {
        let mut tasks = self.store.load().map_err(|e| e.to_string())?;
        let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(false);
        };
        task.enabled = enabled;
        // Resuming a task whose next_run was never computed recomputes it.
        if enabled && task.next_run == 0 {
            if let Ok(parsed) = expr::parse_cron_expr(&task.schedule) {
                task.next_run = expr::next_run_after(&parsed, now_ts());
            }
        }
        self.store.save(&tasks).map_err(|e| e.to_string())?;
        Ok(true)
    }

    pub fn list(&self) -> Result<Vec<CronTask>, String> {
        self.store.load().map_err(|e| e.to_string())
    }

    /// Execute every enabled task whose `next_run` is due (`0` or `<= now`),
    /// updating `last_run`/`next_run` and persisting the whole store once.
    pub async fn run_due(
        &self,
        provider: &dyn Provider,
        registry: &ToolRegistry,
        tool_ctx: &ToolContext,
        model: &str,
    ) -> Result<Vec<(String, String)>, String> {
        let mut tasks = self.store.load().map_err(|e| e.to_string())?;
        let now = now_ts();
        let mut results = Vec::new();

        for task in tasks.iter_mut() {
            if !task.enabled {
                continue;
            }
            if task.next_run != 0 && task.next_run > now {
                continue;
            }

            let output = if task.prompt.is_empty() {
                runner::run_shell(&task.command).await
            } else {
                runner::run_prompt(provider, registry, tool_ctx, model, task, now).await
            };
            results.push((task.id.clone(), output));

            task.last_run = now;
            task.next_run = match expr::parse_cron_expr(&task.schedule) {
                Ok(parsed) => expr::next_run_after(&parsed, now),
                Err(_) => 0,
            };
        }

        self.store.save(&tasks).map_err(|e| e.to_string())?;
        Ok(results)
    }
}
