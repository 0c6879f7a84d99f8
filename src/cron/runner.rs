//! Executing one due cron task (spec §4.G): shell tasks spawn `/bin/sh -c`
//! directly, prompt tasks run a full agent turn and store the transcript
//! under `cron/<id>/<ts>`.

use crate::agent::AgentLoop;
use crate::cron::task::CronTask;
use crate::providers::Provider;
use crate::tools::ToolContext;
use crate::tools::ToolRegistry;
use std::process::Stdio;

/// Run a shell task, returning stdout if non-empty, else stderr.
pub async fn run_shell(command: &str) -> String {
    let output = tokio::process::Command::new("/bin/sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .output()
        .await;

    match output {
        Ok(out) => {
            let stdout = String::from_utf8_lossy(&out.stdout).to_string();
            let stderr = String::from_utf8_lossy(&out.stderr).to_string();
            if stdout.is_empty() {
                stderr
            } else {
                stdout
            }
        }
        Err(e) => format!("cron: failed to spawn shell task: {e}"),
    }
}

/// Run a prompt task through one agent turn and persist the transcript
/// under `cron/<task_id>/<now_ts>`.
pub async fn run_prompt(
    provider: &dyn Provider,
    registry: &ToolRegistry,
    tool_ctx: &ToolContext,
    model: &str,
    task: &CronTask,
    now_ts: i64,
) -> String {
    let agent = AgentLoop::new(provider, registry, tool_ctx, model);
    let response = agent.run_once(&task.prompt).await;

    let header = format!(
        "# cron run\n\ntask: {}\nschedule: {}\nprompt: {}\n\n## response\n\n{}",
        task.id, task.schedule, task.prompt, response
    );
    let key = format!("cron/{}/{}", task.id, now_ts);
    let _ = tool_ctx.memory.store(&key, &header);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shell_task_returns_stdout() {
        let output = run_shell("echo hello").await;
        assert_eq!(output.trim(), "hello");
    }

    #[tokio::test]
    async fn shell_task_falls_back_to_stderr_when_stdout_empty() {
        let output = run_shell("echo oops 1>&2").await;
        assert_eq!(output.trim(), "oops");
    }
}
