use super::{acquire_options, open_lock, Args, LockArgs};
use anyhow::{Context, Result};
use tokio::process::Command;

/// Run `command` inside the critical section and return its exit code.
pub async fn execute_exec(args: &Args, lock: &LockArgs, command: &[String]) -> Result<i32> {
    let (program, rest) = command.split_first().context("No command given")?;

    let options = acquire_options(lock)?;
    let distributed_lock = open_lock(args).await?;

    let status = distributed_lock
        .with_lock(options, move || async move {
            if args.verbose > 0 {
                eprintln!("Lock acquired, running: {}", command.join(" "));
            }
            Command::new(program).args(rest).status().await
        })
        .await
        .context("Failed to hold lock")?
        .with_context(|| format!("Failed to run {}", program))?;

    // A child killed by a signal has no exit code
    Ok(status.code().unwrap_or(1))
}
