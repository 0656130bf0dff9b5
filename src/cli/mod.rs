mod args;
mod exec_command;
mod fs_command;
mod write_command;

use anyhow::{Context, Result};
pub use args::{Args, Command, LockArgs};
use blobmutx::queue::SqsBroker;
use blobmutx::store::{LocalFsStore, ObjectStore, S3Store};
use blobmutx::utils::parse_duration;
use blobmutx::{AcquireOptions, Config, DistributedLock, InstanceId, LockSettings, PollStrategy, VirtualFs};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Run the parsed command and return the process exit code.
pub async fn run(args: Args) -> Result<i32> {
    match &args.command {
        Command::Write {
            path,
            input,
            append,
            no_lock,
            lock,
        } => {
            write_command::execute_write(&args, path, input.as_deref(), *append, *no_lock, lock)
                .await?;
            Ok(0)
        }
        Command::Exec { lock, command } => exec_command::execute_exec(&args, lock, command).await,
        _ => {
            fs_command::execute_fs(&args).await?;
            Ok(0)
        }
    }
}

fn config(args: &Args) -> Result<Config> {
    Config::from_options(args.config_options()).context("Invalid configuration")
}

async fn open_fs(args: &Args) -> Result<VirtualFs> {
    let store: Arc<dyn ObjectStore> = match &args.store_dir {
        Some(dir) => Arc::new(LocalFsStore::new(dir)),
        None => Arc::new(S3Store::connect(&config(args)?).await),
    };
    Ok(VirtualFs::new(store))
}

async fn open_lock(args: &Args) -> Result<DistributedLock> {
    let config = config(args)?;
    let broker = SqsBroker::connect(&config).await;
    let instance_id = InstanceId::current().context("Failed to derive instance identity")?;

    DistributedLock::init(
        Arc::new(broker),
        instance_id,
        LockSettings::default().with_queue_name(config.queue_name.clone()),
    )
    .await
    .context("Failed to initialize lock queue")
}

/// Translate lock flags into acquire options; Ctrl-C cancels the wait.
fn acquire_options(lock: &LockArgs) -> Result<AcquireOptions> {
    let mut options = AcquireOptions::new().with_cancellation(interrupt_token());

    if let Some(timeout) = &lock.timeout {
        options = options.with_timeout(parse_duration(timeout)?);
    }
    if let Some(jitter) = &lock.jitter {
        let max_jitter = parse_duration(jitter)?;
        options = options.with_poll(PollStrategy::jittered(Duration::ZERO, max_jitter));
    }

    Ok(options)
}

fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => trigger.cancel(),
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });
    token
}
