use super::{acquire_options, open_fs, open_lock, Args, LockArgs};
use anyhow::{Context, Result};
use std::path::Path;
use tokio::io::AsyncReadExt;

pub async fn execute_write(
    args: &Args,
    path: &str,
    input: Option<&Path>,
    append: bool,
    no_lock: bool,
    lock: &LockArgs,
) -> Result<()> {
    // Read input before taking the lock so the critical section stays short
    let data = match input {
        Some(file) => tokio::fs::read(file)
            .await
            .with_context(|| format!("Failed to open input file: {}", file.display()))?,
        None => {
            let mut buffer = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut buffer)
                .await
                .context("Failed to read stdin")?;
            buffer
        }
    };

    let fs = open_fs(args).await?;

    if no_lock {
        return store(&fs, path, &data, append).await;
    }

    let options = acquire_options(lock)?;
    let distributed_lock = open_lock(args).await?;
    let handle = distributed_lock
        .acquire_with(options)
        .await
        .context("Failed to acquire lock")?;

    if args.verbose > 0 {
        eprintln!("Lock acquired: {}", handle.lock_id());
    }

    let written = store(&fs, path, &data, append).await;
    distributed_lock
        .release(handle)
        .await
        .context("Failed to release lock")?;
    written?;

    if args.verbose > 0 {
        eprintln!("Write completed: {}", path);
    }

    Ok(())
}

async fn store(fs: &blobmutx::VirtualFs, path: &str, data: &[u8], append: bool) -> Result<()> {
    let result = if append {
        fs.append_file(path, data).await
    } else {
        fs.write_file(path, data).await
    };
    result.with_context(|| format!("Failed to write to {}", path))
}
