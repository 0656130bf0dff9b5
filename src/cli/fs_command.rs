use super::{open_fs, Args, Command};
use anyhow::{bail, Context, Result};
use blobmutx::BatchOutcome;
use tokio::io::AsyncWriteExt;

pub async fn execute_fs(args: &Args) -> Result<()> {
    let fs = open_fs(args).await?;

    match &args.command {
        Command::Cat { path } => {
            let data = fs
                .read_file(path)
                .await
                .with_context(|| format!("Failed to read from {}", path))?;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&data).await?;
            stdout.flush().await?;
        }
        Command::Ls { path } => {
            for entry in fs.readdir(path).await? {
                println!("{}", entry);
            }
        }
        Command::Stat { path } => {
            let stat = fs.stat(path).await?;
            println!("{}", if stat.is_directory() { "directory" } else { "file" });
        }
        Command::Mv { from, to } => {
            let outcome = fs.rename(from, to).await?;
            report(args, "Moved", &outcome);
            outcome.into_result("rename")?;
        }
        Command::Rm { path } => {
            let outcome = fs.remove(path).await?;
            report(args, "Removed", &outcome);
            outcome.into_result("remove")?;
        }
        Command::Write { .. } | Command::Exec { .. } => {
            bail!("Internal error: expected a filesystem command")
        }
    }

    Ok(())
}

fn report(args: &Args, verb: &str, outcome: &BatchOutcome) {
    if args.verbose == 0 {
        return;
    }
    for key in &outcome.completed {
        eprintln!("{}: {}", verb, key);
    }
    for (key, err) in &outcome.failed {
        eprintln!("Failed: {} ({})", key, err);
    }
}
