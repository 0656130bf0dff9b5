use blobmutx::ConfigOptions;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "blobmutx",
    version,
    about = "Object-store filesystem with cross-process locking through a FIFO queue",
    long_about = None
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// AWS access key id
    #[arg(long, env = "BLOBMUTX_ACCESS_KEY_ID", global = true, hide_env_values = true)]
    pub access_key_id: Option<String>,

    /// AWS secret access key
    #[arg(long, env = "BLOBMUTX_SECRET_ACCESS_KEY", global = true, hide_env_values = true)]
    pub secret_access_key: Option<String>,

    /// AWS region [default: eu-west-1]
    #[arg(long, env = "BLOBMUTX_REGION", global = true)]
    pub region: Option<String>,

    /// Bucket holding the filesystem [default: jsrtest]
    #[arg(long, env = "BLOBMUTX_BUCKET", global = true)]
    pub bucket: Option<String>,

    /// FIFO queue used for lock arbitration [default: test.fifo]
    #[arg(long, env = "BLOBMUTX_QUEUE", global = true)]
    pub queue: Option<String>,

    /// Serve filesystem commands from a local directory instead of the bucket
    #[arg(long, value_name = "DIR", global = true)]
    pub store_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

impl Args {
    pub fn config_options(&self) -> ConfigOptions {
        ConfigOptions {
            access_key_id: self.access_key_id.clone(),
            secret_access_key: self.secret_access_key.clone(),
            region: self.region.clone(),
            bucket: self.bucket.clone(),
            queue_name: self.queue.clone(),
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct LockArgs {
    /// Give up waiting for the lock after DURATION (e.g. "30s", "5m")
    #[arg(short = 't', long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Sleep up to DURATION between polls instead of polling continuously
    #[arg(long, value_name = "DURATION")]
    pub jitter: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write stdin (or --input) to PATH while holding the lock
    Write {
        #[arg(value_name = "PATH")]
        path: String,

        /// Read from file instead of stdin
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Append to the existing content
        #[arg(short, long)]
        append: bool,

        /// Write without taking the lock
        #[arg(long, conflicts_with_all = ["timeout", "jitter"])]
        no_lock: bool,

        #[command(flatten)]
        lock: LockArgs,
    },

    /// Print a file to stdout
    Cat {
        #[arg(value_name = "PATH")]
        path: String,
    },

    /// List the entries of a directory
    Ls {
        #[arg(value_name = "PATH", default_value = "/")]
        path: String,
    },

    /// Report whether PATH is a file or a directory
    Stat {
        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Move every object under FROM to TO
    Mv {
        #[arg(value_name = "FROM")]
        from: String,

        #[arg(value_name = "TO")]
        to: String,
    },

    /// Delete every object under PATH
    Rm {
        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Run a command while holding the lock
    Exec {
        #[command(flatten)]
        lock: LockArgs,

        #[arg(value_name = "COMMAND", required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}
