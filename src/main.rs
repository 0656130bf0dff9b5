use blobmutx::BlobmutxError;
use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() {
    // Initialize tracing (use RUST_LOG env var to control output)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();

    match cli::run(args).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            let exit_code = e
                .chain()
                .find_map(|cause| cause.downcast_ref::<BlobmutxError>())
                .map_or(1, BlobmutxError::exit_code);
            process::exit(exit_code);
        }
    }
}
