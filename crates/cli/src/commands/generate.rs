//! Script Generation Command

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use crate::client::ApiClient;
use crate::output::print_success;

#[derive(Args)]
pub struct GenerateArgs {
    /// Test case ID
    #[arg(long)]
    case: i64,

    /// Write the script to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn execute(args: GenerateArgs, client: &ApiClient) -> Result<()> {
    let code = client.generate_script(args.case).await?;

    match args.output {
        Some(path) => {
            write_artifact(&path, &code)?;
            print_success(&format!("Script written to {}", path.display()));
        }
        None => print!("{}", code),
    }

    Ok(())
}

/// Write the script, creating parent directories as needed.
fn write_artifact(path: &Path, code: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, code)?;
    Ok(())
}
