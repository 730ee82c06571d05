//! Upload command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use ferry_core::UploadFile;
use ferry_core::types::DEFAULT_CONTENT_TYPE;

use crate::backend::CliFerry;
use crate::output;

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// File to upload
    pub file: PathBuf,

    /// Name to upload under (defaults to the file name)
    #[arg(long)]
    pub name: Option<String>,

    /// Declared content type
    #[arg(long, default_value = DEFAULT_CONTENT_TYPE)]
    pub content_type: String,
}

pub async fn run(args: UploadArgs, ferry: &CliFerry) -> Result<()> {
    let name = match args.name {
        Some(name) => name,
        None => args
            .file
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .context("Cannot derive a name from the file path; pass --name")?,
    };

    let bytes = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let size = bytes.len();

    let key = ferry
        .upload(UploadFile::new(name, args.content_type, bytes))
        .await
        .context("Failed to upload")?;

    output::success("Uploaded");
    println!();
    output::field("Key", key.as_str());
    output::field("Size", &size.to_string());

    Ok(())
}
