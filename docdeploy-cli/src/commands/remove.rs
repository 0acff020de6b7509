//! `docdeploy remove`: unshare and delete documents.

use std::io;

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;

use docdeploy_sync::pipeline;

use super::select::{confirm, select_documents};
use super::{connect, load, BatchArgs, GlobalArgs};

/// Arguments for `docdeploy remove`.
#[derive(Args, Debug)]
pub struct RemoveArgs {
    #[command(flatten)]
    pub batch: BatchArgs,
}

impl RemoveArgs {
    pub async fn run(self, global: &GlobalArgs) -> Result<()> {
        let options = self.batch.batch_options()?;
        let registry = connect(global).await?;

        let documents = load(global, &self.batch.paths)?;
        let mut stdin = io::stdin().lock();
        let mut stdout = io::stdout();
        let documents = select_documents(documents, self.batch.all, &mut stdin, &mut stdout)?;

        if !self.batch.yes {
            let message = format!(
                "Are you sure you want to remove {} documents?",
                documents.len()
            );
            if !confirm(&message, &mut stdin, &mut stdout)? {
                bail!("Not confirmed documents remove, skip operation");
            }
        }

        let summary = pipeline::remove(registry, documents, &options).await?;
        println!(
            "{} {} document(s) removed",
            "✓".green(),
            summary.succeeded
        );
        Ok(())
    }
}
