//! `docdeploy deploy`: create or update documents and sync sharing and tags.

use std::io;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use docdeploy_sync::pipeline;

use super::select::select_documents;
use super::{connect, load, BatchArgs, GlobalArgs};

/// Arguments for `docdeploy deploy`.
#[derive(Args, Debug)]
pub struct DeployArgs {
    #[command(flatten)]
    pub batch: BatchArgs,
}

impl DeployArgs {
    pub async fn run(self, global: &GlobalArgs) -> Result<()> {
        let options = self.batch.batch_options()?;
        let registry = connect(global).await?;

        let documents = load(global, &self.batch.paths)?;
        let documents = select_documents(
            documents,
            self.batch.all,
            &mut io::stdin().lock(),
            &mut io::stdout(),
        )?;

        let summary = pipeline::deploy(registry, documents, &options).await?;
        println!(
            "{} {} document(s) deployed",
            "✓".green(),
            summary.succeeded
        );
        Ok(())
    }
}
