pub mod deploy;
pub mod remove;
pub mod select;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;

use docdeploy_client::{ClientConfig, HttpRegistry};
use docdeploy_core::loader::{search_paths, DEFAULT_CONFIG_FILE};
use docdeploy_core::{load_documents, ConfigParser, Document, LoadOptions};
use docdeploy_sync::batch::DEFAULT_PARALLELS;
use docdeploy_sync::{BatchOptions, DocumentRegistry};

/// Options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Named credentials profile (recorded only; requests are unsigned).
    #[arg(short, long, global = true, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// Registry region.
    #[arg(short, long, global = true, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Override the registry endpoint URL.
    #[arg(long, global = true, env = "SSM_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Account the documents are deployed to.
    #[arg(long, global = true, env = "AWS_ACCOUNT_ID")]
    pub account_id: Option<String>,

    /// Descriptor file name (or `*` glob) searched for in directories.
    #[arg(long, global = true, env = "SSM_DOCUMENT_CONFIG_FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config_file: String,

    /// Descriptor parser: yml, yaml or json.
    #[arg(long, global = true, env = "SSM_DOCUMENT_CONFIG_PARSER", default_value = "yml")]
    pub config_parser: String,
}

/// Options shared by `deploy` and `remove`.
#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Skip the confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,

    /// Select every loaded document without prompting.
    #[arg(short, long)]
    pub all: bool,

    /// Documents reconciled at once.
    #[arg(long, default_value_t = DEFAULT_PARALLELS)]
    pub parallels: usize,

    /// Descriptor files or directories (default: $SSM_DOCUMENT_PATH or `.`).
    pub paths: Vec<PathBuf>,
}

impl BatchArgs {
    pub fn batch_options(&self) -> Result<BatchOptions> {
        if self.parallels == 0 {
            bail!("--parallels must be a positive integer");
        }
        Ok(BatchOptions::default().with_parallels(self.parallels))
    }
}

/// Build the registry client and check that it has an identity to act as.
pub async fn connect(global: &GlobalArgs) -> Result<Arc<HttpRegistry>> {
    let registry = HttpRegistry::new(ClientConfig {
        endpoint: global.endpoint.clone(),
        region: global.region.clone(),
        account_id: global.account_id.clone(),
        profile: global.profile.clone(),
    })
    .context("failed to configure registry client")?;

    let account = registry
        .caller_account_id()
        .await
        .context("failed to resolve caller identity")?;
    match account {
        Some(id) => tracing::debug!(account = %id, endpoint = %registry.endpoint(), "caller identity"),
        None => bail!("No valid AWS credentials found"),
    }
    Ok(Arc::new(registry))
}

/// Load descriptors from the given paths using the global loader options.
pub fn load(global: &GlobalArgs, paths: &[PathBuf]) -> Result<Vec<Document>> {
    let parser: ConfigParser = global
        .config_parser
        .parse()
        .context("invalid --config-parser")?;
    let options = LoadOptions {
        config_file: global.config_file.clone(),
        parser,
    };
    let paths = search_paths(paths);
    load_documents(&paths, &options).context("failed to load document descriptors")
}
