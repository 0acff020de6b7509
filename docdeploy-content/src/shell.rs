//! Shell script wrapper: turns a script file into a one-step command document.

use serde::Serialize;

use docdeploy_core::{Content, Document, MainStep};

use crate::error::ContentError;

/// Schema version of generated shell documents.
pub const SHELL_SCHEMA_VERSION: &str = "2.2";

/// Action invoked by the generated step.
pub const SHELL_ACTION: &str = "aws:runShellScript";

/// Name of the generated step.
pub const SHELL_STEP_NAME: &str = "RunShellScript";

/// Host line ending used to split scripts into command lines.
#[cfg(windows)]
pub const EOL: &str = "\r\n";
#[cfg(not(windows))]
pub const EOL: &str = "\n";

/// Inputs of the generated `aws:runShellScript` step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellInputs {
    pub working_directory: String,
    pub run_command: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<String>,
}

/// Split a script into command lines on [`EOL`].
///
/// The split is literal: a trailing line ending yields a final empty command.
pub fn split_commands(script: &str) -> Vec<String> {
    script.split(EOL).map(str::to_string).collect()
}

/// Wrap `script` into structured content using `document`'s description,
/// parameters, working directory and timeout.
pub fn wrap_script(document: &Document, script: &str) -> Result<Content, ContentError> {
    let inputs = ShellInputs {
        working_directory: document.working_directory.clone(),
        run_command: split_commands(script),
        timeout_seconds: document.timeout_seconds.clone(),
    };

    Ok(Content {
        schema_version: SHELL_SCHEMA_VERSION.to_string(),
        description: document.description.clone(),
        parameters: document.parameters.clone(),
        main_steps: vec![MainStep {
            action: SHELL_ACTION.to_string(),
            name: SHELL_STEP_NAME.to_string(),
            inputs: Some(serde_json::to_value(inputs)?),
        }],
        extra: Default::default(),
    })
}
