//! Operations proposed by a tool call, before they are approved or run.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A host operation a tool wants to perform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProposedOperation {
    /// Create or overwrite a file.
    WriteFile {
        /// Target path.
        path: String,
        /// Content to write.
        content: String,
        /// Current content, when the caller already knows it.
        #[serde(default, alias = "oldContent")]
        old_content: Option<String>,
    },
    /// Run a shell command.
    ExecuteCommand {
        /// Command line.
        #[serde(alias = "cmd")]
        command: String,
        /// Directory to run in.
        #[serde(default, alias = "workingDir")]
        working_dir: Option<String>,
    },
    /// Delete a file.
    DeleteFile {
        /// Target path.
        path: String,
    },
    /// Any tool kind without a dedicated shape.
    Other {
        /// The tool kind as given by the caller.
        kind: String,
        /// Raw parameters.
        params: Value,
    },
}

#[derive(Deserialize)]
struct WriteFileParams {
    path: String,
    content: String,
    #[serde(default, alias = "oldContent")]
    old_content: Option<String>,
}

#[derive(Deserialize)]
struct ExecuteCommandParams {
    #[serde(alias = "cmd")]
    command: String,
    #[serde(default, alias = "workingDir")]
    working_dir: Option<String>,
}

#[derive(Deserialize)]
struct DeleteFileParams {
    path: String,
}

fn parse<T: DeserializeOwned>(params: &Value) -> Option<T> {
    serde_json::from_value(params.clone()).ok()
}

impl ProposedOperation {
    /// Build an operation from a tool kind and its JSON parameters.
    ///
    /// Known kinds (`write_file`, `execute_command`, `delete_file`) whose
    /// parameters fit the expected shape get their dedicated variant.
    /// Everything else becomes [`ProposedOperation::Other`].
    #[must_use]
    pub fn from_tool_call(kind: &str, params: Value) -> Self {
        let parsed = match kind {
            "write_file" => parse::<WriteFileParams>(&params).map(|p| Self::WriteFile {
                path: p.path,
                content: p.content,
                old_content: p.old_content,
            }),
            "execute_command" => {
                parse::<ExecuteCommandParams>(&params).map(|p| Self::ExecuteCommand {
                    command: p.command,
                    working_dir: p.working_dir,
                })
            },
            "delete_file" => {
                parse::<DeleteFileParams>(&params).map(|p| Self::DeleteFile { path: p.path })
            },
            _ => None,
        };
        parsed.unwrap_or_else(|| Self::Other {
            kind: kind.to_string(),
            params,
        })
    }

    /// The tool kind this operation corresponds to.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::WriteFile { .. } => "write_file",
            Self::ExecuteCommand { .. } => "execute_command",
            Self::DeleteFile { .. } => "delete_file",
            Self::Other { kind, .. } => kind,
        }
    }

    /// Short single-line description, used in logs and listings.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::WriteFile { path, .. } => format!("write {path}"),
            Self::ExecuteCommand { command, .. } => format!("run `{command}`"),
            Self::DeleteFile { path } => format!("delete {path}"),
            Self::Other { kind, .. } => kind.clone(),
        }
    }
}
