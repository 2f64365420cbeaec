//! Capabilities a session attaches to the remote agent it creates.

use std::path::PathBuf;

/// A remote tool the hosted model may invoke during a run.
///
/// Behaviour is entirely delegated to the service; the session only turns
/// each capability into a tool definition (plus resources) at start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCapability {
    /// Sandboxed code execution.
    CodeInterpreter,
    /// Search over local files, uploaded into a vector store the session owns.
    FileSearch { files: Vec<PathBuf>, store_name: String },
    /// Search over vector stores that already exist; never deleted by the session.
    ExistingVectorStores { vector_store_ids: Vec<String> },
    /// Web search through a project connection. `None` uses the configured
    /// search connection name.
    WebSearch { connection_name: Option<String> },
}

impl ToolCapability {
    pub fn code_interpreter() -> Self {
        Self::CodeInterpreter
    }

    pub fn file_search<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::FileSearch {
            files: files.into_iter().map(Into::into).collect(),
            store_name: "sample_vector_store".to_string(),
        }
    }

    pub fn vector_stores<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::ExistingVectorStores {
            vector_store_ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn web_search() -> Self {
        Self::WebSearch {
            connection_name: None,
        }
    }

    pub fn web_search_via(connection_name: impl Into<String>) -> Self {
        Self::WebSearch {
            connection_name: Some(connection_name.into()),
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CodeInterpreter => "code_interpreter",
            Self::FileSearch { .. } | Self::ExistingVectorStores { .. } => "file_search",
            Self::WebSearch { .. } => "web_search",
        }
    }
}
