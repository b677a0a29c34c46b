use std::path::PathBuf;

use crate::graph::DataType;
use serde_json::Error as JsonError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("graph file {path} could not be read: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("graph JSON could not be parsed: {source}")]
    Parse {
        #[from]
        source: JsonError,
    },
    #[error("unsupported graph document `{path}`: expected a .json file")]
    UnsupportedFormat { path: PathBuf },
    #[error("graph could not be exported to {path}: {source}")]
    ExportIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("node `{node}`: tensor has no shape")]
    MissingShape { node: String },
    #[error("node `{node}`: invalid tensor shape {shape:?}")]
    InvalidShape { node: String, shape: Vec<i64> },
    #[error("node `{node}`: expected {expected:?} tensor, got {actual:?}")]
    TypeMismatch {
        node: String,
        expected: DataType,
        actual: DataType,
    },
    #[error("node `{node}`: tensor payload is {actual} bytes, shape requires {expected}")]
    SizeMismatch {
        node: String,
        expected: usize,
        actual: usize,
    },
    #[error("node `{node}`: kernel tensor must be 4-D, got shape {shape:?}")]
    InvalidKernelRank { node: String, shape: Vec<usize> },
    #[error("node `{node}`: shape descriptor tensor must be 1-D, got shape {shape:?}")]
    InvalidDimsRank { node: String, shape: Vec<usize> },
    #[error("node `{node}`: tensor exceeds byte limit ({byte_length} > {limit})")]
    TensorLimit {
        node: String,
        byte_length: usize,
        limit: usize,
    },

    #[error("node `{node}`: missing attribute `{attribute}`")]
    MissingAttribute { node: String, attribute: String },
    #[error("node `{node}`: invalid spatial parameter `{param}` = {value}")]
    InvalidSpatialParam {
        node: String,
        param: &'static str,
        value: i64,
    },
    #[error("node `{node}`: unsupported padding mode {mode:?}")]
    UnsupportedPaddingMode { node: String, mode: String },
    #[error("node `{node}`: unsupported strides {strides:?}")]
    UnsupportedStrideShape { node: String, strides: Vec<i64> },
    #[error("node `{node}`: unsupported ksize {ksize:?}")]
    UnsupportedKernelShape { node: String, ksize: Vec<i64> },

    #[error("node `{node}`: missing input #{index}")]
    MissingInput { node: String, index: usize },
    #[error("node `{node}`: malformed input reference `{reference}`")]
    InvalidReference { node: String, reference: String },
    #[error("node `{node}`: input layer not found: `{name}`")]
    UnresolvedReference { node: String, name: String },
    #[error("node `{node}` consumes `{name}` before it is produced")]
    OutOfOrderReference { node: String, name: String },
    #[error("node `{node}`: constant input `{name}` not found")]
    ConstantNotFound { node: String, name: String },
    #[error("node `{node}`: constant input `{name}` uses port {port}, only port 0 is supported")]
    UnsupportedMultiOutputConst {
        node: String,
        name: String,
        port: u32,
    },
    #[error("node `{node}`: unsupported operator `{op}`")]
    UnsupportedOperator { node: String, op: String },
    #[error("layer id {id} does not exist in the destination net")]
    UnknownLayer { id: u32 },
}

impl ImportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ImportError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn export(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ImportError::ExportIo {
            path: path.into(),
            source,
        }
    }

    /// Name of the source node the error is attributed to, if any.
    pub fn node(&self) -> Option<&str> {
        match self {
            ImportError::MissingShape { node }
            | ImportError::InvalidShape { node, .. }
            | ImportError::TypeMismatch { node, .. }
            | ImportError::SizeMismatch { node, .. }
            | ImportError::InvalidKernelRank { node, .. }
            | ImportError::InvalidDimsRank { node, .. }
            | ImportError::TensorLimit { node, .. }
            | ImportError::MissingAttribute { node, .. }
            | ImportError::InvalidSpatialParam { node, .. }
            | ImportError::UnsupportedPaddingMode { node, .. }
            | ImportError::UnsupportedStrideShape { node, .. }
            | ImportError::UnsupportedKernelShape { node, .. }
            | ImportError::MissingInput { node, .. }
            | ImportError::InvalidReference { node, .. }
            | ImportError::UnresolvedReference { node, .. }
            | ImportError::OutOfOrderReference { node, .. }
            | ImportError::ConstantNotFound { node, .. }
            | ImportError::UnsupportedMultiOutputConst { node, .. }
            | ImportError::UnsupportedOperator { node, .. } => Some(node.as_str()),
            _ => None,
        }
    }

    /// Attributes a node-scoped error to `name`.
    ///
    /// Leaf helpers (tensor decoding, spatial resolution) raise errors with an
    /// empty node name; the translator stamps the node it was working on.
    pub(crate) fn in_node(mut self, name: &str) -> Self {
        match &mut self {
            ImportError::MissingShape { node }
            | ImportError::InvalidShape { node, .. }
            | ImportError::TypeMismatch { node, .. }
            | ImportError::SizeMismatch { node, .. }
            | ImportError::InvalidKernelRank { node, .. }
            | ImportError::InvalidDimsRank { node, .. }
            | ImportError::TensorLimit { node, .. }
            | ImportError::MissingAttribute { node, .. }
            | ImportError::InvalidSpatialParam { node, .. }
            | ImportError::UnsupportedPaddingMode { node, .. }
            | ImportError::UnsupportedStrideShape { node, .. }
            | ImportError::UnsupportedKernelShape { node, .. }
            | ImportError::MissingInput { node, .. }
            | ImportError::InvalidReference { node, .. }
            | ImportError::UnresolvedReference { node, .. }
            | ImportError::OutOfOrderReference { node, .. }
            | ImportError::ConstantNotFound { node, .. }
            | ImportError::UnsupportedMultiOutputConst { node, .. }
            | ImportError::UnsupportedOperator { node, .. } => {
                if node.is_empty() {
                    *node = name.to_string();
                }
            }
            _ => {}
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::ImportError;

    #[test]
    fn in_node_fills_only_empty_names() {
        let err = ImportError::MissingShape {
            node: String::new(),
        }
        .in_node("conv1");
        assert_eq!(err.node(), Some("conv1"));

        let err = ImportError::UnresolvedReference {
            node: "relu".to_string(),
            name: "x".to_string(),
        }
        .in_node("other");
        assert_eq!(err.node(), Some("relu"));
    }

    #[test]
    fn padding_mode_errors_are_attributed() {
        let err = ImportError::UnsupportedPaddingMode {
            node: String::new(),
            mode: "REFLECT".to_string(),
        }
        .in_node("pool1");
        assert_eq!(err.node(), Some("pool1"));
        assert_eq!(err.to_string(), "node `pool1`: unsupported padding mode \"REFLECT\"");
    }

    #[test]
    fn io_errors_have_no_node() {
        let err = ImportError::UnknownLayer { id: 3 };
        assert_eq!(err.node(), None);
        assert_eq!(err.to_string(), "layer id 3 does not exist in the destination net");
    }
}
