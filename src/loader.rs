use std::fs;
use std::path::Path;

use crate::error::ImportError;
use crate::graph::GraphDef;

/// Load a pre-decoded graph document.
///
/// The document is the JSON form of a `GraphDef`: a `node` list whose
/// attributes are tagged by kind (`i`, `s`, `b`, `type`, `list`, `tensor`)
/// and whose tensor payloads are base64 encoded.
pub fn load_graph_from_path(path: impl AsRef<Path>) -> Result<GraphDef, ImportError> {
    let path_ref = path.as_ref();
    match path_ref.extension().and_then(|ext| ext.to_str()) {
        Some("json") => {}
        _ => {
            return Err(ImportError::UnsupportedFormat {
                path: path_ref.to_path_buf(),
            });
        }
    }

    let contents = fs::read_to_string(path_ref).map_err(|err| ImportError::io(path_ref, err))?;
    Ok(serde_json::from_str(&contents)?)
}
