//! Debug logging for the importer
//!
//! Output is gated by the TF_IMPORT_DEBUG environment variable
//! (`1` or `true`) and goes to stderr.

use std::env;
use std::fmt::Write;
use std::sync::OnceLock;

use crate::graph::{AttrValue, NodeDef};

static DEBUG_ENABLED: OnceLock<bool> = OnceLock::new();

#[inline]
pub fn debug_enabled() -> bool {
    *DEBUG_ENABLED.get_or_init(|| {
        env::var("TF_IMPORT_DEBUG")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}

/// `eprintln!` that only fires when TF_IMPORT_DEBUG is enabled.
#[macro_export]
macro_rules! debug_print {
    ($($arg:tt)*) => {
        if $crate::debug::debug_enabled() {
            eprintln!($($arg)*);
        }
    };
}

/// One-line summary of a node: `name:Op(in0, in1) key=value ...`.
///
/// Tensor attributes are shown by dtype and shape only.
pub fn summarize_node(node: &NodeDef) -> String {
    let mut out = format!("{}:{}({})", node.name, node.op, node.input.join(", "));
    for (key, value) in &node.attr {
        let _ = match value {
            AttrValue::I(v) => write!(out, " {}={}", key, v),
            AttrValue::S(v) => write!(out, " {}={:?}", key, v),
            AttrValue::B(v) => write!(out, " {}={}", key, v),
            AttrValue::Type(v) => write!(out, " {}={:?}", key, v),
            AttrValue::List(list) => write!(out, " {}={:?}", key, list.i),
            AttrValue::Tensor(tensor) => write!(
                out,
                " {}=<{:?} {:?}>",
                key, tensor.dtype, tensor.tensor_shape
            ),
        };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::summarize_node;
    use crate::graph::{AttrValue, NodeDef, TensorRecord};

    #[test]
    fn summarizes_inputs_and_attributes() {
        let node = NodeDef::new("pool", "MaxPool")
            .with_inputs(["conv:0"])
            .with_attr("ksize", AttrValue::ints(&[1, 2, 2, 1]))
            .with_attr("padding", AttrValue::S("SAME".to_string()));
        assert_eq!(
            summarize_node(&node),
            "pool:MaxPool(conv:0) ksize=[1, 2, 2, 1] padding=\"SAME\""
        );
    }

    #[test]
    fn tensors_are_not_dumped() {
        let node = NodeDef::new("w", "Const").with_attr(
            "value",
            AttrValue::Tensor(TensorRecord::from_f32(&[2], &[1.0, 2.0])),
        );
        assert_eq!(summarize_node(&node), "w:Const() value=<Float Some([2])>");
    }
}
