use std::collections::HashMap;

use crate::graph::{NodeDef, TensorRecord};

pub(crate) const CONST_OP: &str = "Const";
pub(crate) const VALUE_ATTR: &str = "value";

/// Name -> node index for every `Const` node carrying a `value` tensor.
#[derive(Debug, Default)]
pub struct ConstantTable {
    indices: HashMap<String, usize>,
}

impl ConstantTable {
    pub fn get(&self, name: &str) -> Option<usize> {
        self.indices.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.indices.contains_key(name)
    }

    /// Tensor held by the named constant.
    pub fn tensor<'a>(&self, nodes: &'a [NodeDef], name: &str) -> Option<&'a TensorRecord> {
        let node = nodes.get(self.get(name)?)?;
        node.attr(VALUE_ATTR)?.as_tensor()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

pub fn build_constant_table(nodes: &[NodeDef]) -> ConstantTable {
    let indices = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.op == CONST_OP && node.has_attr(VALUE_ATTR))
        .map(|(index, node)| (node.name.clone(), index))
        .collect();
    ConstantTable { indices }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AttrValue, TensorRecord};

    fn constant(name: &str) -> NodeDef {
        NodeDef::new(name, "Const").with_attr(
            "value",
            AttrValue::Tensor(TensorRecord::from_f32(&[1], &[1.0])),
        )
    }

    #[test]
    fn indexes_only_valued_constants() {
        let nodes = vec![
            constant("w0"),
            NodeDef::new("x", "Placeholder"),
            NodeDef::new("empty", "Const"),
            constant("w1"),
        ];
        let table = build_constant_table(&nodes);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("w0"), Some(0));
        assert_eq!(table.get("w1"), Some(3));
        assert!(!table.contains("empty"));
        assert!(!table.contains("x"));
    }

    #[test]
    fn value_must_be_on_a_const_node() {
        let nodes = vec![NodeDef::new("id", "Identity").with_attr(
            "value",
            AttrValue::Tensor(TensorRecord::from_f32(&[1], &[1.0])),
        )];
        assert!(build_constant_table(&nodes).is_empty());
    }

    #[test]
    fn looks_up_tensor() {
        let nodes = vec![NodeDef::new("x", "Placeholder"), constant("w")];
        let table = build_constant_table(&nodes);
        let tensor = table.tensor(&nodes, "w").unwrap();
        assert_eq!(tensor.tensor_shape, Some(vec![1]));
        assert!(table.tensor(&nodes, "x").is_none());
    }
}
