use std::collections::HashMap;

use crate::error::ImportError;
use crate::graph::{GraphDef, NodeDef};
use crate::importer::Operator;
use crate::reference::parse_reference;

#[derive(Debug, Default)]
pub struct ValidationArtifacts {
    pub graph_inputs: Vec<String>,
    /// Producer name -> names of the nodes wired from it.
    pub node_to_consumers: HashMap<String, Vec<String>>,
}

/// Checks that every wired data input refers to a node declared earlier.
///
/// `Const` nodes never produce data edges, so referencing one from a data
/// input is unresolved. Unsupported operators count as producers so that the
/// check stops at them with `UnsupportedOperator`, not at a later consumer.
pub struct OrderValidator<'a> {
    graph: &'a GraphDef,
    producers: HashMap<&'a str, usize>,
    graph_inputs: Vec<String>,
    consumers: HashMap<String, Vec<String>>,
}

impl<'a> OrderValidator<'a> {
    pub fn new(graph: &'a GraphDef) -> Self {
        let producers = graph
            .node
            .iter()
            .enumerate()
            .filter(|(_, node)| Operator::from_op(&node.op) != Operator::Const)
            .map(|(index, node)| (node.name.as_str(), index))
            .collect();
        Self {
            graph,
            producers,
            graph_inputs: Vec::new(),
            consumers: HashMap::new(),
        }
    }

    pub fn validate(mut self) -> Result<ValidationArtifacts, ImportError> {
        for (index, node) in self.graph.node.iter().enumerate() {
            self.check(index, node)?;
        }
        Ok(self.finish())
    }

    /// Check the node at `index`. Nodes are expected in list order; the
    /// importer interleaves this with translation so the first failing node
    /// is the one reported.
    pub fn check(&mut self, index: usize, node: &NodeDef) -> Result<(), ImportError> {
        let operator = Operator::from_op(&node.op);
        match &operator {
            Operator::Placeholder => self.graph_inputs.push(node.name.clone()),
            Operator::Unrecognized(op) => {
                return Err(ImportError::UnsupportedOperator {
                    node: node.name.clone(),
                    op: op.clone(),
                });
            }
            _ => {}
        }

        for text in operator.data_inputs(node)? {
            let reference = parse_reference(text).map_err(|err| err.in_node(&node.name))?;
            match self.producers.get(reference.name.as_str()) {
                Some(&producer) if producer < index => {}
                Some(_) => {
                    return Err(ImportError::OutOfOrderReference {
                        node: node.name.clone(),
                        name: reference.name,
                    });
                }
                None => {
                    return Err(ImportError::UnresolvedReference {
                        node: node.name.clone(),
                        name: reference.name,
                    });
                }
            }
            self.consumers
                .entry(reference.name)
                .or_default()
                .push(node.name.clone());
        }
        Ok(())
    }

    pub fn finish(self) -> ValidationArtifacts {
        ValidationArtifacts {
            graph_inputs: self.graph_inputs,
            node_to_consumers: self.consumers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AttrValue, TensorRecord};

    #[test]
    fn accepts_topological_order() {
        let graph = GraphDef::new(vec![
            NodeDef::new("x", "Placeholder"),
            NodeDef::new("a", "Relu").with_inputs(["x"]),
            NodeDef::new("b", "Identity").with_inputs(["x"]),
            NodeDef::new("cat", "Concat").with_inputs(["axis", "a", "b"]),
        ]);
        let artifacts = OrderValidator::new(&graph).validate().unwrap();
        assert_eq!(artifacts.graph_inputs, vec!["x".to_string()]);
        assert_eq!(
            artifacts.node_to_consumers["x"],
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(!artifacts.node_to_consumers.contains_key("axis"));
    }

    #[test]
    fn rejects_forward_reference() {
        let graph = GraphDef::new(vec![
            NodeDef::new("x", "Placeholder"),
            NodeDef::new("a", "Relu").with_inputs(["b:0"]),
            NodeDef::new("b", "Relu").with_inputs(["x"]),
        ]);
        assert!(matches!(
            OrderValidator::new(&graph).validate(),
            Err(ImportError::OutOfOrderReference { node, name }) if node == "a" && name == "b"
        ));
    }

    #[test]
    fn self_reference_is_out_of_order() {
        let graph = GraphDef::new(vec![NodeDef::new("a", "Relu").with_inputs(["a"])]);
        assert!(matches!(
            OrderValidator::new(&graph).validate(),
            Err(ImportError::OutOfOrderReference { .. })
        ));
    }

    #[test]
    fn constants_are_not_data_producers() {
        let graph = GraphDef::new(vec![
            NodeDef::new("c", "Const").with_attr(
                "value",
                AttrValue::Tensor(TensorRecord::from_f32(&[1], &[1.0])),
            ),
            NodeDef::new("a", "Identity").with_inputs(["c"]),
        ]);
        assert!(matches!(
            OrderValidator::new(&graph).validate(),
            Err(ImportError::UnresolvedReference { node, name }) if node == "a" && name == "c"
        ));
    }

    #[test]
    fn weighted_ops_only_check_data_input() {
        let graph = GraphDef::new(vec![
            NodeDef::new("x", "Placeholder"),
            NodeDef::new("fc", "MatMul").with_inputs(["x", "w"]),
            NodeDef::new("w", "Const"),
        ]);
        assert!(OrderValidator::new(&graph).validate().is_ok());
    }

    #[test]
    fn stops_at_unsupported_operator() {
        let graph = GraphDef::new(vec![
            NodeDef::new("x", "Placeholder"),
            NodeDef::new("fancy", "FancyOp").with_inputs(["x"]),
            NodeDef::new("r", "Relu").with_inputs(["ghost"]),
        ]);
        assert!(matches!(
            OrderValidator::new(&graph).validate(),
            Err(ImportError::UnsupportedOperator { node, op }) if node == "fancy" && op == "FancyOp"
        ));
    }
}
