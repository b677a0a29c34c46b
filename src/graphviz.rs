use std::fmt::Write;

use crate::net::{LayerId, Net};

pub fn net_to_dot(net: &Net) -> String {
    let mut dot = String::from("digraph net {\n");
    dot.push_str("  rankdir=LR;\n");
    dot.push_str("  node [fontname=\"Helvetica\"];\n");
    dot.push_str("  edge [fontname=\"Helvetica\"];\n\n");

    let mut input_lines = vec!["inputs".to_string()];
    input_lines.extend(net.inputs().iter().cloned());
    let _ = writeln!(
        dot,
        "  {} [shape=oval,style=filled,fillcolor=\"#d0e6ff\",label=\"{}\"];",
        node_id(LayerId::INPUT),
        escape_label(&input_lines.join("\n"))
    );

    for layer in net.layers() {
        let mut label_lines = vec![format!("{} (#{})", layer.kind, layer.id), layer.name.clone()];
        for blob in &layer.params.blobs {
            label_lines.push(format_shape(&blob.shape));
        }
        let _ = writeln!(
            dot,
            "  {} [shape=box,style=rounded,label=\"{}\"];",
            node_id(layer.id),
            escape_label(&label_lines.join("\n"))
        );
    }

    dot.push('\n');

    for edge in net.edges() {
        let _ = writeln!(
            dot,
            "  {} -> {} [label=\"{}:{}\"];",
            node_id(edge.src),
            node_id(edge.dst),
            edge.src_port,
            edge.dst_port
        );
    }

    dot.push_str("}\n");
    dot
}

fn node_id(id: LayerId) -> String {
    if id == LayerId::INPUT {
        "input".to_string()
    } else {
        format!("layer_{}", id)
    }
}

fn escape_label(label: &str) -> String {
    label
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

fn format_shape(shape: &[usize]) -> String {
    if shape.is_empty() {
        "scalar".to_string()
    } else {
        shape
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("x")
    }
}

#[cfg(test)]
mod tests {
    use super::net_to_dot;
    use crate::net::{LayerKind, LayerParams, Net, NetBuilder};
    use crate::tensor::Blob;

    #[test]
    fn exports_graphviz_with_layers_and_edges() {
        let mut net = Net::new();
        net.declare_graph_inputs(vec!["data".to_string()]);
        let mut params = LayerParams::new();
        params.blobs.push(Blob::new(vec![16, 3, 3, 3], vec![0.0; 432]));
        let conv = net
            .add_layer("conv1", LayerKind::Convolution, params)
            .unwrap();
        let relu = net
            .add_layer("relu1", LayerKind::Relu, LayerParams::new())
            .unwrap();
        net.connect(crate::net::LayerId::INPUT, 0, conv, 0).unwrap();
        net.connect(conv, 0, relu, 0).unwrap();

        let dot = net_to_dot(&net);

        assert!(dot.contains("input [shape=oval"));
        assert!(dot.contains("inputs\\ndata"));
        assert!(dot.contains("layer_1 [shape=box"));
        assert!(dot.contains("Convolution (#1)\\nconv1\\n16x3x3x3"));
        assert!(dot.contains("input -> layer_1 [label=\"0:0\"]"));
        assert!(dot.contains("layer_1 -> layer_2 [label=\"0:0\"]"));
        assert!(dot.contains("ReLU (#2)"));
    }
}
