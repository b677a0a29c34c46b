//! Node graph -> layer graph translation
//!
//! Nodes must be supplied in a topologically valid order: every data input a
//! node wires must name a node that appears earlier in the list. `Const`
//! nodes are exempt because they are indexed before translation starts.
//! With [`ImportOptions::verify_order`] each node first goes through
//! [`OrderValidator`] so violations surface as `OutOfOrderReference`.

use crate::constants::{ConstantTable, build_constant_table};
use crate::debug::summarize_node;
use crate::debug_print;
use crate::error::ImportError;
use crate::graph::{GraphDef, NodeDef, TensorRecord};
use crate::net::{LayerId, LayerKind, LayerParams, Net, NetBuilder};
use crate::reference::{Symbol, SymbolTable, parse_reference};
use crate::spatial::{apply_ksize, apply_padding, apply_strides, resolve_kernel_params};
use crate::tensor::{decode_activation_tensor, decode_dims_tensor, decode_kernel_tensor};
use crate::validator::{OrderValidator, ValidationArtifacts};

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Check node ordering while translating.
    pub verify_order: bool,
    pub tensor_byte_length_limit: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            verify_order: true,
            tensor_byte_length_limit: 256 * 1024 * 1024,
        }
    }
}

/// Supported source operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    Conv2D,
    BiasAdd,
    MatMul,
    Reshape,
    Const,
    Softmax,
    Lrn,
    Relu,
    Identity,
    MaxPool,
    AvgPool,
    Concat,
    Placeholder,
    Unrecognized(String),
}

/// Which of a node's inputs become data edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wiring {
    /// No edges.
    None,
    /// `input[0]` only; `input[1]` is a constant operand.
    First,
    /// Every input, in order.
    All,
    /// `input[1..]`; `input[0]` is a meta parameter.
    SkipFirst,
}

impl Operator {
    pub fn from_op(op: &str) -> Self {
        match op {
            "Conv2D" => Operator::Conv2D,
            "BiasAdd" => Operator::BiasAdd,
            "MatMul" => Operator::MatMul,
            "Reshape" => Operator::Reshape,
            "Const" => Operator::Const,
            "Softmax" => Operator::Softmax,
            "LRN" => Operator::Lrn,
            "Relu" => Operator::Relu,
            "Identity" => Operator::Identity,
            "MaxPool" => Operator::MaxPool,
            "AvgPool" => Operator::AvgPool,
            "Concat" => Operator::Concat,
            "Placeholder" => Operator::Placeholder,
            other => Operator::Unrecognized(other.to_string()),
        }
    }

    /// Destination layer kind, or `None` for operators that create no layer.
    pub fn layer_kind(&self) -> Option<LayerKind> {
        match self {
            Operator::Conv2D => Some(LayerKind::Convolution),
            Operator::BiasAdd => Some(LayerKind::Shift),
            Operator::MatMul => Some(LayerKind::InnerProduct),
            Operator::Reshape => Some(LayerKind::Reshape),
            Operator::Softmax => Some(LayerKind::Softmax),
            Operator::Lrn => Some(LayerKind::Lrn),
            Operator::Relu => Some(LayerKind::Relu),
            Operator::Identity => Some(LayerKind::Identity),
            Operator::MaxPool | Operator::AvgPool => Some(LayerKind::Pooling),
            Operator::Concat => Some(LayerKind::Concat),
            Operator::Const | Operator::Placeholder | Operator::Unrecognized(_) => None,
        }
    }

    pub fn wiring(&self) -> Wiring {
        match self {
            Operator::Conv2D | Operator::BiasAdd | Operator::MatMul | Operator::Reshape => {
                Wiring::First
            }
            Operator::Softmax
            | Operator::Lrn
            | Operator::Relu
            | Operator::Identity
            | Operator::MaxPool
            | Operator::AvgPool => Wiring::All,
            Operator::Concat => Wiring::SkipFirst,
            Operator::Const | Operator::Placeholder | Operator::Unrecognized(_) => Wiring::None,
        }
    }

    /// Inputs of `node` that are wired as data edges, in destination port
    /// order.
    pub fn data_inputs<'n>(&self, node: &'n NodeDef) -> Result<&'n [String], ImportError> {
        match self.wiring() {
            Wiring::None => Ok(&[]),
            Wiring::First => {
                if node.input.is_empty() {
                    return Err(ImportError::MissingInput {
                        node: node.name.clone(),
                        index: 0,
                    });
                }
                Ok(&node.input[..1])
            }
            Wiring::All => Ok(node.input.as_slice()),
            Wiring::SkipFirst => Ok(node.input.get(1..).unwrap_or(&[])),
        }
    }
}

/// Translates a [`GraphDef`] into a layer net.
pub struct Importer<'a> {
    graph: &'a GraphDef,
    options: ImportOptions,
}

impl<'a> Importer<'a> {
    pub fn new(graph: &'a GraphDef, options: ImportOptions) -> Self {
        Self { graph, options }
    }

    /// Import into a fresh [`Net`]. Nothing is returned unless every node
    /// translates.
    pub fn import(&self) -> Result<Net, ImportError> {
        self.import_with_artifacts().map(|(net, _)| net)
    }

    /// Like [`Importer::import`], also returning what the ordering check
    /// collected when [`ImportOptions::verify_order`] is set.
    pub fn import_with_artifacts(&self) -> Result<(Net, Option<ValidationArtifacts>), ImportError> {
        let mut net = Net::new();
        let artifacts = self.populate(&mut net)?;
        Ok((net, artifacts))
    }

    /// Import into an existing destination. On error the destination may
    /// hold the layers added before the failing node.
    pub fn populate<N: NetBuilder>(
        &self,
        net: &mut N,
    ) -> Result<Option<ValidationArtifacts>, ImportError> {
        let nodes = self.graph.node.as_slice();
        let constants = build_constant_table(nodes);
        debug_print!(
            "[DEBUG] importing {} nodes ({} constants)",
            nodes.len(),
            constants.len()
        );

        let mut validator = self
            .options
            .verify_order
            .then(|| OrderValidator::new(self.graph));
        let mut context = BuildContext {
            nodes,
            constants,
            symbols: SymbolTable::new(),
            graph_inputs: Vec::new(),
            limit: self.options.tensor_byte_length_limit,
            net,
        };
        for (index, node) in nodes.iter().enumerate() {
            if let Some(validator) = validator.as_mut() {
                validator.check(index, node)?;
            }
            context
                .translate(node)
                .map_err(|err| err.in_node(&node.name))?;
        }

        let BuildContext {
            graph_inputs, net, ..
        } = context;
        net.declare_graph_inputs(graph_inputs);
        Ok(validator.map(OrderValidator::finish))
    }
}

/// State threaded through one translation pass.
struct BuildContext<'a, 'n, N: NetBuilder> {
    nodes: &'a [NodeDef],
    constants: ConstantTable,
    symbols: SymbolTable,
    graph_inputs: Vec<String>,
    limit: usize,
    net: &'n mut N,
}

impl<'a, N: NetBuilder> BuildContext<'a, '_, N> {
    fn translate(&mut self, node: &NodeDef) -> Result<(), ImportError> {
        debug_print!("[DEBUG] {}", summarize_node(node));
        let operator = Operator::from_op(&node.op);
        let params = match &operator {
            Operator::Unrecognized(op) => {
                return Err(ImportError::UnsupportedOperator {
                    node: node.name.clone(),
                    op: op.clone(),
                });
            }
            Operator::Const => return Ok(()),
            Operator::Placeholder => {
                debug_print!("[DEBUG] graph input `{}`", node.name);
                self.symbols.insert(node.name.clone(), Symbol::Input);
                self.graph_inputs.push(node.name.clone());
                return Ok(());
            }
            Operator::Conv2D => self.convolution_params(node)?,
            Operator::BiasAdd => {
                let bias = decode_activation_tensor(self.constant_operand(node, 1)?)?;
                let mut params = LayerParams::new();
                params.blobs.push(bias);
                params
            }
            Operator::MatMul => self.inner_product_params(node)?,
            Operator::Reshape => {
                let dims = decode_dims_tensor(self.constant_operand(node, 1)?)?;
                let mut params = LayerParams::new();
                params.set("dim", dims.into_iter().map(i64::from).collect::<Vec<_>>());
                params
            }
            Operator::MaxPool => Self::pooling_params(node, "max")?,
            Operator::AvgPool => Self::pooling_params(node, "ave")?,
            // TODO: carry the `Concat` axis (input 0) into an `axis` param once
            // the constant can be read as a scalar int32.
            Operator::Softmax
            | Operator::Lrn
            | Operator::Relu
            | Operator::Identity
            | Operator::Concat => LayerParams::new(),
        };

        let Some(kind) = operator.layer_kind() else {
            return Ok(());
        };
        let id = self.net.add_layer(&node.name, kind, params)?;
        debug_print!("[DEBUG] {} `{}` -> {} layer {}", node.op, node.name, kind, id);
        self.symbols.insert(node.name.clone(), Symbol::Layer(id));
        self.wire(node, &operator, id)
    }

    /// Resolve `input[index]` of `node` to a constant tensor.
    fn constant_operand(
        &self,
        node: &NodeDef,
        index: usize,
    ) -> Result<&'a TensorRecord, ImportError> {
        let text = node.input.get(index).ok_or_else(|| ImportError::MissingInput {
            node: node.name.clone(),
            index,
        })?;
        let reference = parse_reference(text)?;
        if reference.port != 0 {
            return Err(ImportError::UnsupportedMultiOutputConst {
                node: node.name.clone(),
                name: reference.name,
                port: reference.port,
            });
        }
        let tensor = self
            .constants
            .tensor(self.nodes, &reference.name)
            .ok_or_else(|| ImportError::ConstantNotFound {
                node: node.name.clone(),
                name: reference.name.clone(),
            })?;

        let byte_length = tensor.tensor_content.len();
        if byte_length > self.limit {
            return Err(ImportError::TensorLimit {
                node: node.name.clone(),
                byte_length,
                limit: self.limit,
            });
        }
        Ok(tensor)
    }

    fn convolution_params(&self, node: &NodeDef) -> Result<LayerParams, ImportError> {
        let kernel = decode_kernel_tensor(self.constant_operand(node, 1)?)?;

        // Kernel blob is [out, in, h, w]
        let mut params = LayerParams::new();
        params.set("kernel_h", kernel.shape[2]);
        params.set("kernel_w", kernel.shape[3]);
        params.set("num_output", kernel.shape[0]);
        params.set("bias_term", false);
        params.blobs.push(kernel);

        apply_strides(&mut params, node)?;
        apply_padding(&mut params, node);
        resolve_kernel_params(&params)?;
        Ok(params)
    }

    fn inner_product_params(&self, node: &NodeDef) -> Result<LayerParams, ImportError> {
        let weights = decode_activation_tensor(self.constant_operand(node, 1)?)?;
        let num_output = *weights
            .shape
            .first()
            .ok_or_else(|| ImportError::InvalidShape {
                node: node.name.clone(),
                shape: Vec::new(),
            })?;

        let mut params = LayerParams::new();
        params.set("num_output", num_output);
        params.set("bias_term", false);
        params.blobs.push(weights);
        Ok(params)
    }

    fn pooling_params(node: &NodeDef, pool: &str) -> Result<LayerParams, ImportError> {
        let mut params = LayerParams::new();
        params.set("pool", pool);
        apply_ksize(&mut params, node)?;
        apply_strides(&mut params, node)?;
        apply_padding(&mut params, node);
        resolve_kernel_params(&params)?;
        Ok(params)
    }

    fn wire(
        &mut self,
        node: &NodeDef,
        operator: &Operator,
        id: LayerId,
    ) -> Result<(), ImportError> {
        for (port, text) in operator.data_inputs(node)?.iter().enumerate() {
            let reference = parse_reference(text)?;
            let source = self.symbols.resolve(&reference)?;
            self.net
                .connect(source.layer_id(), reference.port, id, port as u32)?;
        }
        Ok(())
    }
}

/// Import `graph` with default options.
pub fn import_graph(graph: &GraphDef) -> Result<Net, ImportError> {
    Importer::new(graph, ImportOptions::default()).import()
}
