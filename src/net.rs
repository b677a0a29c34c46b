//! Destination layer graph
//!
//! The importer only talks to the destination through [`NetBuilder`]. [`Net`]
//! is the in-memory implementation handed to the execution engine.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::ImportError;
use crate::spatial::PaddingMode;
use crate::tensor::Blob;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u32);

impl LayerId {
    /// The net's graph-input layer. Real layers are numbered from 1.
    pub const INPUT: LayerId = LayerId(0);
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Convolution,
    Shift,
    InnerProduct,
    Reshape,
    Softmax,
    Lrn,
    Concat,
    Relu,
    Pooling,
    Identity,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayerKind::Convolution => "Convolution",
            LayerKind::Shift => "Shift",
            LayerKind::InnerProduct => "InnerProduct",
            LayerKind::Reshape => "Reshape",
            LayerKind::Softmax => "Softmax",
            LayerKind::Lrn => "LRN",
            LayerKind::Concat => "Concat",
            LayerKind::Relu => "ReLU",
            LayerKind::Pooling => "Pooling",
            LayerKind::Identity => "Identity",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Bool(bool),
    Str(String),
    IntArray(Vec<i64>),
    PaddingMode(PaddingMode),
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<usize> for ParamValue {
    fn from(value: usize) -> Self {
        ParamValue::Int(value as i64)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<Vec<i64>> for ParamValue {
    fn from(value: Vec<i64>) -> Self {
        ParamValue::IntArray(value)
    }
}

impl From<PaddingMode> for ParamValue {
    fn from(value: PaddingMode) -> Self {
        ParamValue::PaddingMode(value)
    }
}

/// Named scalar/array parameters plus owned weight blobs for one layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerParams {
    params: BTreeMap<String, ParamValue>,
    pub blobs: Vec<Blob>,
}

impl LayerParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.params.insert(name.into(), value.into());
    }

    pub fn has(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.params.get(name)? {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_int_or(&self, name: &str, default: i64) -> i64 {
        self.get_int(name).unwrap_or(default)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.params.get(name)? {
            ParamValue::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub kind: LayerKind,
    pub params: LayerParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub src: LayerId,
    pub src_port: u32,
    pub dst: LayerId,
    pub dst_port: u32,
}

/// Mutating calls the importer issues against a destination graph.
pub trait NetBuilder {
    fn add_layer(
        &mut self,
        name: &str,
        kind: LayerKind,
        params: LayerParams,
    ) -> Result<LayerId, ImportError>;

    fn connect(
        &mut self,
        src: LayerId,
        src_port: u32,
        dst: LayerId,
        dst_port: u32,
    ) -> Result<(), ImportError>;

    fn declare_graph_inputs(&mut self, names: Vec<String>);
}

#[derive(Debug, Clone, Default)]
pub struct Net {
    layers: Vec<Layer>,
    edges: Vec<Edge>,
    inputs: Vec<String>,
}

impl Net {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layers in creation order. The input layer is implicit and not listed.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        let index = (id.0 as usize).checked_sub(1)?;
        self.layers.get(index)
    }

    pub fn layer_by_name(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.name == name)
    }

    /// Edges feeding `id`, ordered by destination port.
    pub fn inputs_of(&self, id: LayerId) -> Vec<Edge> {
        let mut edges: Vec<_> = self.edges.iter().filter(|e| e.dst == id).copied().collect();
        edges.sort_by_key(|e| e.dst_port);
        edges
    }

    fn contains(&self, id: LayerId) -> bool {
        id == LayerId::INPUT || self.layer(id).is_some()
    }
}

impl NetBuilder for Net {
    fn add_layer(
        &mut self,
        name: &str,
        kind: LayerKind,
        params: LayerParams,
    ) -> Result<LayerId, ImportError> {
        let id = LayerId(self.layers.len() as u32 + 1);
        self.layers.push(Layer {
            id,
            name: name.to_string(),
            kind,
            params,
        });
        Ok(id)
    }

    fn connect(
        &mut self,
        src: LayerId,
        src_port: u32,
        dst: LayerId,
        dst_port: u32,
    ) -> Result<(), ImportError> {
        for id in [src, dst] {
            if !self.contains(id) {
                return Err(ImportError::UnknownLayer { id: id.0 });
            }
        }
        self.edges.push(Edge {
            src,
            src_port,
            dst,
            dst_port,
        });
        Ok(())
    }

    fn declare_graph_inputs(&mut self, names: Vec<String>) {
        self.inputs = names;
    }
}
