use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as};

/// Element type tags carried by tensor records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    #[serde(rename = "DT_FLOAT")]
    Float,
    #[serde(rename = "DT_DOUBLE")]
    Double,
    #[serde(rename = "DT_INT32")]
    Int32,
    #[serde(rename = "DT_UINT8")]
    Uint8,
    #[serde(rename = "DT_INT16")]
    Int16,
    #[serde(rename = "DT_INT8")]
    Int8,
    #[serde(rename = "DT_STRING")]
    String,
    #[serde(rename = "DT_INT64")]
    Int64,
    #[serde(rename = "DT_BOOL")]
    Bool,
    #[serde(rename = "DT_HALF")]
    Half,
}

impl DataType {
    pub fn bytes_per_element(self) -> Option<usize> {
        match self {
            DataType::Float => Some(4),
            DataType::Double => Some(8),
            DataType::Int32 => Some(4),
            DataType::Uint8 => Some(1),
            DataType::Int16 => Some(2),
            DataType::Int8 => Some(1),
            DataType::Int64 => Some(8),
            DataType::Bool => Some(1),
            DataType::Half => Some(2),
            DataType::String => None,
        }
    }
}

/// A constant tensor as it appears in a `value` attribute.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorRecord {
    pub dtype: DataType,
    #[serde(default)]
    pub tensor_shape: Option<Vec<i64>>,
    #[serde_as(as = "Base64")]
    #[serde(default)]
    pub tensor_content: Vec<u8>,
}

impl TensorRecord {
    pub fn from_f32(shape: &[i64], values: &[f32]) -> Self {
        Self {
            dtype: DataType::Float,
            tensor_shape: Some(shape.to_vec()),
            tensor_content: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }

    pub fn from_i32(shape: &[i64], values: &[i32]) -> Self {
        Self {
            dtype: DataType::Int32,
            tensor_shape: Some(shape.to_vec()),
            tensor_content: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListValue {
    #[serde(default)]
    pub i: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrValue {
    I(i64),
    S(String),
    B(bool),
    Type(DataType),
    List(ListValue),
    Tensor(TensorRecord),
}

impl AttrValue {
    pub fn ints(values: &[i64]) -> Self {
        AttrValue::List(ListValue {
            i: values.to_vec(),
        })
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::I(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::S(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::B(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[i64]> {
        match self {
            AttrValue::List(list) => Some(&list.i),
            _ => None,
        }
    }

    pub fn as_tensor(&self) -> Option<&TensorRecord> {
        match self {
            AttrValue::Tensor(tensor) => Some(tensor),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
    pub name: String,
    pub op: String,
    #[serde(default)]
    pub input: Vec<String>,
    #[serde(default)]
    pub attr: BTreeMap<String, AttrValue>,
}

impl NodeDef {
    pub fn new(name: impl Into<String>, op: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            op: op.into(),
            input: Vec::new(),
            attr: BTreeMap::new(),
        }
    }

    pub fn with_inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input = inputs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        self.attr.insert(name.into(), value);
        self
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr.contains_key(name)
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attr.get(name)
    }
}

/// A pre-decoded graph: nodes in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDef {
    #[serde(default)]
    pub node: Vec<NodeDef>,
}

impl GraphDef {
    pub fn new(node: Vec<NodeDef>) -> Self {
        Self { node }
    }

    pub fn node(&self, index: usize) -> Option<&NodeDef> {
        self.node.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_tagged_attributes() {
        let json = r#"{
            "node": [{
                "name": "pool",
                "op": "MaxPool",
                "input": ["x"],
                "attr": {
                    "ksize": {"list": {"i": [1, 2, 2, 1]}},
                    "padding": {"s": "SAME"},
                    "T": {"type": "DT_FLOAT"}
                }
            }]
        }"#;
        let graph: GraphDef = serde_json::from_str(json).unwrap();
        let node = graph.node(0).unwrap();
        assert_eq!(node.attr("ksize").and_then(AttrValue::as_list), Some(&[1, 2, 2, 1][..]));
        assert_eq!(node.attr("padding").and_then(AttrValue::as_str), Some("SAME"));
        assert_eq!(node.attr("T"), Some(&AttrValue::Type(DataType::Float)));
        assert!(!node.has_attr("strides"));
    }

    #[test]
    fn tensor_content_is_base64() {
        let json =
            r#"{"dtype": "DT_INT32", "tensor_shape": [2], "tensor_content": "AQAAAP////8="}"#;
        let tensor: TensorRecord = serde_json::from_str(json).unwrap();
        assert_eq!(tensor, TensorRecord::from_i32(&[2], &[1, -1]));
    }

    #[test]
    fn bytes_per_element() {
        assert_eq!(DataType::Float.bytes_per_element(), Some(4));
        assert_eq!(DataType::Int64.bytes_per_element(), Some(8));
        assert_eq!(DataType::String.bytes_per_element(), None);
    }
}
