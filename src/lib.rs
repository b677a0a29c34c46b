pub mod constants;
pub mod debug;
pub mod error;
pub mod graph;
pub mod graphviz;
pub mod importer;
pub mod loader;
pub mod net;
pub mod reference;
pub mod spatial;
pub mod tensor;
pub mod validator;

pub use constants::{ConstantTable, build_constant_table};
pub use error::ImportError;
pub use graph::{AttrValue, DataType, GraphDef, NodeDef, TensorRecord};
pub use graphviz::net_to_dot;
pub use importer::{ImportOptions, Importer, Operator, import_graph};
pub use loader::load_graph_from_path;
pub use net::{Edge, Layer, LayerId, LayerKind, LayerParams, Net, NetBuilder, ParamValue};
pub use reference::{Reference, Symbol, SymbolTable, parse_reference};
pub use spatial::{
    KernelParams, OutputSize, PaddingMode, resolve_kernel_params, resolve_output_size,
};
pub use tensor::{Blob, decode_activation_tensor, decode_kernel_tensor, shape_of};
pub use validator::{OrderValidator, ValidationArtifacts};
