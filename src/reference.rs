use std::collections::HashMap;

use crate::error::ImportError;
use crate::net::LayerId;

/// An input reference `name` or `name:port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub name: String,
    pub port: u32,
}

/// Parse an input reference, splitting on the first `:`.
///
/// Existence of `name` is not checked here; that happens when the edge is
/// wired.
pub fn parse_reference(text: &str) -> Result<Reference, ImportError> {
    match text.split_once(':') {
        None => Ok(Reference {
            name: text.to_string(),
            port: 0,
        }),
        Some((name, port)) => {
            let port = port.parse().map_err(|_| ImportError::InvalidReference {
                node: String::new(),
                reference: text.to_string(),
            })?;
            Ok(Reference {
                name: name.to_string(),
                port,
            })
        }
    }
}

/// What a source node name resolves to in the destination net.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    /// A declared graph input (`Placeholder`).
    Input,
    Layer(LayerId),
}

impl Symbol {
    /// Layer id to connect from. Graph inputs feed from the net's input layer.
    pub fn layer_id(self) -> LayerId {
        match self {
            Symbol::Input => LayerId::INPUT,
            Symbol::Layer(id) => id,
        }
    }
}

/// Source node name -> destination symbol, grown during the build pass.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, symbol: Symbol) {
        self.symbols.insert(name.into(), symbol);
    }

    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.symbols.get(name).copied()
    }

    pub fn resolve(&self, reference: &Reference) -> Result<Symbol, ImportError> {
        self.get(&reference.name)
            .ok_or_else(|| ImportError::UnresolvedReference {
                node: String::new(),
                name: reference.name.clone(),
            })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
