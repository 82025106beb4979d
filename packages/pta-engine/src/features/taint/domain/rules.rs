//! Taint rule configuration
//!
//! Rules are loaded from JSON as strings (`"Class.method"`, type names,
//! positions) and resolved against the program model before the analysis
//! starts. Every resolution miss is a fatal configuration error; the solver
//! never sees an unresolved rule.
//!
//! ```text
//! {
//!   "sources":   [ { "method": "SourceSink.source", "type": "String" } ],
//!   "sinks":     [ { "method": "SourceSink.sink", "index": 0 } ],
//!   "transfers": [ { "method": "String.concat", "from": 0, "to": "result", "type": "String" } ]
//! }
//! ```

use crate::shared::{MethodId, Program, TypeId};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaintConfigError {
    #[error("malformed taint rule file: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("malformed method reference `{0}` (expected `Class.method`)")]
    MalformedMethodRef(String),

    #[error("unknown class `{0}` in taint rule")]
    UnknownClass(String),

    #[error("unknown method `{0}` in taint rule")]
    UnknownMethod(String),

    #[error("ambiguous method `{0}` in taint rule (overloads present)")]
    AmbiguousMethod(String),

    #[error("unknown type `{0}` in taint rule")]
    UnknownType(String),

    #[error("invalid position `{0}` in transfer rule (expected `base`, `result` or an index)")]
    InvalidPosition(String),
}

/// Raw rule tables, straight from the configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaintRules {
    #[serde(default)]
    pub sources: Vec<SourceRule>,
    #[serde(default)]
    pub sinks: Vec<SinkRule>,
    #[serde(default)]
    pub transfers: Vec<TransferRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceRule {
    pub method: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SinkRule {
    pub method: String,
    pub index: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferRule {
    pub method: String,
    pub from: PosSpec,
    pub to: PosSpec,
    #[serde(rename = "type")]
    pub ty: String,
}

/// A rule position: an argument index, or the literal `"base"`/`"result"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PosSpec {
    Index(usize),
    Named(String),
}

/// Where a transfer reads taint from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferFrom {
    Base,
    Arg(usize),
}

/// Where a transfer writes taint to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferTo {
    Base,
    Result,
}

/// Resolved rule tables: every method, type and position has been checked
/// against the program.
#[derive(Debug, Clone, Default)]
pub struct TaintConfig {
    pub(crate) sources: Vec<Source>,
    pub(crate) sinks: Vec<Sink>,
    pub(crate) transfers: Vec<Transfer>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Source {
    pub method: MethodId,
    pub ty: TypeId,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Sink {
    pub method: MethodId,
    pub index: usize,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Transfer {
    pub method: MethodId,
    pub from: TransferFrom,
    pub to: TransferTo,
    pub ty: TypeId,
}

impl TaintRules {
    pub fn from_json(json: &str) -> Result<Self, TaintConfigError> {
        serde_json::from_str(json).map_err(TaintConfigError::Parse)
    }

    /// Resolves every rule against `program`; any miss is fatal.
    pub fn resolve(&self, program: &Program) -> Result<TaintConfig, TaintConfigError> {
        let sources = self
            .sources
            .iter()
            .map(|rule| {
                Ok(Source {
                    method: resolve_method(program, &rule.method)?,
                    ty: resolve_type(program, &rule.ty)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let sinks = self
            .sinks
            .iter()
            .map(|rule| {
                Ok(Sink {
                    method: resolve_method(program, &rule.method)?,
                    index: rule.index,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let transfers = self
            .transfers
            .iter()
            .map(|rule| {
                let from = match &rule.from {
                    PosSpec::Index(i) => TransferFrom::Arg(*i),
                    PosSpec::Named(name) if name == "base" => TransferFrom::Base,
                    PosSpec::Named(name) => {
                        return Err(TaintConfigError::InvalidPosition(name.clone()))
                    }
                };
                let to = match &rule.to {
                    PosSpec::Named(name) if name == "base" => TransferTo::Base,
                    PosSpec::Named(name) if name == "result" => TransferTo::Result,
                    PosSpec::Named(name) => {
                        return Err(TaintConfigError::InvalidPosition(name.clone()))
                    }
                    PosSpec::Index(i) => {
                        return Err(TaintConfigError::InvalidPosition(i.to_string()))
                    }
                };
                Ok(Transfer {
                    method: resolve_method(program, &rule.method)?,
                    from,
                    to,
                    ty: resolve_type(program, &rule.ty)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TaintConfig {
            sources,
            sinks,
            transfers,
        })
    }
}

impl TaintConfig {
    /// Parse + resolve in one step.
    pub fn from_json(json: &str, program: &Program) -> Result<Self, TaintConfigError> {
        TaintRules::from_json(json)?.resolve(program)
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty() && self.sinks.is_empty() && self.transfers.is_empty()
    }
}

fn resolve_method(program: &Program, reference: &str) -> Result<MethodId, TaintConfigError> {
    let (class_name, method_name) = reference
        .rsplit_once('.')
        .ok_or_else(|| TaintConfigError::MalformedMethodRef(reference.to_string()))?;
    let class = program
        .lookup_class(class_name)
        .ok_or_else(|| TaintConfigError::UnknownClass(class_name.to_string()))?;
    let mut matches = program
        .class(class)
        .declared
        .values()
        .copied()
        .filter(|&m| program.method_name(m) == method_name);
    let method = matches
        .next()
        .ok_or_else(|| TaintConfigError::UnknownMethod(reference.to_string()))?;
    if matches.next().is_some() {
        return Err(TaintConfigError::AmbiguousMethod(reference.to_string()));
    }
    Ok(method)
}

fn resolve_type(program: &Program, name: &str) -> Result<TypeId, TaintConfigError> {
    program
        .lookup_type(name)
        .ok_or_else(|| TaintConfigError::UnknownType(name.to_string()))
}
