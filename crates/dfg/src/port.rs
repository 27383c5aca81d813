//! Typed endpoints a [`crate::node::Node`] exposes; [`crate::graph::Graph::connect`]
//! plugs one [`Edge`] between a tail's output port and a head's input port.

use std::any::{Any, TypeId};

use wirecell_core::{Error, Result};

use crate::edge::{Edge, EdgeHandle};
use crate::message::Message;

/// An output (sending) port.
pub struct OutputPort {
    name: String,
    type_id: TypeId,
    type_name: &'static str,
    edge: Option<EdgeHandle>,
}

impl OutputPort {
    pub fn new<T: Any>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            edge: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is_plugged(&self) -> bool {
        self.edge.is_some()
    }

    /// Plug in `edge`, returning whichever edge was previously plugged.
    pub fn plug(&mut self, edge: EdgeHandle) -> Option<EdgeHandle> {
        self.edge.replace(edge)
    }

    fn edge(&self) -> Result<&EdgeHandle> {
        self.edge
            .as_ref()
            .ok_or_else(|| Error::Runtime(format!("output port {} has no edge", self.name)))
    }

    pub fn send<T: Any + Send>(&self, value: T) -> Result<()> {
        self.edge()?.push(Message::data(value));
        Ok(())
    }

    pub fn send_eos(&self) -> Result<()> {
        self.edge()?.push(Message::Eos);
        Ok(())
    }
}

/// An input (receiving) port.
pub struct InputPort {
    name: String,
    type_id: TypeId,
    type_name: &'static str,
    edge: Option<EdgeHandle>,
}

impl InputPort {
    pub fn new<T: Any>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            edge: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is_plugged(&self) -> bool {
        self.edge.is_some()
    }

    pub fn plug(&mut self, edge: EdgeHandle) -> Option<EdgeHandle> {
        self.edge.replace(edge)
    }

    /// `true` if a message is available to [`InputPort::recv`] right now.
    pub fn ready(&self) -> bool {
        self.edge.as_ref().map(|e| !e.is_empty()).unwrap_or(false)
    }

    fn edge(&self) -> Result<&EdgeHandle> {
        self.edge
            .as_ref()
            .ok_or_else(|| Error::Runtime(format!("input port {} has no edge", self.name)))
    }

    pub fn recv(&self) -> Result<Message> {
        self.edge()?
            .pop()
            .ok_or_else(|| Error::Runtime(format!("input port {} is empty", self.name)))
    }
}

pub(crate) fn check_edge_creatable(out_port: &OutputPort, in_port: &InputPort) -> Result<EdgeHandle> {
    if out_port.type_id != in_port.type_id {
        return Err(Error::Value(format!(
            "edge type mismatch: output port {} ({}) -> input port {} ({})",
            out_port.name, out_port.type_name, in_port.name, in_port.type_name
        )));
    }
    Ok(Edge::new(out_port.type_id, out_port.type_name))
}
