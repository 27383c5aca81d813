//! The five node shapes the scheduler drives: every concrete node
//! implements [`Node`] and reports one of these arities.

use wirecell_core::Result;

use crate::port::{InputPort, OutputPort};

/// A node's input/output arity. The scheduler only uses this to decide
/// whether a node can still be considered "ready" (see
/// [`Node::is_ready`])'s default; the node itself is free to interpret
/// its own ports however its shape implies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    /// No inputs, one output. Runs until it chooses to emit EOS.
    Source,
    /// One input, no outputs. Runs until it receives EOS.
    Sink,
    /// One input, one output, one message in for (up to) one message out.
    Function,
    /// One input, one output, but may buffer and emit zero or more output
    /// messages per input message (e.g. the frame slicer).
    QueuedOut,
    /// `inputs` inputs and/or `outputs` outputs, for joining or
    /// broadcasting streams.
    Fan { inputs: usize, outputs: usize },
}

impl Shape {
    pub fn ninputs(&self) -> usize {
        match self {
            Shape::Source => 0,
            Shape::Sink | Shape::Function | Shape::QueuedOut => 1,
            Shape::Fan { inputs, .. } => *inputs,
        }
    }

    pub fn noutputs(&self) -> usize {
        match self {
            Shape::Sink => 0,
            Shape::Source | Shape::Function | Shape::QueuedOut => 1,
            Shape::Fan { outputs, .. } => *outputs,
        }
    }
}

/// A unit of work in the flow graph.
///
/// The scheduler repeatedly calls [`Node::work`] on every not-yet-finished
/// node. A node is responsible for its own readiness: if it has nothing
/// useful to do (inputs empty, or downstream not ready to receive), it
/// returns `Ok(false)` rather than blocking, so the scheduler can try
/// another node. Any `Err` is treated as fatal: the whole run aborts
/// immediately, matching the "any node failure kills the graph" semantics
/// of the systems this models.
pub trait Node: Send {
    fn shape(&self) -> Shape;
    fn input_ports(&mut self) -> &mut [InputPort];
    fn output_ports(&mut self) -> &mut [OutputPort];

    /// Attempt one unit of work. `Ok(true)` if progress was made this
    /// call, `Ok(false)` if the node had nothing to do.
    fn work(&mut self) -> Result<bool>;

    /// `true` once the node will never produce more work (it has sent
    /// EOS on every output, or it is a sink that has received EOS).
    fn finished(&self) -> bool;
}
