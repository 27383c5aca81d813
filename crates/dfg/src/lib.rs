//! The dataflow-graph engine (spec §4.6): typed ports and edges, five node
//! shapes, end-of-stream as an ordinary message, and a readiness-driven
//! scheduler with an optional multi-threaded worker pool.

pub mod edge;
pub mod graph;
pub mod message;
pub mod node;
pub mod port;

pub use edge::{Edge, EdgeHandle};
pub use graph::{Graph, NodeId};
pub use message::Message;
pub use node::{Node, Shape};
pub use port::{InputPort, OutputPort};
