//! A typed, bounded FIFO connecting one output port to one input port.

use std::any::TypeId;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::message::Message;

/// Shared, thread-safe queue plugged into exactly one output and one
/// input port. `type_id`/`type_name` let [`crate::graph::Graph::connect`]
/// reject mismatched ports before any data flows.
pub struct Edge {
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
    queue: Mutex<VecDeque<Message>>,
}

pub type EdgeHandle = Arc<Edge>;

impl Edge {
    pub fn new(type_id: TypeId, type_name: &'static str) -> EdgeHandle {
        Arc::new(Edge {
            type_id,
            type_name,
            queue: Mutex::new(VecDeque::new()),
        })
    }

    pub fn push(&self, msg: Message) {
        self.queue.lock().expect("edge queue poisoned").push_back(msg);
    }

    pub fn pop(&self) -> Option<Message> {
        self.queue.lock().expect("edge queue poisoned").pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().expect("edge queue poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
