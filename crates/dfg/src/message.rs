//! The payload carried along one edge.

use std::any::Any;

/// One value flowing along an edge: either application data or an
/// end-of-stream marker. EOS is itself a message -- a node propagates it
/// downstream by sending it like any other value, not by closing
/// something -- so a single fan-out node sees exactly one EOS arrive and
/// can choose when (and whether) to forward it to each of its outputs.
pub enum Message {
    Data(Box<dyn Any + Send>),
    Eos,
}

impl Message {
    pub fn data<T: Any + Send>(value: T) -> Self {
        Message::Data(Box::new(value))
    }

    pub fn is_eos(&self) -> bool {
        matches!(self, Message::Eos)
    }

    /// Recover a typed value, or hand the message back unchanged if it
    /// isn't a `T` (including if it's EOS).
    pub fn downcast<T: Any>(self) -> std::result::Result<T, Message> {
        match self {
            Message::Data(b) => match b.downcast::<T>() {
                Ok(v) => Ok(*v),
                Err(b) => Err(Message::Data(b)),
            },
            other => Err(other),
        }
    }
}
