//! The hierarchical detector description: detector -> anode -> face -> plane -> wire.

use wirecell_core::Point;

/// A single wire, signal-flow oriented `tail -> head`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wire {
    pub ident: i64,
    pub channel: i64,
    pub segment: i64,
    pub tail: Point,
    pub head: Point,
}

/// An ordered sequence of wires, ascending by pitch coordinate once corrected.
#[derive(Clone, Debug, PartialEq)]
pub struct Plane {
    pub ident: i64,
    pub wires: Vec<usize>,
}

/// Three planes (conventionally U, V, W) seeing one side of a drift volume.
#[derive(Clone, Debug, PartialEq)]
pub struct Face {
    pub ident: i64,
    pub planes: Vec<usize>,
}

/// One or two faces; two for a dual-sided anode.
#[derive(Clone, Debug, PartialEq)]
pub struct Anode {
    pub ident: i64,
    pub faces: Vec<usize>,
}

/// A set of anodes.
#[derive(Clone, Debug, PartialEq)]
pub struct Detector {
    pub ident: i64,
    pub anodes: Vec<usize>,
}

/// Owns the four flat arrays and their membership relations. Shared-immutable
/// after construction: the public handle exposes only accessors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Store {
    pub detectors: Vec<Detector>,
    pub anodes: Vec<Anode>,
    pub faces: Vec<Face>,
    pub planes: Vec<Plane>,
    pub wires: Vec<Wire>,
}

/// A totally ordered correction ladder. `Empty < Load < Order < Direction < Pitch`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    Empty = 0,
    Load = 1,
    Order = 2,
    Direction = 3,
    Pitch = 4,
}

impl Level {
    pub fn from_count(count: u8) -> Option<Level> {
        match count {
            0 => Some(Level::Empty),
            1 => Some(Level::Load),
            2 => Some(Level::Order),
            3 => Some(Level::Direction),
            4 => Some(Level::Pitch),
            _ => None,
        }
    }
}
