//! Sentinel keys used to index the dependency map of a reactive target.
//!
//! A closed enum instead of string-collidable sentinels: a field literally
//! named `"length"` can never collide with the `Length` key of a
//! `ReactiveArray`.

use std::fmt;

/// A dependency key local to one reactive target.
///
/// `Field` carries the address of a lens function (`fn(&T) -> &F`) as a
/// stable identity for one field of a plain-record `Reactive<T>` — see
/// `object.rs`. `Index` is used by `ReactiveArray`. `Length`, `Iterate`, and
/// `MapKeyIterate` are sentinels shared by the sequence and map/set
/// collection types for their whole-target operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Field(usize),
    Index(usize),
    Length,
    Iterate,
    MapKeyIterate,
    /// The single fixed key a `Ref`/`Computed` tracks itself under.
    Value,
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Field(id) => write!(f, "field#{id:x}"),
            Key::Index(i) => write!(f, "index[{i}]"),
            Key::Length => write!(f, "length"),
            Key::Iterate => write!(f, "<iterate>"),
            Key::MapKeyIterate => write!(f, "<iterate-keys>"),
            Key::Value => write!(f, "value"),
        }
    }
}

/// Read-side operation taxonomy exposed for debug events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackOp {
    Get,
    Has,
    Iterate,
}

/// Write-side operation taxonomy exposed for debug events and used
/// internally to select which dependency keys a mutation retriggers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TriggerOp {
    Set,
    Add,
    Delete,
    Clear,
}
