///////////////////// PRELUDE /////////////////////

pub(crate) use crate::logging::{DummyLogger, Logger};
pub(crate) use core::fmt::Debug;
pub(crate) use maplit::hashmap;
pub(crate) use std::collections::HashMap;

/// Index of an object in an interpreter's heap.
pub type HeapPos = u32;
