//! # Treecast
//!
//! Announce/reply aggregation over a rooted spanning tree.
//!
//! A run consists of two waves. The _announcement_ carries an application payload from the root
//! down to every leaf. The _reply_ wave carries a value back up: every node waits until each of its
//! children has replied, merges their values with its own contribution, and sends a single reply
//! to its parent. The root outputs the aggregate over all other nodes, e.g. their number.
//!
//! ## Usage
//!
//! The protocol logic in [`tree_aggregate`](tree_aggregate/index.html) does not perform any I/O.
//! Like every algorithm in this crate it implements [`DistAlgorithm`](trait.DistAlgorithm.html):
//! the application calls `handle_input` on the root and `handle_message` for every message from an
//! adjacent node. Methods return a [`Step`](struct.Step.html) containing the messages that need to
//! be sent, in order, fault logs indicating misbehaving peers, and outputs.
//!
//! The [`runtime`](runtime/index.html) module runs instances concurrently: one dispatcher thread
//! per node, fed by a typed channel per message kind, sending over a pluggable
//! [`Transport`](runtime/trait.Transport.html). It also contains an in-process network, a
//! registry of named protocols and a driver that executes a whole run and reports its single
//! outcome.
//!
//! The tree itself is described by [`Tree`](struct.Tree.html) and, per node, by
//! [`TreeInfo`](struct.TreeInfo.html). Node IDs are a generic type argument to all algorithms.
//!
//! ## Serialization
//!
//! Messages implement serde's `Serialize` and `Deserialize`. The runtime encodes them with a
//! one-byte kind tag followed by their `bincode` encoding.

// We put algorithm structs in `src/algorithm/algorithm.rs`.
#![allow(clippy::module_inception)]
#![warn(missing_docs)]

mod fault_log;
mod messaging;
mod traits;
mod tree_info;

pub mod runtime;
pub mod tree_aggregate;

pub use crate::fault_log::{Fault, FaultLog};
pub use crate::messaging::{SourcedMessage, TargetedMessage};
pub use crate::traits::{DistAlgorithm, Message, NodeIdT, Step};
pub use crate::tree_info::{Error as TreeError, Tree, TreeInfo};
