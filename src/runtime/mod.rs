//! # Runtime
//!
//! Runs `TreeAggregate` instances concurrently, each on its own dispatcher thread.
//!
//! A [`Dispatcher`](struct.Dispatcher.html) owns one instance. Incoming messages are decoded by
//! its [`Mailbox`](struct.Mailbox.html) and queued on one channel per message kind; the
//! dispatcher thread handles them one at a time, so the instance itself never needs a lock.
//! Outgoing messages are encoded with [`encode`](fn.encode.html) and handed to the node's
//! [`Transport`](trait.Transport.html), in order. The first send that fails aborts the step: later
//! messages of the same step are not sent, and the error is published on the dispatcher's error
//! channel.
//!
//! [`LocalNetwork`](struct.LocalNetwork.html) connects dispatchers within one process. A
//! [`Registry`](struct.Registry.html) maps protocol names to instance factories, and
//! [`LocalRun`](struct.LocalRun.html) uses it to set up every node of a tree, start the root and
//! wait for the single outcome of the run.
//!
//! ## Example
//!
//! ```no_run
//! use treecast::runtime::{LocalRun, Params, Registry};
//! use treecast::tree_aggregate::NodeCount;
//! use treecast::Tree;
//!
//! let mut tree = Tree::new("root");
//! tree.add_child(&"root", "a").unwrap().add_child(&"a", "b").unwrap();
//!
//! let mut registry = Registry::new();
//! registry
//!     .register_aggregate("count", NodeCount, "hello".to_string())
//!     .unwrap();
//! let run = LocalRun::new(&registry, "count", &tree, &Params::default()).unwrap();
//! assert_eq!(2, run.run().unwrap());
//! run.shutdown().unwrap();
//! ```

mod codec;
mod dispatcher;
mod error;
mod local_run;
mod params;
mod registry;
mod transport;

pub use self::codec::{decode, encode, peek_kind};
pub use self::dispatcher::{Dispatcher, Inbox, Mailbox};
pub use self::error::{Error, Result, TransportError};
pub use self::local_run::{LocalRun, RunError};
pub use self::params::Params;
pub use self::registry::{Factory, Instance, Registry};
pub use self::transport::{LocalEndpoint, LocalNetwork, Transport};
