use std::collections::BTreeMap;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{Dispatcher, Error, Inbox, Params, Result, Transport};
use crate::tree_aggregate::{Aggregator, TreeAggregate};
use crate::{NodeIdT, TreeInfo};

/// A running protocol instance of one node, as created by a `Registry`.
pub trait Instance<N, O>: Send {
    /// Returns the ID of the node this instance runs for.
    fn our_id(&self) -> &N;

    /// Returns the routing entry point to attach to the network.
    fn inbox(&self) -> Arc<dyn Inbox<N>>;

    /// Starts the run with the payload the protocol was registered with. Only valid at the root.
    fn start(&self) -> Result<()>;

    /// The channel on which the root publishes its output.
    fn completion(&self) -> &Receiver<O>;

    /// The channel on which failures to handle a message are published.
    fn errors(&self) -> &Receiver<Error>;

    /// Returns the number of faults detected so far.
    fn fault_count(&self) -> usize;

    /// Stops the instance.
    fn shutdown(self: Box<Self>) -> Result<()>;
}

/// Creates the instance of a node, given its place in the tree and its transport endpoint.
pub type Factory<N, O> = Box<
    dyn Fn(Arc<TreeInfo<N>>, Box<dyn Transport<N>>, &Params) -> Result<Box<dyn Instance<N, O>>>
        + Send
        + Sync,
>;

/// Maps protocol names to the factories creating their instances.
///
/// A registry is set up once, and then passed to whatever creates instances for a run.
pub struct Registry<N, O> {
    factories: BTreeMap<String, Factory<N, O>>,
}

impl<N: NodeIdT + 'static, O: 'static> Default for Registry<N, O> {
    fn default() -> Self {
        Registry::new()
    }
}

impl<N: NodeIdT + 'static, O: 'static> Registry<N, O> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Registry {
            factories: BTreeMap::new(),
        }
    }

    /// Registers `factory` under `name`. Fails if the name is taken.
    pub fn register<F>(&mut self, name: &str, factory: F) -> Result<()>
    where
        F: Fn(Arc<TreeInfo<N>>, Box<dyn Transport<N>>, &Params) -> Result<Box<dyn Instance<N, O>>>
            + Send
            + Sync
            + 'static,
    {
        if self.factories.contains_key(name) {
            return Err(Error::DuplicateProtocol(name.to_string()));
        }
        self.factories.insert(name.to_string(), Box::new(factory));
        Ok(())
    }

    /// Registers a tree aggregation protocol under `name`: its instances collect with
    /// `aggregator`, and the root announces `payload`.
    pub fn register_aggregate<A>(
        &mut self,
        name: &str,
        aggregator: A,
        payload: A::Payload,
    ) -> Result<()>
    where
        A: Aggregator<N, Value = O> + Clone + 'static,
        A::Payload: Serialize + DeserializeOwned,
        O: Serialize + DeserializeOwned,
    {
        self.register(name, move |tree_info, transport, params| {
            let algorithm = TreeAggregate::new(tree_info, aggregator.clone());
            let dispatcher = Dispatcher::spawn(algorithm, transport, params)?;
            let instance: Box<dyn Instance<N, O>> = Box::new(Registered {
                dispatcher,
                payload: payload.clone(),
            });
            Ok(instance)
        })
    }

    /// Returns `true` if a protocol is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Returns the registered protocol names, in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Creates the instance of protocol `name` for the node described by `tree_info`.
    pub fn instantiate(
        &self,
        name: &str,
        tree_info: Arc<TreeInfo<N>>,
        transport: Box<dyn Transport<N>>,
        params: &Params,
    ) -> Result<Box<dyn Instance<N, O>>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| Error::UnknownProtocol(name.to_string()))?;
        factory(tree_info, transport, params)
    }
}

/// A tree aggregation dispatcher, together with the payload it announces if it is the root.
struct Registered<N, A: Aggregator<N>> {
    dispatcher: Dispatcher<N, A>,
    payload: A::Payload,
}

impl<N, A> Instance<N, A::Value> for Registered<N, A>
where
    N: NodeIdT + 'static,
    A: Aggregator<N> + 'static,
    A::Payload: Serialize + DeserializeOwned,
    A::Value: Serialize + DeserializeOwned,
{
    fn our_id(&self) -> &N {
        self.dispatcher.our_id()
    }

    fn inbox(&self) -> Arc<dyn Inbox<N>> {
        Arc::new(self.dispatcher.mailbox())
    }

    fn start(&self) -> Result<()> {
        self.dispatcher.start(self.payload.clone())
    }

    fn completion(&self) -> &Receiver<A::Value> {
        self.dispatcher.completion()
    }

    fn errors(&self) -> &Receiver<Error> {
        self.dispatcher.errors()
    }

    fn fault_count(&self) -> usize {
        self.dispatcher.fault_count()
    }

    fn shutdown(self: Box<Self>) -> Result<()> {
        self.dispatcher.stop().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::Registry;
    use crate::runtime::{Error, LocalNetwork, Params};
    use crate::tree_aggregate::NodeCount;
    use crate::Tree;

    #[test]
    fn test_names_are_unique() {
        let mut registry: Registry<u8, u64> = Registry::new();
        registry
            .register_aggregate("count", NodeCount, "hello".to_string())
            .expect("first registration");
        match registry.register_aggregate("count", NodeCount, "again".to_string()) {
            Err(Error::DuplicateProtocol(ref name)) if name == "count" => (),
            other => panic!("expected DuplicateProtocol, got {:?}", other),
        }
        assert!(registry.contains("count"));
        assert_eq!(vec!["count"], registry.names().collect::<Vec<_>>());
    }

    #[test]
    fn test_unknown_protocol() {
        let registry: Registry<u8, u64> = Registry::new();
        let tree = Tree::new(0u8);
        let info = Arc::new(tree.tree_info(&0).expect("root"));
        let transport = Box::new(LocalNetwork::<u8>::new().endpoint(0));
        match registry.instantiate("count", info, transport, &Params::default()) {
            Err(Error::UnknownProtocol(ref name)) if name == "count" => (),
            Err(err) => panic!("expected UnknownProtocol, got {:?}", err),
            Ok(_) => panic!("expected UnknownProtocol, got an instance"),
        }
    }
}
