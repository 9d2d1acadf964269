use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crossbeam_channel::Select;
use failure::Fail;
use log::{debug, info};

use super::{Error, Instance, LocalNetwork, Params, Registry, Result};
use crate::{NodeIdT, Tree};

/// The failure of a run: the node where it occurred, and what went wrong there.
///
/// A timeout is attributed to the root.
#[derive(Debug)]
pub struct RunError<N> {
    /// The node that failed.
    pub node_id: N,
    /// The node's error.
    pub error: Error,
}

impl<N> RunError<N> {
    fn new(node_id: N, error: Error) -> Self {
        RunError { node_id, error }
    }
}

impl<N: fmt::Debug> fmt::Display for RunError<N> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Run failed at node {:?}: {}", self.node_id, self.error)
    }
}

impl<N: NodeIdT + 'static> Fail for RunError<N> {
    fn cause(&self) -> Option<&dyn Fail> {
        Some(&self.error)
    }
}

/// One run of a registered protocol over a whole tree, with every node in this process.
///
/// All instances are connected through a `LocalNetwork` before the root is started.
pub struct LocalRun<N, O> {
    root: N,
    network: LocalNetwork<N>,
    instances: BTreeMap<N, Box<dyn Instance<N, O>>>,
    output_timeout: Duration,
}

impl<N: NodeIdT + 'static, O: 'static> LocalRun<N, O> {
    /// Creates an instance of protocol `name` for every node in `tree`.
    pub fn new(
        registry: &Registry<N, O>,
        name: &str,
        tree: &Tree<N>,
        params: &Params,
    ) -> Result<Self> {
        let network = LocalNetwork::new();
        let mut instances = BTreeMap::new();
        for (id, tree_info) in tree.tree_infos() {
            let transport = Box::new(network.endpoint(id.clone()));
            let instance = registry.instantiate(name, tree_info, transport, params)?;
            network.attach(id.clone(), instance.inbox());
            instances.insert(id, instance);
        }
        debug!("Created {} instances of {:?}", instances.len(), name);
        Ok(LocalRun {
            root: tree.root().clone(),
            network,
            instances,
            output_timeout: params.output_timeout,
        })
    }

    /// The network connecting the instances.
    pub fn network(&self) -> &LocalNetwork<N> {
        &self.network
    }

    /// The instance of node `id`.
    pub fn instance(&self, id: &N) -> Option<&dyn Instance<N, O>> {
        self.instances.get(id).map(|instance| &**instance)
    }

    /// The total number of faults detected by all instances.
    pub fn fault_count(&self) -> usize {
        self.instances.values().map(|instance| instance.fault_count()).sum()
    }

    /// Starts the root and waits for its output.
    ///
    /// Returns the first error of any node instead, if that comes first, or a timeout.
    pub fn run(&self) -> ::std::result::Result<O, RunError<N>> {
        let root_id = self.root.clone();
        let root = self.instances.get(&root_id).ok_or_else(|| {
            RunError::new(root_id.clone(), Error::UnknownNode(format!("{:?}", root_id)))
        })?;
        root
            .start()
            .map_err(|error| RunError::new(root_id.clone(), error))?;

        let mut sel = Select::new();
        let output_index = sel.recv(root.completion());
        let error_indices: BTreeMap<usize, (&N, &Box<dyn Instance<N, O>>)> = self
            .instances
            .iter()
            .map(|(id, instance)| (sel.recv(instance.errors()), (id, instance)))
            .collect();

        let oper = sel
            .select_timeout(self.output_timeout)
            .map_err(|_| RunError::new(root_id.clone(), Error::Timeout(self.output_timeout)))?;
        let index = oper.index();
        if index == output_index {
            let output = oper
                .recv(root.completion())
                .map_err(|_| RunError::new(root_id.clone(), Error::Stopped))?;
            info!("Run from {:?} completed", root_id);
            return Ok(output);
        }
        match error_indices.get(&index) {
            Some((id, instance)) => {
                let error = oper.recv(instance.errors()).unwrap_or(Error::Stopped);
                Err(RunError::new((*id).clone(), error))
            }
            // Every registered operation is either the output or an error channel.
            None => Err(RunError::new(root_id, Error::Stopped)),
        }
    }

    /// Stops all instances. Returns the first error, if any instance failed to stop cleanly.
    pub fn shutdown(self) -> Result<()> {
        let mut result = Ok(());
        for (id, instance) in self.instances {
            self.network.detach(&id);
            if let Err(err) = instance.shutdown() {
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }
        result
    }
}
