use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};
use log::{debug, error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{codec, Error, Params, Result, Transport};
use crate::tree_aggregate::{Aggregator, Message, Step, TreeAggregate};
use crate::{DistAlgorithm, NodeIdT, SourcedMessage, TargetedMessage};

/// The routing entry point of a node: accepts encoded messages from the network.
pub trait Inbox<N>: Send + Sync {
    /// Decodes `bytes`, received from `sender`, and queues the message for its handler.
    ///
    /// Fails with `UnknownMessageKind` if the frame's kind is not recognized. Later messages are
    /// still accepted.
    fn deliver_raw(&self, sender: N, bytes: &[u8]) -> Result<()>;
}

/// The sending side of a dispatcher's inbound channels, one per message kind.
pub struct Mailbox<N, A: Aggregator<N>> {
    announce_tx: Sender<SourcedMessage<A::Payload, N>>,
    reply_tx: Sender<SourcedMessage<A::Value, N>>,
}

impl<N, A: Aggregator<N>> Clone for Mailbox<N, A> {
    fn clone(&self) -> Self {
        Mailbox {
            announce_tx: self.announce_tx.clone(),
            reply_tx: self.reply_tx.clone(),
        }
    }
}

impl<N, A: Aggregator<N>> Mailbox<N, A> {
    /// Queues `message`, received from `sender`, on the channel for its kind.
    pub fn deliver(&self, sender: N, message: Message<A::Payload, A::Value>) -> Result<()> {
        match message {
            Message::Announce(payload) => self
                .announce_tx
                .send(SourcedMessage::new(sender, payload))
                .map_err(|_| Error::Stopped),
            Message::Reply(value) => self
                .reply_tx
                .send(SourcedMessage::new(sender, value))
                .map_err(|_| Error::Stopped),
        }
    }
}

impl<N, A> Inbox<N> for Mailbox<N, A>
where
    N: NodeIdT,
    A: Aggregator<N>,
    A::Payload: DeserializeOwned,
    A::Value: DeserializeOwned,
{
    fn deliver_raw(&self, sender: N, bytes: &[u8]) -> Result<()> {
        let message = codec::decode(bytes)?;
        self.deliver(sender, message)
    }
}

/// A request to start the run, answered with the result.
struct StartRequest<P> {
    payload: P,
    result_tx: Sender<Result<()>>,
}

/// Runs a `TreeAggregate` instance on its own thread.
///
/// The thread waits until a start request, an `Announce`, a `Reply` or the stop signal is
/// pending, and handles exactly one of them before waiting again. Announcements and replies
/// arrive on separate channels; if both are ready, either may be handled first.
///
/// Failures while handling a message are logged and published on `errors()`; the dispatcher
/// keeps running. Faults are logged and counted. At the root, the aggregate is published on
/// `completion()`.
pub struct Dispatcher<N, A: Aggregator<N>> {
    our_id: N,
    mailbox: Mailbox<N, A>,
    start_tx: Sender<StartRequest<A::Payload>>,
    stop_tx: Sender<()>,
    output_rx: Receiver<A::Value>,
    error_rx: Receiver<Error>,
    fault_count: Arc<AtomicUsize>,
    output_timeout: Duration,
    thread: Option<JoinHandle<TreeAggregate<N, A>>>,
}

impl<N, A> Dispatcher<N, A>
where
    N: NodeIdT + 'static,
    A: Aggregator<N> + 'static,
    A::Payload: Serialize,
    A::Value: Serialize,
{
    /// Creates the inbound channels of `algorithm` and spawns its dispatcher thread. Outgoing
    /// messages are sent through `transport`.
    pub fn spawn<T>(algorithm: TreeAggregate<N, A>, transport: T, params: &Params) -> Result<Self>
    where
        T: Transport<N> + 'static,
    {
        let (announce_tx, announce_rx) = channel(params.inbox_capacity);
        let (reply_tx, reply_rx) = channel(params.inbox_capacity);
        let (start_tx, start_rx) = unbounded();
        let (stop_tx, stop_rx) = bounded(1);
        // Only the root outputs, and only once.
        let (output_tx, output_rx) = bounded(1);
        let (error_tx, error_rx) = unbounded();
        let fault_count = Arc::new(AtomicUsize::new(0));

        let our_id = algorithm.our_id().clone();
        let worker = Worker {
            algorithm,
            transport,
            output_tx,
            error_tx,
            fault_count: fault_count.clone(),
        };
        let inbound = Inbound {
            start_rx,
            announce_rx,
            reply_rx,
            stop_rx,
        };
        let thread = thread::Builder::new()
            .name(format!("{}-{:?}", params.thread_name, our_id))
            .spawn(move || worker.run(inbound))
            .map_err(Error::Spawn)?;

        Ok(Dispatcher {
            our_id,
            mailbox: Mailbox {
                announce_tx,
                reply_tx,
            },
            start_tx,
            stop_tx,
            output_rx,
            error_rx,
            fault_count,
            output_timeout: params.output_timeout,
            thread: Some(thread),
        })
    }

    /// Starts the run with `payload` and returns once the announcements have been sent. Only
    /// valid at the root.
    pub fn start(&self, payload: A::Payload) -> Result<()> {
        let (result_tx, result_rx) = bounded(1);
        let request = StartRequest { payload, result_tx };
        self.start_tx.send(request).map_err(|_| Error::Stopped)?;
        result_rx.recv().map_err(|_| Error::Stopped)?
    }

    /// Waits for the completion value. Fails if handling a message failed first, or on timeout.
    pub fn wait_output(&self) -> Result<A::Value> {
        select! {
            recv(self.output_rx) -> value => value.map_err(|_| Error::Stopped),
            recv(self.error_rx) -> err => Err(err.unwrap_or(Error::Stopped)),
            default(self.output_timeout) => Err(Error::Timeout(self.output_timeout)),
        }
    }
}

impl<N, A: Aggregator<N>> Dispatcher<N, A> {
    /// Returns the ID of the node this dispatcher runs for.
    pub fn our_id(&self) -> &N {
        &self.our_id
    }

    /// Returns a handle to deliver messages to this dispatcher.
    pub fn mailbox(&self) -> Mailbox<N, A> {
        self.mailbox.clone()
    }

    /// Queues `message`, received from `sender`.
    pub fn deliver(&self, sender: N, message: Message<A::Payload, A::Value>) -> Result<()> {
        self.mailbox.deliver(sender, message)
    }

    /// The channel on which the root publishes its aggregate.
    pub fn completion(&self) -> &Receiver<A::Value> {
        &self.output_rx
    }

    /// The channel on which failures to handle a message are published.
    pub fn errors(&self) -> &Receiver<Error> {
        &self.error_rx
    }

    /// Returns the number of faults detected so far.
    pub fn fault_count(&self) -> usize {
        self.fault_count.load(Ordering::SeqCst)
    }

    /// Stops the dispatcher thread and returns the final state of the instance.
    pub fn stop(mut self) -> Result<TreeAggregate<N, A>> {
        self.join()
    }

    fn join(&mut self) -> Result<TreeAggregate<N, A>> {
        // The channel has room for one signal. If it is full, a stop is already pending.
        let _ = self.stop_tx.try_send(());
        let thread = self.thread.take().ok_or(Error::Stopped)?;
        thread.join().map_err(|_| Error::Panicked)
    }
}

impl<N, A: Aggregator<N>> Drop for Dispatcher<N, A> {
    fn drop(&mut self) {
        if self.thread.is_some() {
            let _ = self.join();
        }
    }
}

fn channel<T>(capacity: Option<usize>) -> (Sender<T>, Receiver<T>) {
    match capacity {
        Some(cap) => bounded(cap),
        None => unbounded(),
    }
}

/// The receiving sides, owned by the dispatcher thread.
struct Inbound<N, A: Aggregator<N>> {
    start_rx: Receiver<StartRequest<A::Payload>>,
    announce_rx: Receiver<SourcedMessage<A::Payload, N>>,
    reply_rx: Receiver<SourcedMessage<A::Value, N>>,
    stop_rx: Receiver<()>,
}

/// The instance and everything its handlers write to, owned by the dispatcher thread.
struct Worker<N, A: Aggregator<N>, T> {
    algorithm: TreeAggregate<N, A>,
    transport: T,
    output_tx: Sender<A::Value>,
    error_tx: Sender<Error>,
    fault_count: Arc<AtomicUsize>,
}

impl<N, A, T> Worker<N, A, T>
where
    N: NodeIdT,
    A: Aggregator<N>,
    A::Payload: Serialize,
    A::Value: Serialize,
    T: Transport<N>,
{
    /// The dispatcher loop. Returns the instance once stopped.
    fn run(mut self, inbound: Inbound<N, A>) -> TreeAggregate<N, A> {
        debug!("{}: Dispatcher started", self.algorithm);
        // A disconnected channel means the `Dispatcher` handle is gone.
        loop {
            select! {
                recv(inbound.stop_rx) -> _ => break,
                recv(inbound.start_rx) -> request => match request {
                    Ok(StartRequest { payload, result_tx }) => {
                        let result = self.start(payload);
                        // The caller may have given up waiting.
                        let _ = result_tx.send(result);
                    }
                    Err(_) => break,
                },
                recv(inbound.announce_rx) -> msg => match msg {
                    Ok(SourcedMessage { source, message }) => {
                        debug!("{}: Got Announce from {:?}", self.algorithm, source);
                        self.handle_message(&source, Message::Announce(message));
                    }
                    Err(_) => break,
                },
                recv(inbound.reply_rx) -> msg => match msg {
                    Ok(SourcedMessage { source, message }) => {
                        debug!("{}: Got Reply from {:?}", self.algorithm, source);
                        self.handle_message(&source, Message::Reply(message));
                    }
                    Err(_) => break,
                },
            }
        }
        debug!("{}: Dispatcher stopped", self.algorithm);
        self.algorithm
    }

    fn start(&mut self, payload: A::Payload) -> Result<()> {
        let step = self.algorithm.start(payload)?;
        self.process_step(step)
    }

    fn handle_message(&mut self, sender_id: &N, message: Message<A::Payload, A::Value>) {
        let kind = message.kind();
        let result = match self.algorithm.handle_message(sender_id, message) {
            Ok(step) => self.process_step(step),
            Err(err) => Err(err.into()),
        };
        if let Err(err) = result {
            error!(
                "{}: Failed to handle {} from {:?}: {}",
                self.algorithm, kind, sender_id, err
            );
            if self.error_tx.send(err).is_err() {
                debug!("{}: Nobody is listening for errors", self.algorithm);
            }
        }
    }

    /// Logs the faults, publishes the output and sends the messages, stopping at the first
    /// message that can't be sent.
    fn process_step(&mut self, step: Step<N, A>) -> Result<()> {
        for fault in step.fault_log {
            warn!(
                "{}: Node {:?} is faulty: {}",
                self.algorithm, fault.node_id, fault.kind
            );
            self.fault_count.fetch_add(1, Ordering::SeqCst);
        }
        for output in step.output {
            debug!("{}: Publishing {:?}", self.algorithm, output);
            if self.output_tx.try_send(output).is_err() {
                warn!("{}: Completion value already published", self.algorithm);
            }
        }
        for TargetedMessage { target, message } in step.messages {
            let bytes = codec::encode(&message)?;
            self.transport.send_to(&target, bytes)?;
        }
        Ok(())
    }
}
