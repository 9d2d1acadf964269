//! Test network errors

use std::fmt::{self, Debug, Display};

use treecast::DistAlgorithm;

use super::NetMessage;

/// Network crank error.
///
/// Errors resulting from processing a single message ("cranking").
pub enum CrankError<D>
where
    D: DistAlgorithm,
{
    /// The algorithm run by the node produced a `DistAlgorithm::Error` while processing input.
    HandleInput { id: D::NodeId, err: D::Error },
    /// The algorithm run by the node produced a `DistAlgorithm::Error` while processing a message.
    HandleMessage {
        /// Network message that triggered the error.
        msg: NetMessage<D>,
        err: D::Error,
    },
    /// A message was addressed to a node that is not part of the network.
    NodeDisappeared(D::NodeId),
    /// The configured maximum number of cranks has been exceeded.
    CrankLimitExceeded(usize),
}

// Deriving `Debug` and `Fail` would require `D` itself to implement them, so these are
// implemented manually.
impl<D> Display for CrankError<D>
where
    D: DistAlgorithm,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CrankError::HandleInput { id, err } => {
                write!(f, "Node {:?} could not process input: {:?}", id, err)
            }
            CrankError::HandleMessage { msg, err } => write!(
                f,
                "The algorithm could not process network message {:?}. Error: {:?}",
                msg, err
            ),
            CrankError::NodeDisappeared(id) => {
                write!(f, "Node {:?} disappeared or never existed.", id)
            }
            CrankError::CrankLimitExceeded(max) => {
                write!(f, "Maximum number of cranks exceeded: {}", max)
            }
        }
    }
}

impl<D> Debug for CrankError<D>
where
    D: DistAlgorithm,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CrankError::HandleInput { id, err } => f
                .debug_struct("HandleInput")
                .field("id", id)
                .field("err", err)
                .finish(),
            CrankError::HandleMessage { msg, err } => f
                .debug_struct("HandleMessage")
                .field("msg", msg)
                .field("err", err)
                .finish(),
            CrankError::NodeDisappeared(id) => {
                f.debug_tuple("NodeDisappeared").field(id).finish()
            }
            CrankError::CrankLimitExceeded(max) => {
                f.debug_tuple("CrankLimitExceeded").field(max).finish()
            }
        }
    }
}

impl<D> failure::Fail for CrankError<D>
where
    D: DistAlgorithm + 'static,
{
    fn cause(&self) -> Option<&dyn failure::Fail> {
        match self {
            CrankError::HandleInput { err, .. } | CrankError::HandleMessage { err, .. } => {
                Some(err)
            }
            _ => None,
        }
    }
}
