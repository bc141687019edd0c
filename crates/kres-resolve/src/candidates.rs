//! Resolution candidates and tasks.

use crate::receivers::ReceiverValue;
use kres_types::CallableId;

/// Which receiver slots of a candidate were filled by the receiver written
/// at the call site.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ExplicitReceiverKind {
    NoExplicitReceiver,
    DispatchReceiver,
    ExtensionReceiver,
    BothReceivers,
}

impl ExplicitReceiverKind {
    pub const fn is_dispatch(self) -> bool {
        matches!(self, Self::DispatchReceiver | Self::BothReceivers)
    }

    pub const fn is_extension(self) -> bool {
        matches!(self, Self::ExtensionReceiver | Self::BothReceivers)
    }
}

/// A callable found for a call site, with the receivers it would be called
/// with.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResolutionCandidate {
    pub callable: CallableId,
    pub dispatch_receiver: Option<ReceiverValue>,
    pub extension_receiver: Option<ReceiverValue>,
    pub explicit_receiver_kind: ExplicitReceiverKind,
}

impl ResolutionCandidate {
    pub const fn new(callable: CallableId, explicit_receiver_kind: ExplicitReceiverKind) -> Self {
        Self {
            callable,
            dispatch_receiver: None,
            extension_receiver: None,
            explicit_receiver_kind,
        }
    }

    pub const fn with_dispatch_receiver(mut self, receiver: Option<ReceiverValue>) -> Self {
        self.dispatch_receiver = receiver;
        self
    }

    pub const fn with_extension_receiver(mut self, receiver: Option<ReceiverValue>) -> Self {
        self.extension_receiver = receiver;
        self
    }
}

/// Candidates that overload resolution tries together. Tasks come out of
/// prioritization highest tier first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolutionTask {
    pub tier: u8,
    pub candidates: Vec<ResolutionCandidate>,
}

impl ResolutionTask {
    pub fn callables(&self) -> impl Iterator<Item = CallableId> + '_ {
        self.candidates.iter().map(|c| c.callable)
    }
}
