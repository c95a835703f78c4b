//! The connection-creation gesture.
//!
//! Dragging from one node to another does not create a connection by itself;
//! it leaves the store waiting for the user to pick a relationship type. The
//! gesture then ends in exactly one [`GestureOutcome`] and returns to
//! [`ConnectionGesture::Idle`].

use kinro_core::identifier::Id;

use crate::view::EdgeView;

/// State of the connection-creation gesture.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ConnectionGesture {
    #[default]
    Idle,
    PendingRelationshipChoice {
        source: Id,
        target: Id,
    },
}

impl ConnectionGesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, ConnectionGesture::Idle)
    }

    /// Returns the pending `(source, target)` pair, if any.
    pub fn pending(&self) -> Option<(&Id, &Id)> {
        match self {
            ConnectionGesture::Idle => None,
            ConnectionGesture::PendingRelationshipChoice { source, target } => {
                Some((source, target))
            }
        }
    }
}

/// How a connection gesture ended.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// The backend created the connection and it is present in the view.
    Committed(EdgeView),
    /// The user cancelled before choosing a relationship type.
    Aborted,
    /// A connection between the pair already existed; nothing was sent.
    Rejected { source: Id, target: Id },
}
