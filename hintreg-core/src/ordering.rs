//! Per-category preference order between candidates.

use crate::{candidate::Candidate, types::Category};
use std::{collections::HashSet, sync::Arc};

/// Registry-assigned identifier of a stored candidate.
pub type NodeId = usize;

/// A directed "preferred over" relation between candidates of one category.
///
/// The relation is not required to be a total order, and cycles are tolerated.
/// It only breaks ties between candidates that are otherwise equally acceptable.
#[derive(Debug, Clone, Default)]
pub struct OrderingGraph {
    edges: HashSet<(NodeId, NodeId)>,
}

impl OrderingGraph {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `preferred` comes before `other`. Returns whether the edge is new.
    pub fn set(&mut self, preferred: NodeId, other: NodeId) -> bool {
        if preferred == other {
            return false;
        }
        self.edges.insert((preferred, other))
    }

    /// Remove the edge `preferred -> other`. Returns whether it existed.
    pub fn unset(&mut self, preferred: NodeId, other: NodeId) -> bool {
        self.edges.remove(&(preferred, other))
    }

    /// Whether `preferred -> other` was declared directly.
    pub fn prefers(&self, preferred: NodeId, other: NodeId) -> bool {
        self.edges.contains(&(preferred, other))
    }

    /// Number of declared edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether no edge is declared.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Drop every edge touching `node`.
    pub fn forget(&mut self, node: NodeId) {
        self.edges.retain(|(a, b)| *a != node && *b != node);
    }

    /// Order `nodes` (given in registration order) by the declared preferences.
    ///
    /// Among nodes with no pending predecessor, the earliest in `nodes` goes
    /// first, so unrelated nodes keep registration order. When a cycle leaves
    /// no such node, the earliest remaining node is emitted to break it.
    pub fn sort(&self, nodes: &[NodeId]) -> Vec<NodeId> {
        if self.edges.is_empty() {
            return nodes.to_vec();
        }
        let mut remaining: Vec<NodeId> = nodes.to_vec();
        let mut sorted = Vec::with_capacity(nodes.len());
        while !remaining.is_empty() {
            let ready = remaining.iter().position(|&candidate| {
                !remaining
                    .iter()
                    .any(|&other| other != candidate && self.prefers(other, candidate))
            });
            let pick = ready.unwrap_or(0);
            sorted.push(remaining.remove(pick));
        }
        sorted
    }
}

/// Handle given to [`Candidate::declare_ordering`] right after registration.
///
/// The subject is the candidate being registered; peers are the other
/// candidates already registered for the same category.
pub struct Organizer<'a> {
    category: Category,
    subject: NodeId,
    peers: &'a [(NodeId, Arc<dyn Candidate>)],
    graph: &'a mut OrderingGraph,
}

impl<'a> Organizer<'a> {
    /// Create an organizer for `subject` within `category`.
    pub fn new(
        category: Category,
        subject: NodeId,
        peers: &'a [(NodeId, Arc<dyn Candidate>)],
        graph: &'a mut OrderingGraph,
    ) -> Self {
        Self {
            category,
            subject,
            peers,
            graph,
        }
    }

    /// The category being organized.
    pub fn category(&self) -> Category {
        self.category
    }

    /// The other candidates of the category.
    pub fn peers(&self) -> impl Iterator<Item = &dyn Candidate> {
        self.peers.iter().map(|(_, peer)| peer.as_ref())
    }

    /// Prefer the subject over every peer accepted by `filter`.
    ///
    /// Returns the number of new edges.
    pub fn prefer_over<F>(&mut self, filter: F) -> usize
    where
        F: Fn(&dyn Candidate) -> bool,
    {
        let mut added = 0;
        for (id, peer) in self.peers {
            if filter(peer.as_ref()) && self.graph.set(self.subject, *id) {
                added += 1;
            }
        }
        added
    }

    /// Prefer every peer accepted by `filter` over the subject.
    ///
    /// Returns the number of new edges.
    pub fn defer_to<F>(&mut self, filter: F) -> usize
    where
        F: Fn(&dyn Candidate) -> bool,
    {
        let mut added = 0;
        for (id, peer) in self.peers {
            if filter(peer.as_ref()) && self.graph.set(*id, self.subject) {
                added += 1;
            }
        }
        added
    }
}
