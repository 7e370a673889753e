//! Typed edges: relation cardinality, forward/reverse pairing, reversal.
//!
//! Every forward edge declaration implies a reverse edge on the destination
//! type with the `One`/`Many` sides swapped. The schema registry
//! materializes the reverse automatically; this module only models the
//! types and their inversion.

use serde::{Deserialize, Serialize};

/// Cardinality of a typed edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeRelation {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl EdgeRelation {
    /// Inverts the relation: `OneToMany` <-> `ManyToOne`, the symmetric
    /// relations map to themselves.
    pub fn reversed(self) -> Self {
        match self {
            EdgeRelation::OneToOne => EdgeRelation::OneToOne,
            EdgeRelation::OneToMany => EdgeRelation::ManyToOne,
            EdgeRelation::ManyToOne => EdgeRelation::OneToMany,
            EdgeRelation::ManyToMany => EdgeRelation::ManyToMany,
        }
    }

    /// Whether traversing the edge in this direction yields many nodes.
    pub fn is_to_many(self) -> bool {
        matches!(self, EdgeRelation::OneToMany | EdgeRelation::ManyToMany)
    }
}

/// A typed edge between two node types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeT {
    pub source_type: String,
    pub dest_type: String,
    pub relation: EdgeRelation,
}

impl EdgeT {
    pub fn new(source_type: &str, dest_type: &str, relation: EdgeRelation) -> Self {
        EdgeT {
            source_type: source_type.to_string(),
            dest_type: dest_type.to_string(),
            relation,
        }
    }

    /// The same edge seen from the destination type.
    pub fn reversed(&self) -> Self {
        EdgeT {
            source_type: self.dest_type.clone(),
            dest_type: self.source_type.clone(),
            relation: self.relation.reversed(),
        }
    }
}

/// Which direction of the pair a schema entry names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeDirection {
    Forward,
    Reverse,
}

/// A named edge entry on a schema: the typed edge, the paired name on the
/// other side, and whether this entry is the declaring (forward) side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDeclaration {
    pub edge: EdgeT,
    pub paired_name: String,
    pub direction: EdgeDirection,
}

impl EdgeDeclaration {
    pub fn forward(edge: EdgeT, reverse_name: &str) -> Self {
        EdgeDeclaration {
            edge,
            paired_name: reverse_name.to_string(),
            direction: EdgeDirection::Forward,
        }
    }

    pub fn reverse_of(forward: &EdgeDeclaration, forward_name: &str) -> Self {
        EdgeDeclaration {
            edge: forward.edge.reversed(),
            paired_name: forward_name.to_string(),
            direction: EdgeDirection::Reverse,
        }
    }

    /// The name of the forward predicate of this pair, given this entry's
    /// own name on its schema.
    pub fn forward_name<'a>(&'a self, own_name: &'a str) -> &'a str {
        match self.direction {
            EdgeDirection::Forward => own_name,
            EdgeDirection::Reverse => &self.paired_name,
        }
    }
}
