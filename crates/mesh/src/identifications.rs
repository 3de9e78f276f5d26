use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use brep_geometry::IdentificationKind;

use crate::types::PointIndex;

/// One identified point pair, tagged with the identification it belongs
/// to (1-based number into the name table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifiedPair {
    pub pi1: PointIndex,
    pub pi2: PointIndex,
    pub nr: usize,
}

/// The mesh-level identification table: append-only pairs of point
/// indices, grouped by named identifications.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshIdentifications {
    pairs: Vec<IdentifiedPair>,
    names: Vec<(String, IdentificationKind)>,
    #[serde(skip)]
    name_index: HashMap<String, usize>,
}

impl MeshIdentifications {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the pair under the named identification, creating the
    /// name entry on first use. Re-adding an existing pair (in either
    /// orientation) is a no-op, so mirrored records collapse.
    pub fn add(&mut self, pi1: PointIndex, pi2: PointIndex, name: &str, kind: IdentificationKind) {
        let nr = match self.name_index.get(name) {
            Some(&nr) => nr,
            None => {
                self.names.push((name.to_string(), kind));
                let nr = self.names.len();
                self.name_index.insert(name.to_string(), nr);
                nr
            }
        };
        let exists = self.pairs.iter().any(|p| {
            p.nr == nr && ((p.pi1 == pi1 && p.pi2 == pi2) || (p.pi1 == pi2 && p.pi2 == pi1))
        });
        if !exists {
            self.pairs.push(IdentifiedPair { pi1, pi2, nr });
        }
    }

    pub fn pairs(&self) -> &[IdentifiedPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn kind_of(&self, nr: usize) -> Option<IdentificationKind> {
        self.names.get(nr - 1).map(|(_, k)| *k)
    }

    pub fn contains(&self, pi1: PointIndex, pi2: PointIndex) -> bool {
        self.pairs
            .iter()
            .any(|p| (p.pi1 == pi1 && p.pi2 == pi2) || (p.pi1 == pi2 && p.pi2 == pi1))
    }

    /// Partner points of `pi` across all identifications.
    pub fn partners_of(&self, pi: PointIndex) -> Vec<PointIndex> {
        let mut out = Vec::new();
        for p in &self.pairs {
            if p.pi1 == pi {
                out.push(p.pi2);
            } else if p.pi2 == pi {
                out.push(p.pi1);
            }
        }
        out
    }
}
