use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{DeltaError, DeltaResult};
use crate::vectors::displacement::{DisplacementVector, VectorKind, parse_vectors};

/// One per-frame vector list as written by the external producer.
///
/// Lists are written once and never mutated, so this type only exposes read access.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VectorList {
    kind: VectorKind,
    values: Vec<i64>,
}

impl VectorList {
    /// Wrap an already parsed integer sequence.
    pub fn new(kind: VectorKind, values: Vec<i64>) -> Self {
        Self { kind, values }
    }

    /// An empty list of the given kind.
    pub fn empty(kind: VectorKind) -> Self {
        Self::new(kind, Vec::new())
    }

    /// Parse the text format: integers separated by whitespace and/or commas.
    pub fn parse(kind: VectorKind, text: &str) -> DeltaResult<Self> {
        let values = text
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|tok| !tok.is_empty())
            .map(|tok| {
                tok.parse::<i64>().map_err(|_| {
                    DeltaError::validation(format!("invalid integer '{tok}' in {kind} list"))
                })
            })
            .collect::<DeltaResult<Vec<_>>>()?;
        Ok(Self { kind, values })
    }

    /// Read and parse a list file.
    pub fn read(kind: VectorKind, path: &Path) -> DeltaResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read {kind} list '{}'", path.display()))?;
        Self::parse(kind, &text)
    }

    /// Which category this list belongs to.
    pub fn kind(&self) -> VectorKind {
        self.kind
    }

    /// Raw integers in producer order.
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    /// Number of raw integers.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` when the producer emitted no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Group the integers into displacement vectors.
    pub fn displacements(&self) -> DeltaResult<Vec<DisplacementVector>> {
        parse_vectors(self.kind, &self.values)
    }

    /// Split the integers into groups of the kind's size, failing on a ragged tail.
    pub fn groups(&self) -> DeltaResult<std::slice::ChunksExact<'_, i64>> {
        let group = self.kind.group_size();
        if !self.values.len().is_multiple_of(group) {
            return Err(DeltaError::malformed(
                self.kind.as_str(),
                self.values.len(),
                group,
            ));
        }
        Ok(self.values.chunks_exact(group))
    }
}

/// The four lists the producer emits for one frame transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameVectors {
    /// Blocks reused from the previous frame.
    pub predictive: VectorList,
    /// Blocks packed into the residual canvas.
    pub residual: VectorList,
    /// Post-merge self-copies.
    pub correction: VectorList,
    /// Post-merge brightness deltas.
    pub fade: VectorList,
}

impl FrameVectors {
    /// All four lists empty.
    pub fn empty() -> Self {
        Self {
            predictive: VectorList::empty(VectorKind::Predictive),
            residual: VectorList::empty(VectorKind::Residual),
            correction: VectorList::empty(VectorKind::Correction),
            fade: VectorList::empty(VectorKind::Fade),
        }
    }

    /// The list of the given kind.
    pub fn get(&self, kind: VectorKind) -> &VectorList {
        match kind {
            VectorKind::Predictive => &self.predictive,
            VectorKind::Residual => &self.residual,
            VectorKind::Correction => &self.correction,
            VectorKind::Fade => &self.fade,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/vectors/list.rs"]
mod tests;
