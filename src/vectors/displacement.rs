use crate::foundation::error::{DeltaError, DeltaResult};

/// Category of a per-frame vector list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VectorKind {
    /// Blocks reused from the previous frame.
    Predictive,
    /// Blocks that changed and are packed into the residual canvas.
    Residual,
    /// Small self-copies applied after reconstruction.
    Correction,
    /// Per-block brightness deltas applied after reconstruction.
    Fade,
}

impl VectorKind {
    /// All kinds, in the order the merge stage reads them.
    pub const ALL: [VectorKind; 4] = [
        VectorKind::Predictive,
        VectorKind::Residual,
        VectorKind::Correction,
        VectorKind::Fade,
    ];

    /// Stable lowercase name used in logs and errors.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Predictive => "predictive",
            Self::Residual => "residual",
            Self::Correction => "correction",
            Self::Fade => "fade",
        }
    }

    /// Number of integers that make up one entry of this list.
    pub fn group_size(self) -> usize {
        match self {
            Self::Fade => 3,
            Self::Predictive | Self::Residual | Self::Correction => 4,
        }
    }
}

impl std::fmt::Display for VectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A block displacement in block-grid coordinates.
///
/// The block found at `(src_x, src_y)` in the reference belongs at `(dst_x, dst_y)` in the target.
/// For residual lists `dst` is a cell index in the packed canvas rather than a frame position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DisplacementVector {
    /// Source column.
    pub src_x: u32,
    /// Source row.
    pub src_y: u32,
    /// Destination column.
    pub dst_x: u32,
    /// Destination row.
    pub dst_y: u32,
}

impl DisplacementVector {
    /// Build a vector from its four coordinates.
    pub const fn new(src_x: u32, src_y: u32, dst_x: u32, dst_y: u32) -> Self {
        Self {
            src_x,
            src_y,
            dst_x,
            dst_y,
        }
    }

    /// `true` when source and destination coincide (a no-op copy).
    pub fn is_identity(&self) -> bool {
        self.src_x == self.dst_x && self.src_y == self.dst_y
    }
}

/// Group a flat integer sequence into displacement vectors, four integers at a time.
pub fn parse_vectors(kind: VectorKind, ints: &[i64]) -> DeltaResult<Vec<DisplacementVector>> {
    if !ints.len().is_multiple_of(4) {
        return Err(DeltaError::malformed(kind.as_str(), ints.len(), 4));
    }

    ints.chunks_exact(4)
        .map(|c| {
            Ok(DisplacementVector::new(
                coord(kind, c[0])?,
                coord(kind, c[1])?,
                coord(kind, c[2])?,
                coord(kind, c[3])?,
            ))
        })
        .collect()
}

fn coord(kind: VectorKind, v: i64) -> DeltaResult<u32> {
    u32::try_from(v).map_err(|_| {
        DeltaError::validation(format!(
            "{kind} vector coordinate {v} is outside the non-negative range"
        ))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/vectors/displacement.rs"]
mod tests;
