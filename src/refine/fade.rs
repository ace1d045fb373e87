use crate::foundation::error::{DeltaError, DeltaResult};
use crate::frame::buffer::Frame;
use crate::refine::Refinement;
use crate::vectors::displacement::VectorKind;
use crate::vectors::list::VectorList;

/// Adds a signed brightness delta to whole blocks.
///
/// Entries are `(block_x, block_y, delta)` triples in block-grid units. Channels saturate at
/// `0..=255`.
#[derive(Clone, Copy, Debug)]
pub struct Fade {
    block_len: usize,
}

impl Fade {
    /// `block_len` is the block side in output pixels (block size times scale factor).
    pub fn new(block_len: usize) -> DeltaResult<Self> {
        if block_len == 0 {
            return Err(DeltaError::validation("fade block length must be non-zero"));
        }
        Ok(Self { block_len })
    }
}

impl Refinement for Fade {
    fn kind(&self) -> VectorKind {
        VectorKind::Fade
    }

    fn apply(&self, mut image: Frame, vectors: &VectorList) -> DeltaResult<Frame> {
        for entry in vectors.groups()? {
            let (bx, by, delta) = (entry[0], entry[1], entry[2]);
            let origin = usize::try_from(bx)
                .ok()
                .zip(usize::try_from(by).ok())
                .and_then(|(x, y)| {
                    Some((x.checked_mul(self.block_len)?, y.checked_mul(self.block_len)?))
                });
            let applied = origin.is_some_and(|(x, y)| {
                image.map_block(self.block_len, x, y, |c| {
                    i64::from(c).saturating_add(delta).clamp(0, 255) as u8
                })
            });
            if !applied {
                tracing::warn!(bx, by, "fade block outside image, skipped");
            }
        }
        Ok(image)
    }
}
