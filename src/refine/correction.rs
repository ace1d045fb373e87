use crate::foundation::error::{DeltaError, DeltaResult};
use crate::frame::buffer::Frame;
use crate::refine::Refinement;
use crate::vectors::displacement::VectorKind;
use crate::vectors::list::VectorList;

/// Copies small blocks within the image to patch reconstruction artifacts.
///
/// Vectors are in correction-block units. Every copy reads from a snapshot taken before the pass,
/// so one correction never feeds another.
#[derive(Clone, Copy, Debug)]
pub struct Correction {
    block_len: usize,
}

impl Correction {
    /// `block_len` is the correction block side in output pixels.
    pub fn new(block_len: usize) -> DeltaResult<Self> {
        if block_len == 0 {
            return Err(DeltaError::validation(
                "correction block length must be non-zero",
            ));
        }
        Ok(Self { block_len })
    }
}

impl Refinement for Correction {
    fn kind(&self) -> VectorKind {
        VectorKind::Correction
    }

    fn apply(&self, mut image: Frame, vectors: &VectorList) -> DeltaResult<Frame> {
        if vectors.is_empty() {
            return Ok(image);
        }
        let snapshot = image.clone();
        let n = self.block_len;
        for v in vectors.displacements()? {
            let copied = image.try_copy_block(
                &snapshot,
                n,
                v.src_x as usize * n,
                v.src_y as usize * n,
                v.dst_x as usize * n,
                v.dst_y as usize * n,
            );
            if !copied {
                tracing::warn!(vector = ?v, "correction block outside image, skipped");
            }
        }
        Ok(image)
    }
}
