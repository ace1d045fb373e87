use crate::build::geometry::{BLEED_MARGIN, BlockGeometry};
use crate::foundation::error::{DeltaError, DeltaResult};
use crate::frame::buffer::Frame;
use crate::vectors::list::VectorList;

/// What the residual builder decided for one frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResidualOutput {
    /// The frame is identical to its predecessor; nothing needs upscaling.
    NoChange,
    /// A new scene with no usable prediction; the whole frame must be upscaled.
    FullCopy(Frame),
    /// Only changed blocks, packed cell by cell.
    PackedCanvas(Frame),
}

impl ResidualOutput {
    /// The image to hand to the upscaler, if any.
    pub fn frame(&self) -> Option<&Frame> {
        match self {
            Self::NoChange => None,
            Self::FullCopy(f) | Self::PackedCanvas(f) => Some(f),
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoChange => "no-change",
            Self::FullCopy(_) => "full-copy",
            Self::PackedCanvas(_) => "packed",
        }
    }
}

/// Packs the blocks that changed between two frames into a compact canvas.
#[derive(Clone, Copy, Debug)]
pub struct ResidualBuilder {
    geometry: BlockGeometry,
}

impl ResidualBuilder {
    /// Build with a validated geometry.
    pub fn new(geometry: BlockGeometry) -> DeltaResult<Self> {
        geometry.validate()?;
        Ok(Self { geometry })
    }

    /// Geometry this builder packs with.
    pub fn geometry(&self) -> BlockGeometry {
        self.geometry
    }

    /// Decide between no change, a full copy, or a packed canvas for `raw`.
    ///
    /// Each residual vector names a block of `raw` (`src`, block-grid units) and the canvas cell
    /// it is packed into (`dst`). Cells carry `bleed` pixels of surrounding context.
    #[tracing::instrument(skip_all, fields(residual = residual.len(), predictive = predictive.len()))]
    pub fn build(
        &self,
        raw: &Frame,
        residual: &VectorList,
        predictive: &VectorList,
    ) -> DeltaResult<ResidualOutput> {
        // A ragged predictive list spoils the frame for the merge side too.
        predictive.displacements()?;
        if residual.is_empty() && !predictive.is_empty() {
            return Ok(ResidualOutput::NoChange);
        }
        if residual.is_empty() {
            return Ok(ResidualOutput::FullCopy(raw.clone()));
        }

        let vectors = residual.displacements()?;
        let g = self.geometry;
        let bs = g.block_size as usize;
        let cell = g.cell() as usize;
        let shift = (BLEED_MARGIN - g.bleed) as usize;

        let bleeded = raw.bleeded_copy(BLEED_MARGIN);
        let side = g.canvas_side(residual.len());
        let mut canvas = Frame::allocate(side, side);

        for v in &vectors {
            let sx = v.src_x as usize * bs + shift;
            let sy = v.src_y as usize * bs + shift;
            let dx = v.dst_x as usize * cell;
            let dy = v.dst_y as usize * cell;
            if !canvas.try_copy_block(&bleeded, cell, sx, sy, dx, dy) {
                return Err(DeltaError::validation(format!(
                    "residual vector {v:?} does not fit a {}x{} frame / {side}px canvas",
                    raw.width(),
                    raw.height()
                )));
            }
        }

        tracing::debug!(blocks = vectors.len(), side, "packed residual canvas");
        Ok(ResidualOutput::PackedCanvas(canvas))
    }

    /// Copy of `raw` with every residual block blacked out, for eyeballing what needs upscaling.
    pub fn debug_image(&self, raw: &Frame, residual: &VectorList) -> DeltaResult<Frame> {
        let mut out = raw.clone();
        let bs = self.geometry.block_size as usize;
        for v in residual.displacements()? {
            out.fill_block(bs, v.src_x as usize * bs, v.src_y as usize * bs, [0, 0, 0]);
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/build/residual.rs"]
mod tests;
