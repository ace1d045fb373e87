use crate::build::geometry::BlockGeometry;
use crate::foundation::error::{DeltaError, DeltaResult};
use crate::frame::buffer::Frame;
use crate::refine::Refinement;
use crate::refine::correction::Correction;
use crate::refine::fade::Fade;
use crate::vectors::list::FrameVectors;

/// Rebuilds the next full frame from the previous one and an upscaled residual canvas.
pub struct MergeBuilder {
    geometry: BlockGeometry,
    scale_factor: u32,
    refinements: Vec<Box<dyn Refinement>>,
}

impl std::fmt::Debug for MergeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeBuilder")
            .field("geometry", &self.geometry)
            .field("scale_factor", &self.scale_factor)
            .field(
                "refinements",
                &self.refinements.iter().map(|r| r.kind()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl MergeBuilder {
    /// Builder with the standard refinement chain: fade, then correction.
    pub fn new(
        geometry: BlockGeometry,
        scale_factor: u32,
        correction_block_size: u32,
    ) -> DeltaResult<Self> {
        geometry.validate()?;
        if scale_factor == 0 {
            return Err(DeltaError::validation("scale_factor must be non-zero"));
        }
        let scale = scale_factor as usize;
        let refinements: Vec<Box<dyn Refinement>> = vec![
            Box::new(Fade::new(geometry.block_size as usize * scale)?),
            Box::new(Correction::new(correction_block_size as usize * scale)?),
        ];
        Ok(Self {
            geometry,
            scale_factor,
            refinements,
        })
    }

    /// Replace the refinement chain. Passes run in the given order.
    pub fn with_refinements(mut self, refinements: Vec<Box<dyn Refinement>>) -> Self {
        self.refinements = refinements;
        self
    }

    /// Geometry of the residual canvases this builder unpacks.
    pub fn geometry(&self) -> BlockGeometry {
        self.geometry
    }

    /// Ratio between upscaled and input pixels.
    pub fn scale_factor(&self) -> u32 {
        self.scale_factor
    }

    /// Reconstruct the next frame.
    ///
    /// The output always has `previous`'s dimensions. Vectors that would read or write outside
    /// their images are skipped with a warning rather than aborting the frame.
    #[tracing::instrument(skip_all, fields(
        predictive = vectors.predictive.len(),
        residual = vectors.residual.len(),
    ))]
    pub fn build(
        &self,
        canvas: &Frame,
        previous: &Frame,
        vectors: &FrameVectors,
    ) -> DeltaResult<Frame> {
        // Malformed lists surface before the scene-cut shortcut, so a skipped frame never
        // reaches it with a placeholder canvas.
        let predictive = vectors.predictive.displacements()?;
        let residual = vectors.residual.displacements()?;
        let mut out = Frame::allocate(previous.width(), previous.height());

        if predictive.is_empty() {
            if canvas.dimensions() != out.dimensions() {
                return Err(DeltaError::validation(format!(
                    "full-frame canvas {}x{} does not match the {}x{} output",
                    canvas.width(),
                    canvas.height(),
                    out.width(),
                    out.height()
                )));
            }
            out.copy_whole(canvas);
            return Ok(out);
        }

        // Identity predictive vectors are satisfied by this copy.
        out.copy_whole(previous);

        let scale = self.scale_factor as usize;
        let block = self.geometry.block_size as usize * scale;

        for v in &predictive {
            if v.is_identity() {
                continue;
            }
            let moved = out.try_copy_block(
                previous,
                block,
                v.src_x as usize * block,
                v.src_y as usize * block,
                v.dst_x as usize * block,
                v.dst_y as usize * block,
            );
            if !moved {
                tracing::warn!(vector = ?v, "predictive block outside frame, skipped");
            }
        }

        let cell = self.geometry.cell() as usize * scale;
        let bleed = self.geometry.bleed as usize * scale;
        for v in &residual {
            let unpacked = out.try_copy_block(
                canvas,
                block,
                v.dst_x as usize * cell + bleed,
                v.dst_y as usize * cell + bleed,
                v.src_x as usize * block,
                v.src_y as usize * block,
            );
            if !unpacked {
                tracing::warn!(vector = ?v, "residual cell outside canvas or frame, skipped");
            }
        }

        for pass in &self.refinements {
            out = pass.apply(out, vectors.get(pass.kind()))?;
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/build/merge.rs"]
mod tests;
