use crate::foundation::error::{DeltaError, DeltaResult};

/// Padding applied to a raw frame before residual blocks are cut out of it.
pub const BLEED_MARGIN: u32 = 5;

/// Block size and bleed shared by the residual and merge builders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BlockGeometry {
    /// Side of one block in input-frame pixels.
    pub block_size: u32,
    /// Extra pixels kept around each packed block.
    pub bleed: u32,
}

impl BlockGeometry {
    /// Build a validated geometry.
    pub fn new(block_size: u32, bleed: u32) -> DeltaResult<Self> {
        let g = Self { block_size, bleed };
        g.validate()?;
        Ok(g)
    }

    /// Reject zero block sizes and bleeds wider than the frame margin.
    pub fn validate(&self) -> DeltaResult<()> {
        if self.block_size == 0 {
            return Err(DeltaError::validation("block_size must be non-zero"));
        }
        if self.bleed > BLEED_MARGIN {
            return Err(DeltaError::validation(format!(
                "bleed {} exceeds the {BLEED_MARGIN}px frame margin",
                self.bleed
            )));
        }
        Ok(())
    }

    /// Side of one canvas cell: a block plus bleed on both sides.
    pub fn cell(&self) -> u32 {
        self.block_size + 2 * self.bleed
    }

    /// Side of the square canvas that packs a residual list of `residual_len` integers.
    ///
    /// Cells are laid out on a `floor(sqrt(n/4)) + 1` square grid, which always has room for
    /// `n/4` cells.
    pub fn canvas_side(&self, residual_len: usize) -> u32 {
        let cells = (residual_len / 4).isqrt() + 1;
        cells as u32 * self.cell()
    }
}

impl Default for BlockGeometry {
    fn default() -> Self {
        Self {
            block_size: 30,
            bleed: 1,
        }
    }
}
