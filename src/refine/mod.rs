//! Post-reconstruction refinement passes.
//!
//! A refinement consumes the current image plus its own vector list and returns a possibly
//! modified image. The merge builder runs fade before correction; correction may override fade.

use crate::foundation::error::DeltaResult;
use crate::frame::buffer::Frame;
use crate::vectors::displacement::VectorKind;
use crate::vectors::list::VectorList;

pub mod correction;
pub mod fade;

/// A pluggable post-processor with a fixed input/output contract.
pub trait Refinement: Send + Sync {
    /// Which vector list this pass consumes.
    fn kind(&self) -> VectorKind;

    /// Apply the pass. Empty lists must return `image` untouched.
    fn apply(&self, image: Frame, vectors: &VectorList) -> DeltaResult<Frame>;
}
