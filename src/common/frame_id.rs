//! Frame identifier type.

use std::fmt;

/// Identifies a frame in the buffer pool.
///
/// Frames live in a fixed `Vec<Frame>` that is never reallocated, so a
/// `FrameId` is a plain index: `frames[frame_id.0]`.
///
/// # Example
/// ```
/// use pagepool::FrameId;
///
/// let frame_id = FrameId::new(5);
/// assert_eq!(frame_id.0, 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub usize);

impl FrameId {
    /// Create a new FrameId.
    #[inline]
    pub fn new(id: usize) -> Self {
        FrameId(id)
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({})", self.0)
    }
}
