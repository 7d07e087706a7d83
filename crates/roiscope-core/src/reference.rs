//! Reference resolution lookup.

use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Width/height normalized coordinates are interpreted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceResolution {
    pub width: u32,
    pub height: u32,
}

impl ReferenceResolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Prefer the detector's configured input size, falling back to the
    /// channel's native capture resolution until a detector config exists.
    pub fn resolve(detector_input: Option<(u32, u32)>, native: (u32, u32)) -> Self {
        match detector_input {
            Some((w, h)) if w > 0 && h > 0 => Self::new(w, h),
            _ => {
                log::debug!("No detector input size, using native {}x{}", native.0, native.1);
                Self::new(native.0, native.1)
            }
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }
}

impl From<ReferenceResolution> for Size {
    fn from(r: ReferenceResolution) -> Self {
        r.size()
    }
}
