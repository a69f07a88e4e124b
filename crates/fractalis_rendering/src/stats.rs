//! Per-frame rendering statistics.

use std::ops::AddAssign;

/// Work issued by one renderer in one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Indirect draws issued.
    pub draw_calls: u32,
    /// Instances across all draws.
    pub instances: u64,
    /// Buffer uploads.
    pub uploads: u32,
    /// Bytes uploaded.
    pub bytes_uploaded: u64,
    /// Compute dispatches.
    pub dispatches: u32,
    /// Whether data was recomputed this frame.
    pub recomputed: bool,
}

impl RenderStats {
    /// Records one upload of `bytes`.
    pub fn record_upload(&mut self, bytes: usize) {
        self.uploads += 1;
        self.bytes_uploaded += bytes as u64;
    }

    /// Records one draw of `instances`.
    pub fn record_draw(&mut self, instances: u32) {
        self.draw_calls += 1;
        self.instances += u64::from(instances);
    }
}

impl AddAssign for RenderStats {
    fn add_assign(&mut self, rhs: Self) {
        self.draw_calls += rhs.draw_calls;
        self.instances += rhs.instances;
        self.uploads += rhs.uploads;
        self.bytes_uploaded += rhs.bytes_uploaded;
        self.dispatches += rhs.dispatches;
        self.recomputed |= rhs.recomputed;
    }
}
