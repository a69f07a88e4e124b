//! # FRACTALIS
//!
//! The main crate, integrating all renderers into one frame loop.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              FRACTALIS                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐   │
//! │  │   shared        │     │   core          │     │   procedural    │   │
//! │  │                 │────>│                 │     │                 │   │
//! │  │  • Math         │     │  • Parts/Levels │     │  • Grid         │   │
//! │  │  • Packed 3x4   │     │  • Propagation  │     │  • Functions    │   │
//! │  │  • Names        │     │  • Worker pool  │     │  • Transitions  │   │
//! │  └─────────────────┘     └────────┬────────┘     └────────┬────────┘   │
//! │                                   │                       │            │
//! │                          ┌────────▼───────────────────────▼────────┐   │
//! │                          │   rendering                             │   │
//! │                          │  • Staging buffers   • Indirect draws   │   │
//! │                          │  • Fractal / Graph / Visualization      │   │
//! │                          └────────────────────┬────────────────────┘   │
//! │                                               │                        │
//! │                                  ┌────────────▼────────────┐           │
//! │                                  │   fractalis (this)      │           │
//! │                                  │  • Settings • FrameLoop │           │
//! │                                  └─────────────────────────┘           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `settings`: TOML run configuration
//! - `frame_loop`: Frame orchestration and timing

pub mod frame_loop;
pub mod settings;

// Re-export the layers
pub use fractalis_core as core;
pub use fractalis_procedural as procedural;
pub use fractalis_rendering as rendering;
pub use fractalis_shared as shared;

// Re-export commonly used types
pub use frame_loop::{
    FrameLoop, FrameStats, FrameStatsAccumulator, OrbitTransform, StaticTransform,
    TransformProvider, MAX_FRAME_TIME, TARGET_FRAME_TIME,
};
pub use settings::{RunSettings, Settings, SettingsError};
