//! Context for one reasoning loop run.
//!
//! | Piece | Source | Lifetime |
//! |-------|--------|----------|
//! | [`MemoryWindow`] | Host message log | Rebuilt every turn |
//! | [`Transcript`] | Model replies and tool observations | One loop run |

pub mod transcript;
pub mod window;

pub use transcript::{TraceEntry, TraceKind, Transcript};
pub use window::{MemoryWindow, WindowSettings};
