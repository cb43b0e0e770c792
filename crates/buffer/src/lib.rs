//! Host text buffer contract for the snippet engine.
//!
//! The engine never owns text. It asks a [`Host`] for [`TextBuffer`]s and keeps
//! only weak [`RangeId`] handles to tracked ranges the buffer maintains. A
//! rope-backed implementation ([`RopeBuffer`], [`MemoryHost`]) is provided for
//! tests and for embedders without a buffer of their own.

/// Host-side traits: buffers, modes, notifications.
pub mod host;
/// In-memory host holding several rope buffers.
pub mod memory;
/// Line/column positions.
pub mod position;
/// Tracked range handles and gravity.
pub mod range;
/// Rope-backed [`TextBuffer`] implementation.
pub mod rope_buffer;

pub use host::{BufferId, Host, Level, Mode, TextBuffer};
pub use memory::MemoryHost;
pub use position::{CharIdx, Position};
pub use range::{Bias, Gravity, RangeId};
pub use rope_buffer::RopeBuffer;
