use crate::position::Position;
use crate::range::{Gravity, RangeId};

/// Identifier of a buffer owned by a [`Host`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u64);

impl std::fmt::Display for BufferId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "buffer#{}", self.0)
	}
}

/// Editing mode reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
	#[default]
	Insert,
	Normal,
}

/// Severity of a user-visible notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
	Info,
	Warn,
	Error,
}

/// A text buffer that can track ranges across edits.
///
/// All positions are zero-based and counted in characters. Lines are separated
/// by `\n`; a trailing newline yields an empty last line.
pub trait TextBuffer {
	fn id(&self) -> BufferId;

	/// Number of lines, including the empty line after a trailing newline.
	fn line_count(&self) -> usize;

	/// Content of line `idx` without its line terminator.
	fn line(&self, idx: usize) -> Option<String>;

	fn text(&self) -> String;

	fn cursor(&self) -> Position;

	fn set_cursor(&mut self, pos: Position);

	/// Monotonic counter bumped by every edit.
	fn changedtick(&self) -> u64;

	/// Starts tracking `[start, end)`.
	fn create_range(&mut self, start: Position, end: Position, gravity: Gravity) -> RangeId;

	/// Current extent of a tracked range.
	///
	/// Returns `None` for released handles and for ranges that no longer fit in
	/// the buffer.
	fn range(&self, id: RangeId) -> Option<(Position, Position)>;

	fn set_gravity(&mut self, id: RangeId, gravity: Gravity);

	fn release_range(&mut self, id: RangeId);

	/// Text between two positions.
	fn text_in(&self, start: Position, end: Position) -> String;

	/// Replaces `[start, end)` with `text`, mapping every tracked range through
	/// the edit according to its gravity.
	fn replace(&mut self, start: Position, end: Position, text: &str);

	/// Text currently covered by a tracked range.
	fn range_text(&self, id: RangeId) -> Option<String> {
		let (start, end) = self.range(id)?;
		Some(self.text_in(start, end))
	}
}

/// The editor embedding the snippet engine.
pub trait Host {
	type Buffer: TextBuffer;

	/// Returns `None` once the buffer is gone.
	fn buffer(&self, id: BufferId) -> Option<&Self::Buffer>;

	fn buffer_mut(&mut self, id: BufferId) -> Option<&mut Self::Buffer>;

	fn mode(&self) -> Mode;

	/// True while the host is inside a callback that forbids buffer edits.
	fn edits_locked(&self) -> bool {
		false
	}

	/// Shows a message to the user.
	fn notify(&mut self, level: Level, message: &str);
}
