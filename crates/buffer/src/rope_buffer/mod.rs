//! Rope-backed buffer with gravity-aware tracked ranges.

use ropey::Rope;
use rustc_hash::FxHashMap;

use crate::host::{BufferId, TextBuffer};
use crate::position::{CharIdx, Position};
use crate::range::{Bias, Gravity, RangeId, map_pos};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tracked {
	start: CharIdx,
	end: CharIdx,
	gravity: Gravity,
}

/// An in-memory [`TextBuffer`] over a [`ropey::Rope`].
#[derive(Debug, Clone)]
pub struct RopeBuffer {
	id: BufferId,
	text: Rope,
	cursor: CharIdx,
	ranges: FxHashMap<RangeId, Tracked>,
	next_range: u64,
	changedtick: u64,
}

impl RopeBuffer {
	pub fn new(id: BufferId, text: &str) -> Self {
		Self {
			id,
			text: Rope::from_str(text),
			cursor: 0,
			ranges: FxHashMap::default(),
			next_range: 0,
			changedtick: 0,
		}
	}

	pub fn len_chars(&self) -> usize {
		self.text.len_chars()
	}

	/// Number of ranges still tracked.
	pub fn tracked_count(&self) -> usize {
		self.ranges.len()
	}

	/// Converts a position to a char offset, clamping to the buffer.
	pub fn pos_to_char(&self, pos: Position) -> CharIdx {
		if pos.line >= self.text.len_lines() {
			return self.text.len_chars();
		}
		let line_start = self.text.line_to_char(pos.line);
		line_start + pos.col.min(self.line_len(pos.line))
	}

	/// Converts a char offset to a position. Offsets past the end clamp to it.
	pub fn char_to_pos(&self, idx: CharIdx) -> Position {
		let idx = idx.min(self.text.len_chars());
		let line = self.text.char_to_line(idx);
		Position::new(line, idx - self.text.line_to_char(line))
	}

	fn line_len(&self, line: usize) -> usize {
		let slice = self.text.line(line);
		let mut len = slice.len_chars();
		if len > 0 && slice.char(len - 1) == '\n' {
			len -= 1;
			if len > 0 && slice.char(len - 1) == '\r' {
				len -= 1;
			}
		}
		len
	}

	/// Inserts text at `pos` the way a user keystroke would.
	pub fn insert(&mut self, pos: Position, text: &str) {
		self.replace(pos, pos, text);
	}

	pub fn delete(&mut self, start: Position, end: Position) {
		self.replace(start, end, "");
	}

	/// Types `text` at the cursor; the cursor ends up after it.
	pub fn type_text(&mut self, text: &str) {
		let at = self.cursor();
		self.replace(at, at, text);
	}

	/// Deletes `count` characters before the cursor.
	pub fn backspace(&mut self, count: usize) {
		let end = self.cursor;
		let start = end.saturating_sub(count);
		let (start, end) = (self.char_to_pos(start), self.char_to_pos(end));
		self.replace(start, end, "");
	}

	/// Swaps the whole content without remapping tracked ranges.
	///
	/// Models an external reload: ranges keep their offsets and may end up
	/// outside the new text.
	pub fn reset_content(&mut self, text: &str) {
		self.text = Rope::from_str(text);
		self.cursor = self.cursor.min(self.text.len_chars());
		self.changedtick += 1;
	}
}

impl TextBuffer for RopeBuffer {
	fn id(&self) -> BufferId {
		self.id
	}

	fn line_count(&self) -> usize {
		self.text.len_lines()
	}

	fn line(&self, idx: usize) -> Option<String> {
		if idx >= self.text.len_lines() {
			return None;
		}
		let start = self.text.line_to_char(idx);
		Some(self.text.slice(start..start + self.line_len(idx)).to_string())
	}

	fn text(&self) -> String {
		self.text.to_string()
	}

	fn cursor(&self) -> Position {
		self.char_to_pos(self.cursor)
	}

	fn set_cursor(&mut self, pos: Position) {
		self.cursor = self.pos_to_char(pos);
	}

	fn changedtick(&self) -> u64 {
		self.changedtick
	}

	fn create_range(&mut self, start: Position, end: Position, gravity: Gravity) -> RangeId {
		let start = self.pos_to_char(start);
		let end = self.pos_to_char(end).max(start);
		let id = RangeId(self.next_range);
		self.next_range += 1;
		self.ranges.insert(id, Tracked { start, end, gravity });
		id
	}

	fn range(&self, id: RangeId) -> Option<(Position, Position)> {
		let tracked = self.ranges.get(&id)?;
		let len = self.text.len_chars();
		if tracked.start > len || tracked.end > len {
			return None;
		}
		Some((self.char_to_pos(tracked.start), self.char_to_pos(tracked.end)))
	}

	fn set_gravity(&mut self, id: RangeId, gravity: Gravity) {
		if let Some(tracked) = self.ranges.get_mut(&id) {
			tracked.gravity = gravity;
		}
	}

	fn release_range(&mut self, id: RangeId) {
		self.ranges.remove(&id);
	}

	fn text_in(&self, start: Position, end: Position) -> String {
		let start = self.pos_to_char(start);
		let end = self.pos_to_char(end).max(start);
		self.text.slice(start..end).to_string()
	}

	fn replace(&mut self, start: Position, end: Position, text: &str) {
		let start = self.pos_to_char(start);
		let end = self.pos_to_char(end).max(start);
		let inserted = text.chars().count();

		if end > start {
			self.text.remove(start..end);
		}
		if inserted > 0 {
			self.text.insert(start, text);
		}

		for tracked in self.ranges.values_mut() {
			let (start_bias, end_bias) = tracked.gravity.biases();
			let new_start = map_pos(tracked.start, start, end, inserted, start_bias);
			let new_end = map_pos(tracked.end, start, end, inserted, end_bias);
			tracked.start = new_start;
			tracked.end = new_end.max(new_start);
		}
		self.cursor = map_pos(self.cursor, start, end, inserted, Bias::Right);
		self.changedtick += 1;
		tracing::trace!(buffer = %self.id, start, end, inserted, tick = self.changedtick, "buffer edit");
	}
}

#[cfg(test)]
mod tests;
