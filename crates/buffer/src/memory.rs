//! An in-memory [`Host`] over [`RopeBuffer`]s.

use std::collections::BTreeMap;

use crate::host::{BufferId, Host, Level, Mode};
use crate::rope_buffer::RopeBuffer;

#[derive(Debug, Default)]
pub struct MemoryHost {
	buffers: BTreeMap<BufferId, RopeBuffer>,
	next_id: u64,
	mode: Mode,
	locked: bool,
	/// Every notification shown so far.
	pub notifications: Vec<(Level, String)>,
}

impl MemoryHost {
	pub fn new() -> Self {
		Self::default()
	}

	/// Opens a new buffer with `text` and returns its id.
	pub fn open(&mut self, text: &str) -> BufferId {
		self.next_id += 1;
		let id = BufferId(self.next_id);
		self.buffers.insert(id, RopeBuffer::new(id, text));
		id
	}

	/// Drops a buffer; later lookups return `None`.
	pub fn close(&mut self, id: BufferId) -> Option<RopeBuffer> {
		self.buffers.remove(&id)
	}

	pub fn set_mode(&mut self, mode: Mode) {
		self.mode = mode;
	}

	pub fn set_edits_locked(&mut self, locked: bool) {
		self.locked = locked;
	}

	/// Full text of a buffer, or an empty string if it is gone.
	pub fn text(&self, id: BufferId) -> String {
		self.buffers.get(&id).map(|buffer| crate::TextBuffer::text(buffer)).unwrap_or_default()
	}
}

impl Host for MemoryHost {
	type Buffer = RopeBuffer;

	fn buffer(&self, id: BufferId) -> Option<&RopeBuffer> {
		self.buffers.get(&id)
	}

	fn buffer_mut(&mut self, id: BufferId) -> Option<&mut RopeBuffer> {
		self.buffers.get_mut(&id)
	}

	fn mode(&self) -> Mode {
		self.mode
	}

	fn edits_locked(&self) -> bool {
		self.locked
	}

	fn notify(&mut self, level: Level, message: &str) {
		self.notifications.push((level, message.to_string()));
	}
}
