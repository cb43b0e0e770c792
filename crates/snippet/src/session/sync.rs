//! Propagation of the current tabstop's text to its linked occurrences.

use stencil_buffer::{Gravity, TextBuffer};

use super::indent::{dedent, line_indent, reindent};
use super::{Session, SessionError, release_nodes};

impl Session {
	/// Reconciles the buffer after edits to the current tabstop.
	///
	/// Once the reference occurrence has been edited, its placeholder stops
	/// being tracked and its text is copied into every other occurrence,
	/// reindented to that occurrence's line. Text typed in front of an intact
	/// placeholder replaces it; edits inside the placeholder keep its text.
	/// The cursor stays where the user left it, even when a copy starts right
	/// at it. Returns `false` when nothing changed since the last sync or the
	/// placeholder is still intact.
	pub(crate) fn sync<B: TextBuffer>(&mut self, buf: &mut B, leaders: &[String]) -> Result<bool, SessionError> {
		if self.is_synced(buf) {
			return Ok(false);
		}
		let at = buf.cursor();
		let cursor = buf.create_range(at, at, Gravity::Left);
		let synced = self.propagate(buf, leaders);
		if let Some((pos, _)) = buf.range(cursor) {
			buf.set_cursor(pos);
		}
		buf.release_range(cursor);
		synced
	}

	fn propagate<B: TextBuffer>(&mut self, buf: &mut B, leaders: &[String]) -> Result<bool, SessionError> {
		let current = self.current.clone();
		let mut paths = self.occurrences(&current).into_iter();
		let Some(reference) = paths.next() else {
			self.last_synced = buf.changedtick();
			return Ok(false);
		};
		let Some(node) = self.node(&reference) else {
			return Ok(false);
		};
		let range = node.range;

		if let Some(children) = &node.placeholder {
			let own = self.resolve(buf, range)?;
			let span = self.placeholder_span(buf, node)?;
			if own == span {
				if buf.text_in(own.0, own.1) == self.entered {
					self.last_synced = buf.changedtick();
					return Ok(false);
				}
			} else if !children.is_empty() {
				buf.replace(span.0, span.1, "");
			}
			release_nodes(buf, children);
			if let Some(node) = self.node_mut(&reference) {
				node.placeholder = None;
			}
		}

		let (start, end) = self.resolve(buf, range)?;
		let text = buf.text_in(start, end);
		let base = buf.line(start.line).map(|line| line_indent(&line, leaders).to_string()).unwrap_or_default();
		let text = dedent(&text, &base);

		let mut written = 0usize;
		for path in paths {
			let Some(node) = self.node(&path) else {
				continue;
			};
			let range = node.range;
			self.apply_gravity(buf, &path);
			if let Some(node) = self.node_mut(&path)
				&& let Some(children) = node.placeholder.take()
			{
				release_nodes(buf, &children);
			}
			let (start, end) = self.resolve(buf, range)?;
			let indent = buf.line(start.line).map(|line| line_indent(&line, leaders).to_string()).unwrap_or_default();
			let target = reindent(&text, &indent);
			if buf.text_in(start, end) != target {
				buf.replace(start, end, &target);
				written += 1;
			}
		}
		self.apply_gravity(buf, &reference);
		self.last_synced = buf.changedtick();
		tracing::debug!(session = self.id, tabstop = %current, written, "synced linked tabstop");
		Ok(true)
	}
}
