//! Live snippet sessions.
//!
//! A session mirrors a normalized node tree onto tracked ranges in one host
//! buffer. Every node (text nodes included) owns a range; the buffer keeps
//! them in place while the user types, and the session reads them back to
//! decide what was edited.
//!
//! Range gravity is always assigned relative to the node being typed into:
//! the active node and its ancestors expand, nodes before it keep still and
//! nodes after it (its own placeholder included) are pushed forward. That is
//! what keeps adjacent, possibly empty, sibling ranges from swallowing each
//! other's keystrokes.

mod indent;
mod sync;

use rustc_hash::FxHashSet;
use stencil_buffer::{BufferId, Gravity, Position, RangeId, TextBuffer};

pub use self::indent::{dedent, line_indent, reindent};
use crate::graph::TabstopGraph;
use crate::node::{Node, Tabstop, TabstopId, Transform, Var, render_default};

/// A session whose tracked ranges no longer describe the buffer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
	#[error("snippet session in {buffer} is corrupt: {reason}")]
	Corrupt { buffer: BufferId, reason: String },
}

#[derive(Debug, Clone)]
pub(crate) enum LiveKind {
	Text,
	Tabstop {
		id: TabstopId,
		choices: Option<Vec<String>>,
		transform: Option<Transform>,
	},
	Var {
		name: String,
		transform: Option<Transform>,
	},
}

#[derive(Debug, Clone)]
pub(crate) struct LiveNode {
	kind: LiveKind,
	range: RangeId,
	placeholder: Option<Vec<LiveNode>>,
}

impl LiveNode {
	fn tabstop_id(&self) -> Option<&TabstopId> {
		match &self.kind {
			LiveKind::Tabstop { id, .. } => Some(id),
			_ => None,
		}
	}
}

/// One active snippet expansion.
#[derive(Debug)]
pub struct Session {
	id: u64,
	buffer: BufferId,
	nodes: Vec<LiveNode>,
	extent: RangeId,
	graph: TabstopGraph,
	current: TabstopId,
	hidden: bool,
	/// Text of the current reference node when focus arrived.
	entered: String,
	last_synced: u64,
}

/// Node tree rebuilt from the buffer, as the user currently sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
	pub session: u64,
	pub buffer: BufferId,
	pub current: TabstopId,
	pub hidden: bool,
	pub nodes: Vec<Node>,
}

impl SessionSnapshot {
	/// Text covered by the session.
	pub fn text(&self) -> String {
		render_default(&self.nodes)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecorationKind {
	Current,
	Visited,
	Unvisited,
	Final,
}

/// What the host should draw over one tabstop occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
	pub id: TabstopId,
	pub start: Position,
	pub end: Position,
	pub kind: DecorationKind,
}

impl Session {
	/// Inserts `nodes` at the buffer cursor and starts tracking them.
	///
	/// Every `\n` emitted is followed by the indent of the cursor line. The
	/// first tabstop in traversal order becomes current but the cursor is not
	/// moved; callers focus it once the session is registered.
	pub(crate) fn insert<B: TextBuffer>(id: u64, buf: &mut B, nodes: &[Node], leaders: &[String]) -> Self {
		let at = buf.cursor();
		let indent = buf
			.line(at.line)
			.map(|line| line_indent(&line, leaders).to_string())
			.unwrap_or_default();

		let mut layout = Layout {
			text: String::new(),
			pos: at,
			indent: &indent,
			indent_width: indent.chars().count(),
		};
		let laid = layout.nodes(nodes);
		buf.replace(at, at, &layout.text);

		let live = attach(buf, laid);
		let extent = buf.create_range(at, layout.pos, Gravity::Expand);
		let graph = TabstopGraph::build(nodes);
		let current = graph.first(|_| true).unwrap_or_else(TabstopId::final_stop);
		tracing::debug!(session = id, buffer = %buf.id(), %at, chars = layout.text.chars().count(), "inserted snippet");

		let session = Self {
			id,
			buffer: buf.id(),
			nodes: live,
			extent,
			graph,
			current,
			hidden: false,
			entered: String::new(),
			last_synced: buf.changedtick(),
		};
		if let Some(path) = session.reference_path(&session.current) {
			session.apply_gravity(buf, &path);
		}
		session
	}

	pub fn id(&self) -> u64 {
		self.id
	}

	pub fn buffer(&self) -> BufferId {
		self.buffer
	}

	pub fn current(&self) -> &TabstopId {
		&self.current
	}

	pub fn graph(&self) -> &TabstopGraph {
		&self.graph
	}

	pub fn is_hidden(&self) -> bool {
		self.hidden
	}

	pub(crate) fn set_hidden(&mut self, hidden: bool) {
		self.hidden = hidden;
	}

	/// Choices offered by the current tabstop, if it has any.
	pub fn current_choices(&self) -> Option<&[String]> {
		let path = self.reference_path(&self.current)?;
		match &self.node(&path)?.kind {
			LiveKind::Tabstop { choices, .. } => choices.as_deref(),
			_ => None,
		}
	}

	/// Current extent of the whole expansion.
	pub fn extent<B: TextBuffer>(&self, buf: &B) -> Option<(Position, Position)> {
		buf.range(self.extent)
	}

	/// Tabstop ids still reachable in the live tree.
	pub fn present_ids(&self) -> FxHashSet<TabstopId> {
		let mut ids = FxHashSet::default();
		walk_live(&self.nodes, &mut |node| {
			if let Some(id) = node.tabstop_id() {
				ids.insert(id.clone());
			}
		});
		ids
	}

	/// Checks that the buffer still exists and every tracked range resolves
	/// inside it.
	pub fn validate<B: TextBuffer>(&self, buf: Option<&B>) -> Result<(), SessionError> {
		let Some(buf) = buf else {
			return Err(self.corrupt("buffer is gone"));
		};
		let lines = buf.line_count();
		let mut ranges = vec![self.extent];
		walk_live(&self.nodes, &mut |node| ranges.push(node.range));
		for range in ranges {
			match buf.range(range) {
				None => return Err(self.corrupt(format!("range {} no longer resolves", range.raw()))),
				Some((start, end)) if start.line >= lines || end.line >= lines => {
					return Err(self.corrupt(format!("range {} ends past line {lines}", range.raw())));
				}
				Some(_) => {}
			}
		}
		Ok(())
	}

	pub fn is_valid<B: TextBuffer>(&self, buf: Option<&B>) -> bool {
		self.validate(buf).is_ok()
	}

	/// Moves focus to `id` and places the cursor on its reference node.
	///
	/// The cursor goes to the start of an untouched placeholder (so typing
	/// replaces it) and to the end of anything already edited.
	pub(crate) fn focus<B: TextBuffer>(&mut self, buf: &mut B, id: TabstopId) -> Result<(), SessionError> {
		if let Some(cursor) = self.activate(buf, id)? {
			buf.set_cursor(cursor);
		}
		Ok(())
	}

	/// Moves focus to `id` without touching the cursor.
	pub(crate) fn follow<B: TextBuffer>(&mut self, buf: &mut B, id: TabstopId) -> Result<(), SessionError> {
		self.activate(buf, id).map(drop)
	}

	fn activate<B: TextBuffer>(&mut self, buf: &mut B, id: TabstopId) -> Result<Option<Position>, SessionError> {
		self.current = id;
		let Some(path) = self.reference_path(&self.current) else {
			return Ok(None);
		};
		self.apply_gravity(buf, &path);
		let Some(node) = self.node(&path) else {
			return Ok(None);
		};
		let (start, end) = self.resolve(buf, node.range)?;
		let untouched = self.untouched(buf, node)?;
		self.entered = buf.text_in(start, end);
		tracing::trace!(session = self.id, tabstop = %self.current, %start, %end, untouched, "focused tabstop");
		Ok(Some(if untouched { start } else { end }))
	}

	/// True if the buffer has not changed since the last sync.
	pub(crate) fn is_synced<B: TextBuffer>(&self, buf: &B) -> bool {
		buf.changedtick() == self.last_synced
	}

	pub(crate) fn mark_visited(&mut self) {
		let current = self.current.clone();
		self.graph.mark_visited(&current);
	}

	/// True once the final tabstop is current and its text differs from
	/// what it showed when focus arrived.
	pub(crate) fn final_edited<B: TextBuffer>(&self, buf: &B) -> bool {
		if !self.current.is_final() {
			return false;
		}
		self.reference_path(&self.current)
			.and_then(|path| self.node(&path))
			.and_then(|node| buf.range_text(node.range))
			.is_some_and(|text| text != self.entered)
	}

	/// True if the expansion left nothing to visit but an empty final tabstop.
	pub(crate) fn is_trivial<B: TextBuffer>(&self, buf: &B) -> bool {
		if self.graph.order().iter().any(|id| !id.is_final()) {
			return false;
		}
		self.reference_path(&TabstopId::final_stop())
			.and_then(|path| self.node(&path))
			.and_then(|node| buf.range(node.range))
			.is_some_and(|(start, end)| start == end)
	}

	/// Stops tracking every range owned by the session.
	pub(crate) fn release<B: TextBuffer>(&self, buf: &mut B) {
		release_nodes(buf, &self.nodes);
		buf.release_range(self.extent);
	}

	pub fn snapshot<B: TextBuffer>(&self, buf: Option<&B>) -> SessionSnapshot {
		SessionSnapshot {
			session: self.id,
			buffer: self.buffer,
			current: self.current.clone(),
			hidden: self.hidden,
			nodes: snapshot_nodes(buf, &self.nodes),
		}
	}

	/// How every tabstop occurrence should be drawn. Hidden sessions draw
	/// nothing.
	pub fn decorations<B: TextBuffer>(&self, buf: &B) -> Vec<Decoration> {
		if self.hidden {
			return Vec::new();
		}
		let mut out = Vec::new();
		walk_live(&self.nodes, &mut |node| {
			let Some(id) = node.tabstop_id() else {
				return;
			};
			let Some((start, end)) = buf.range(node.range) else {
				return;
			};
			let kind = if *id == self.current {
				DecorationKind::Current
			} else if id.is_final() {
				DecorationKind::Final
			} else if self.graph.link(id).is_some_and(|link| link.is_visited) {
				DecorationKind::Visited
			} else {
				DecorationKind::Unvisited
			};
			out.push(Decoration {
				id: id.clone(),
				start,
				end,
				kind,
			});
		});
		out
	}

	/// Innermost tabstop whose reference range contains `pos`.
	pub(crate) fn tabstop_at<B: TextBuffer>(&self, buf: &B, pos: Position) -> Option<TabstopId> {
		let mut seen = FxHashSet::default();
		let mut hit = None;
		walk_live(&self.nodes, &mut |node| {
			let Some(id) = node.tabstop_id() else {
				return;
			};
			if !seen.insert(id.clone()) {
				return;
			}
			if let Some((start, end)) = buf.range(node.range)
				&& start <= pos && pos <= end
			{
				hit = Some(id.clone());
			}
		});
		hit
	}

	fn reference_path(&self, id: &TabstopId) -> Option<Vec<usize>> {
		self.occurrences(id).into_iter().next()
	}

	/// Paths of every node carrying `id`, in reading order.
	fn occurrences(&self, id: &TabstopId) -> Vec<Vec<usize>> {
		fn go(nodes: &[LiveNode], id: &TabstopId, path: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
			for (i, node) in nodes.iter().enumerate() {
				path.push(i);
				if node.tabstop_id() == Some(id) {
					out.push(path.clone());
				}
				if let Some(children) = &node.placeholder {
					go(children, id, path, out);
				}
				path.pop();
			}
		}
		let mut out = Vec::new();
		go(&self.nodes, id, &mut Vec::new(), &mut out);
		out
	}

	fn node(&self, path: &[usize]) -> Option<&LiveNode> {
		let (first, rest) = path.split_first()?;
		let mut node = self.nodes.get(*first)?;
		for &i in rest {
			node = node.placeholder.as_ref()?.get(i)?;
		}
		Some(node)
	}

	fn node_mut(&mut self, path: &[usize]) -> Option<&mut LiveNode> {
		let (first, rest) = path.split_first()?;
		let mut node = self.nodes.get_mut(*first)?;
		for &i in rest {
			node = node.placeholder.as_mut()?.get_mut(i)?;
		}
		Some(node)
	}

	/// Re-anchors every range around the node at `active`.
	fn apply_gravity<B: TextBuffer>(&self, buf: &mut B, active: &[usize]) {
		fn go<B: TextBuffer>(buf: &mut B, nodes: &[LiveNode], path: &mut Vec<usize>, active: &[usize]) {
			for (i, node) in nodes.iter().enumerate() {
				path.push(i);
				let gravity = if active.starts_with(path) {
					Gravity::Expand
				} else if path.as_slice() < active {
					Gravity::Left
				} else {
					Gravity::Right
				};
				buf.set_gravity(node.range, gravity);
				if let Some(children) = &node.placeholder {
					go(buf, children, path, active);
				}
				path.pop();
			}
		}
		go(buf, &self.nodes, &mut Vec::new(), active);
	}

	fn resolve<B: TextBuffer>(&self, buf: &B, range: RangeId) -> Result<(Position, Position), SessionError> {
		buf.range(range)
			.ok_or_else(|| self.corrupt(format!("range {} no longer resolves", range.raw())))
	}

	/// True while a node's bounds are exactly those of its placeholder.
	fn untouched<B: TextBuffer>(&self, buf: &B, node: &LiveNode) -> Result<bool, SessionError> {
		if node.placeholder.is_none() {
			return Ok(false);
		}
		Ok(self.resolve(buf, node.range)? == self.placeholder_span(buf, node)?)
	}

	/// From the start of a node's first placeholder child to the end of its
	/// last. Empty at the node's start when there are no children.
	fn placeholder_span<B: TextBuffer>(&self, buf: &B, node: &LiveNode) -> Result<(Position, Position), SessionError> {
		let children = node.placeholder.as_deref().unwrap_or_default();
		match (children.first(), children.last()) {
			(Some(first), Some(last)) => Ok((self.resolve(buf, first.range)?.0, self.resolve(buf, last.range)?.1)),
			_ => {
				let (start, _) = self.resolve(buf, node.range)?;
				Ok((start, start))
			}
		}
	}

	fn corrupt(&self, reason: impl Into<String>) -> SessionError {
		SessionError::Corrupt {
			buffer: self.buffer,
			reason: reason.into(),
		}
	}
}

fn walk_live<'a>(nodes: &'a [LiveNode], f: &mut impl FnMut(&'a LiveNode)) {
	for node in nodes {
		f(node);
		if let Some(children) = &node.placeholder {
			walk_live(children, f);
		}
	}
}

fn release_nodes<B: TextBuffer>(buf: &mut B, nodes: &[LiveNode]) {
	walk_live(nodes, &mut |node| buf.release_range(node.range));
}

fn snapshot_nodes<B: TextBuffer>(buf: Option<&B>, nodes: &[LiveNode]) -> Vec<Node> {
	nodes
		.iter()
		.map(|node| {
			let text = buf.and_then(|buf| buf.range_text(node.range)).unwrap_or_default();
			let placeholder = node.placeholder.as_ref().map(|children| snapshot_nodes(buf, children));
			let text = placeholder.is_none().then_some(text);
			match &node.kind {
				LiveKind::Text => Node::Text(text.unwrap_or_default()),
				LiveKind::Tabstop { id, choices, transform } => Node::Tabstop(Tabstop {
					id: id.clone(),
					text,
					placeholder,
					choices: choices.clone(),
					transform: transform.clone(),
				}),
				LiveKind::Var { name, transform } => Node::Var(Var {
					name: name.clone(),
					text,
					placeholder,
					transform: transform.clone(),
				}),
			}
		})
		.collect()
}

/// A node laid out in the text about to be inserted.
struct Laid {
	kind: LiveKind,
	start: Position,
	end: Position,
	children: Option<Vec<Laid>>,
}

struct Layout<'a> {
	text: String,
	pos: Position,
	indent: &'a str,
	indent_width: usize,
}

impl Layout<'_> {
	fn nodes(&mut self, nodes: &[Node]) -> Vec<Laid> {
		nodes.iter().map(|node| self.node(node)).collect()
	}

	fn node(&mut self, node: &Node) -> Laid {
		let start = self.pos;
		let kind = match node {
			Node::Text(_) => LiveKind::Text,
			Node::Tabstop(tabstop) => LiveKind::Tabstop {
				id: tabstop.id.clone(),
				choices: tabstop.choices.clone(),
				transform: tabstop.transform.clone(),
			},
			Node::Var(var) => LiveKind::Var {
				name: var.name.clone(),
				transform: var.transform.clone(),
			},
		};
		let mut children = None;
		if let Some(text) = node.resolved_text() {
			self.emit(text);
		} else if let Some(placeholder) = node.placeholder() {
			children = Some(self.nodes(placeholder));
		} else if let Node::Tabstop(Tabstop { choices: Some(choices), .. }) = node
			&& let Some(first) = choices.first()
		{
			self.emit(first);
		}
		Laid {
			kind,
			start,
			end: self.pos,
			children,
		}
	}

	fn emit(&mut self, text: &str) {
		for ch in text.chars() {
			self.text.push(ch);
			if ch == '\n' {
				self.text.push_str(self.indent);
				self.pos = Position::new(self.pos.line + 1, self.indent_width);
			} else {
				self.pos.col += 1;
			}
		}
	}
}

fn attach<B: TextBuffer>(buf: &mut B, laid: Vec<Laid>) -> Vec<LiveNode> {
	laid.into_iter()
		.map(|laid| LiveNode {
			kind: laid.kind,
			range: buf.create_range(laid.start, laid.end, Gravity::Right),
			placeholder: laid.children.map(|children| attach(buf, children)),
		})
		.collect()
}
