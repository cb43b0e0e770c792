//! Snippet node tree.
//!
//! A parsed snippet is a `Vec<Node>`. Tabstop and variable nodes may carry a
//! placeholder, which is itself a node list. After normalization every
//! tabstop and variable node has exactly one of `text` or `placeholder`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Identifier of a tabstop: a non-empty run of ASCII digits.
///
/// Ordering is by numeric value, ties broken by the string itself (so `01`
/// and `1` are distinct but adjacent). The final tabstop `0` sorts after
/// everything else.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TabstopId(String);

/// Error returned when a tabstop id is not a run of digits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid tabstop id `{0}`: expected one or more ASCII digits")]
pub struct InvalidTabstopId(pub String);

impl TabstopId {
	/// The reserved id of the final tabstop.
	pub const FINAL: &'static str = "0";

	pub fn new(id: impl Into<String>) -> Result<Self, InvalidTabstopId> {
		let id = id.into();
		if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
			return Err(InvalidTabstopId(id));
		}
		Ok(Self(id))
	}

	/// The final tabstop `0`.
	pub fn final_stop() -> Self {
		Self(Self::FINAL.to_string())
	}

	pub(crate) fn from_digits(digits: String) -> Self {
		debug_assert!(!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()));
		Self(digits)
	}

	pub fn is_final(&self) -> bool {
		self.0 == Self::FINAL
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	fn numeric_key(&self) -> &str {
		let trimmed = self.0.trim_start_matches('0');
		if trimmed.is_empty() { "0" } else { trimmed }
	}
}

impl Ord for TabstopId {
	fn cmp(&self, other: &Self) -> Ordering {
		match (self.is_final(), other.is_final()) {
			(true, true) => return Ordering::Equal,
			(true, false) => return Ordering::Greater,
			(false, true) => return Ordering::Less,
			(false, false) => {}
		}
		let (a, b) = (self.numeric_key(), other.numeric_key());
		a.len().cmp(&b.len()).then_with(|| a.cmp(b)).then_with(|| self.0.cmp(&other.0))
	}
}

impl PartialOrd for TabstopId {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl FromStr for TabstopId {
	type Err = InvalidTabstopId;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

impl fmt::Display for TabstopId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// A `/regex/format/options` suffix. Stored verbatim, never executed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transform {
	pub regex: String,
	pub format: String,
	pub options: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tabstop {
	pub id: TabstopId,
	pub text: Option<String>,
	pub placeholder: Option<Vec<Node>>,
	pub choices: Option<Vec<String>>,
	pub transform: Option<Transform>,
}

impl Tabstop {
	pub fn new(id: TabstopId) -> Self {
		Self {
			id,
			text: None,
			placeholder: None,
			choices: None,
			transform: None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Var {
	pub name: String,
	pub text: Option<String>,
	pub placeholder: Option<Vec<Node>>,
	pub transform: Option<Transform>,
}

impl Var {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			text: None,
			placeholder: None,
			transform: None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
	Text(String),
	Tabstop(Tabstop),
	Var(Var),
}

impl Node {
	pub fn text(text: impl Into<String>) -> Self {
		Node::Text(text.into())
	}

	pub fn tabstop_id(&self) -> Option<&TabstopId> {
		match self {
			Node::Tabstop(tabstop) => Some(&tabstop.id),
			_ => None,
		}
	}

	/// Resolved text of a tabstop or variable, or the content of a text node.
	pub fn resolved_text(&self) -> Option<&str> {
		match self {
			Node::Text(text) => Some(text),
			Node::Tabstop(tabstop) => tabstop.text.as_deref(),
			Node::Var(var) => var.text.as_deref(),
		}
	}

	pub fn placeholder(&self) -> Option<&[Node]> {
		match self {
			Node::Text(_) => None,
			Node::Tabstop(tabstop) => tabstop.placeholder.as_deref(),
			Node::Var(var) => var.placeholder.as_deref(),
		}
	}

	pub(crate) fn placeholder_mut(&mut self) -> Option<&mut Option<Vec<Node>>> {
		match self {
			Node::Text(_) => None,
			Node::Tabstop(tabstop) => Some(&mut tabstop.placeholder),
			Node::Var(var) => Some(&mut var.placeholder),
		}
	}

	pub(crate) fn text_mut(&mut self) -> Option<&mut Option<String>> {
		match self {
			Node::Text(_) => None,
			Node::Tabstop(tabstop) => Some(&mut tabstop.text),
			Node::Var(var) => Some(&mut var.text),
		}
	}
}

/// Concatenates the text a tree shows when inserted without edits.
///
/// Resolved text wins over placeholders; a node with neither contributes its
/// first choice, if any.
pub fn render_default(nodes: &[Node]) -> String {
	let mut out = String::new();
	render_into(nodes, &mut out);
	out
}

fn render_into(nodes: &[Node], out: &mut String) {
	for node in nodes {
		if let Some(text) = node.resolved_text() {
			out.push_str(text);
		} else if let Some(children) = node.placeholder() {
			render_into(children, out);
		} else if let Node::Tabstop(Tabstop { choices: Some(choices), .. }) = node
			&& let Some(first) = choices.first()
		{
			out.push_str(first);
		}
	}
}

/// Escapes `text` so that parsing it yields a single text node.
pub fn escape_text(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for ch in text.chars() {
		if matches!(ch, '\\' | '$' | '}') {
			out.push('\\');
		}
		out.push(ch);
	}
	out
}

/// Visits every node in reading order, descending into placeholders.
pub fn walk<'a>(nodes: &'a [Node], f: &mut impl FnMut(&'a Node)) {
	for node in nodes {
		f(node);
		if let Some(children) = node.placeholder() {
			walk(children, f);
		}
	}
}

/// True if any node in the tree carries tabstop `id`.
pub fn contains_tabstop(nodes: &[Node], id: &TabstopId) -> bool {
	let mut found = false;
	walk(nodes, &mut |node| found |= node.tabstop_id() == Some(id));
	found
}
