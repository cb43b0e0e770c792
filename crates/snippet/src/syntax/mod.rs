//! Snippet body parser.
//!
//! A character-at-a-time state machine. Each state is a variant of [`State`]
//! and every transition is decided by [`Parser::step`] on the pair
//! `(state, Class)`. Nested placeholders push a new [`Layer`]; the closing `}`
//! pops it into the `placeholder` of the node that opened it.

use crate::node::{Node, Tabstop, TabstopId, Transform, Var};

/// Fatal parse failures. Every variant carries the char offset where the
/// offending construct starts and the source text of that construct.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
	#[error("unterminated `${{...}}` block at {at}: `{construct}`")]
	UnterminatedBlock { at: usize, construct: String },
	#[error("unterminated choice list at {at} (missing `|}}`): `{construct}`")]
	UnterminatedChoice { at: usize, construct: String },
	#[error("unterminated transform at {at}: `{construct}`")]
	UnterminatedTransform { at: usize, construct: String },
	#[error("unterminated placeholder at {at}: `{construct}`")]
	UnterminatedPlaceholder { at: usize, construct: String },
	#[error("unexpected `{found}` at {pos} in `${{...}}` block starting at {at}: `{construct}`")]
	UnexpectedChar { at: usize, pos: usize, found: char, construct: String },
}

impl ParseError {
	/// Source text of the construct that failed.
	pub fn construct(&self) -> &str {
		match self {
			ParseError::UnterminatedBlock { construct, .. }
			| ParseError::UnterminatedChoice { construct, .. }
			| ParseError::UnterminatedTransform { construct, .. }
			| ParseError::UnterminatedPlaceholder { construct, .. }
			| ParseError::UnexpectedChar { construct, .. } => construct,
		}
	}
}

/// Parses a snippet body into a node tree.
pub fn parse_snippet(body: &str) -> Result<Vec<Node>, ParseError> {
	let chars: Vec<char> = body.chars().collect();
	let mut parser = Parser::new(&chars);
	for (pos, &ch) in chars.iter().enumerate() {
		while parser.step(ch, pos)? == Step::Reprocess {}
	}
	let nodes = parser.finish()?;
	tracing::trace!(chars = chars.len(), nodes = nodes.len(), "parsed snippet body");
	Ok(nodes)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
	Text,
	Dollar,
	DollarTabstop,
	DollarVar,
	DollarLbrace,
	Choice,
	/// Saw `|` inside a choice list; only `}` may follow.
	ChoiceClose,
	TransformRegex,
	TransformFormat,
	TransformOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
	Digit,
	Name,
	Dollar,
	LBrace,
	RBrace,
	Colon,
	Pipe,
	Comma,
	Slash,
	Backslash,
	Other,
}

fn classify(ch: char) -> Class {
	match ch {
		'0'..='9' => Class::Digit,
		'a'..='z' | 'A'..='Z' | '_' => Class::Name,
		'$' => Class::Dollar,
		'{' => Class::LBrace,
		'}' => Class::RBrace,
		':' => Class::Colon,
		'|' => Class::Pipe,
		',' => Class::Comma,
		'/' => Class::Slash,
		'\\' => Class::Backslash,
		_ => Class::Other,
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
	Consumed,
	Reprocess,
}

/// Tabstop or variable whose header is being read.
#[derive(Debug)]
enum Pending {
	Empty,
	Tabstop(String),
	Var(String),
}

#[derive(Debug)]
struct Layer {
	nodes: Vec<Node>,
	text: String,
	/// Offset of the `${` that opened this layer.
	opened_at: usize,
}

impl Layer {
	fn new(opened_at: usize) -> Self {
		Self {
			nodes: Vec::new(),
			text: String::new(),
			opened_at,
		}
	}

	fn flush_text(&mut self) {
		if !self.text.is_empty() {
			self.nodes.push(Node::Text(std::mem::take(&mut self.text)));
		}
	}

	fn into_nodes(mut self) -> Vec<Node> {
		self.flush_text();
		self.nodes.retain(|node| !matches!(node, Node::Text(text) if text.is_empty()));
		if self.nodes.is_empty() {
			self.nodes.push(Node::Text(String::new()));
		}
		self.nodes
	}
}

struct Parser<'a> {
	src: &'a [char],
	state: State,
	root: Layer,
	/// Open placeholders, innermost last.
	nested: Vec<Layer>,
	escaped: bool,
	pending: Pending,
	/// Offset of the `$` that started the current construct.
	start: usize,
	choice: String,
	choices: Vec<String>,
	transform: Transform,
	/// Open `${` groups inside a transform format.
	format_depth: usize,
}

impl<'a> Parser<'a> {
	fn new(src: &'a [char]) -> Self {
		Self {
			src,
			state: State::Text,
			root: Layer::new(0),
			nested: Vec::new(),
			escaped: false,
			pending: Pending::Empty,
			start: 0,
			choice: String::new(),
			choices: Vec::new(),
			transform: Transform::default(),
			format_depth: 0,
		}
	}

	fn layer(&mut self) -> &mut Layer {
		self.nested.last_mut().unwrap_or(&mut self.root)
	}

	fn construct(&self, from: usize, to: usize) -> String {
		self.src[from..to.min(self.src.len())].iter().collect()
	}

	fn step(&mut self, ch: char, pos: usize) -> Result<Step, ParseError> {
		let class = classify(ch);
		match self.state {
			State::Text => self.text(ch, class, pos),
			State::Dollar => Ok(self.dollar(ch, class)),
			State::DollarTabstop => Ok(self.dollar_name(ch, class, false)),
			State::DollarVar => Ok(self.dollar_name(ch, class, true)),
			State::DollarLbrace => self.dollar_lbrace(ch, class, pos),
			State::Choice => Ok(self.choice(ch, class)),
			State::ChoiceClose => match class {
				Class::RBrace => {
					let choice = std::mem::take(&mut self.choice);
					self.choices.push(choice);
					self.complete();
					Ok(Step::Consumed)
				}
				_ => Err(ParseError::UnexpectedChar {
					at: self.start,
					pos,
					found: ch,
					construct: self.construct(self.start, pos + 1),
				}),
			},
			State::TransformRegex | State::TransformFormat | State::TransformOptions => Ok(self.transform(ch, class)),
		}
	}

	fn text(&mut self, ch: char, class: Class, pos: usize) -> Result<Step, ParseError> {
		if self.escaped {
			self.escaped = false;
			if !matches!(class, Class::Dollar | Class::RBrace | Class::Backslash) {
				self.layer().text.push('\\');
			}
			self.layer().text.push(ch);
			return Ok(Step::Consumed);
		}
		match class {
			Class::Backslash => self.escaped = true,
			Class::Dollar => {
				self.start = pos;
				self.state = State::Dollar;
			}
			Class::RBrace if !self.nested.is_empty() => self.close_placeholder(),
			_ => self.layer().text.push(ch),
		}
		Ok(Step::Consumed)
	}

	fn dollar(&mut self, ch: char, class: Class) -> Step {
		match class {
			Class::Digit => {
				self.pending = Pending::Tabstop(ch.to_string());
				self.state = State::DollarTabstop;
			}
			Class::Name => {
				self.pending = Pending::Var(ch.to_string());
				self.state = State::DollarVar;
			}
			Class::LBrace => {
				self.pending = Pending::Empty;
				self.state = State::DollarLbrace;
			}
			_ => {
				self.layer().text.push('$');
				self.state = State::Text;
				return Step::Reprocess;
			}
		}
		Step::Consumed
	}

	/// `$123` or `$NAME`: consumes while the name continues.
	fn dollar_name(&mut self, ch: char, class: Class, is_var: bool) -> Step {
		let continues = match class {
			Class::Digit => true,
			Class::Name => is_var,
			_ => false,
		};
		if continues {
			self.pending_push(ch);
			return Step::Consumed;
		}
		self.complete();
		Step::Reprocess
	}

	fn dollar_lbrace(&mut self, ch: char, class: Class, pos: usize) -> Result<Step, ParseError> {
		let is_var = match self.pending {
			Pending::Empty => {
				self.pending = match class {
					Class::Digit => Pending::Tabstop(ch.to_string()),
					Class::Name => Pending::Var(ch.to_string()),
					_ => return Err(self.unexpected(ch, pos)),
				};
				return Ok(Step::Consumed);
			}
			Pending::Tabstop(_) => false,
			Pending::Var(_) => true,
		};
		match class {
			Class::Digit => self.pending_push(ch),
			Class::Name if is_var => self.pending_push(ch),
			Class::RBrace => self.complete(),
			Class::Colon => self.open_placeholder(),
			Class::Pipe if !is_var => self.state = State::Choice,
			Class::Slash => self.state = State::TransformRegex,
			_ => return Err(self.unexpected(ch, pos)),
		}
		Ok(Step::Consumed)
	}

	fn choice(&mut self, ch: char, class: Class) -> Step {
		if self.escaped {
			self.escaped = false;
			if !matches!(class, Class::Dollar | Class::RBrace | Class::Backslash | Class::Comma | Class::Pipe) {
				self.choice.push('\\');
			}
			self.choice.push(ch);
			return Step::Consumed;
		}
		match class {
			Class::Backslash => self.escaped = true,
			Class::Comma => {
				let choice = std::mem::take(&mut self.choice);
				self.choices.push(choice);
			}
			Class::Pipe => self.state = State::ChoiceClose,
			_ => self.choice.push(ch),
		}
		Step::Consumed
	}

	fn transform(&mut self, ch: char, class: Class) -> Step {
		let state = self.state;
		let part = match state {
			State::TransformRegex => &mut self.transform.regex,
			State::TransformFormat => &mut self.transform.format,
			_ => &mut self.transform.options,
		};
		if self.escaped {
			self.escaped = false;
			part.push('\\');
			part.push(ch);
			return Step::Consumed;
		}
		match (state, class) {
			(State::TransformRegex | State::TransformFormat, Class::Backslash) => self.escaped = true,
			(State::TransformRegex, Class::Slash) => self.state = State::TransformFormat,
			(State::TransformFormat, Class::Slash) if self.format_depth == 0 => self.state = State::TransformOptions,
			(State::TransformFormat, Class::LBrace) => {
				if part.ends_with('$') {
					self.format_depth += 1;
				}
				part.push(ch);
			}
			(State::TransformFormat, Class::RBrace) if self.format_depth > 0 => {
				self.format_depth -= 1;
				part.push(ch);
			}
			(State::TransformOptions, Class::RBrace) => self.complete(),
			_ => part.push(ch),
		}
		Step::Consumed
	}

	fn pending_push(&mut self, ch: char) {
		match &mut self.pending {
			Pending::Tabstop(name) | Pending::Var(name) => name.push(ch),
			Pending::Empty => {}
		}
	}

	fn unexpected(&self, found: char, pos: usize) -> ParseError {
		ParseError::UnexpectedChar {
			at: self.start,
			pos,
			found,
			construct: self.construct(self.start, pos + 1),
		}
	}

	/// Builds the pending node from everything collected since `$`.
	fn take_node(&mut self) -> Option<Node> {
		let transform = (self.state == State::TransformOptions).then(|| std::mem::take(&mut self.transform));
		let choices = (!self.choices.is_empty()).then(|| std::mem::take(&mut self.choices));
		self.format_depth = 0;
		match std::mem::replace(&mut self.pending, Pending::Empty) {
			Pending::Tabstop(digits) => {
				let mut tabstop = Tabstop::new(TabstopId::from_digits(digits));
				tabstop.choices = choices;
				tabstop.transform = transform;
				Some(Node::Tabstop(tabstop))
			}
			Pending::Var(name) => {
				let mut var = Var::new(name);
				var.transform = transform;
				Some(Node::Var(var))
			}
			Pending::Empty => None,
		}
	}

	fn complete(&mut self) {
		if let Some(node) = self.take_node() {
			let layer = self.layer();
			layer.flush_text();
			layer.nodes.push(node);
		}
		self.state = State::Text;
	}

	fn open_placeholder(&mut self) {
		let opened_at = self.start;
		self.complete();
		self.nested.push(Layer::new(opened_at));
	}

	fn close_placeholder(&mut self) {
		let Some(layer) = self.nested.pop() else {
			return;
		};
		let children = layer.into_nodes();
		let parent = self.layer();
		parent.flush_text();
		if let Some(slot) = parent.nodes.last_mut().and_then(Node::placeholder_mut) {
			*slot = Some(children);
		}
	}

	fn finish(mut self) -> Result<Vec<Node>, ParseError> {
		let end = self.src.len();
		match self.state {
			State::Text => {
				if self.escaped {
					self.layer().text.push('\\');
				}
			}
			State::Dollar => self.layer().text.push('$'),
			State::DollarTabstop | State::DollarVar => self.complete(),
			State::DollarLbrace => {
				return Err(ParseError::UnterminatedBlock {
					at: self.start,
					construct: self.construct(self.start, end),
				});
			}
			State::Choice | State::ChoiceClose => {
				return Err(ParseError::UnterminatedChoice {
					at: self.start,
					construct: self.construct(self.start, end),
				});
			}
			State::TransformRegex | State::TransformFormat | State::TransformOptions => {
				return Err(ParseError::UnterminatedTransform {
					at: self.start,
					construct: self.construct(self.start, end),
				});
			}
		}
		if let Some(open) = self.nested.last() {
			let at = open.opened_at;
			return Err(ParseError::UnterminatedPlaceholder {
				at,
				construct: self.construct(at, end),
			});
		}
		Ok(self.root.into_nodes())
	}
}
