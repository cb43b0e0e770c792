/// A character offset into a buffer.
pub type CharIdx = usize;

/// A zero-based line/column position, both measured in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
	pub line: usize,
	pub col: usize,
}

impl Position {
	pub const fn new(line: usize, col: usize) -> Self {
		Self { line, col }
	}
}

impl std::fmt::Display for Position {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}:{}", self.line, self.col)
	}
}
