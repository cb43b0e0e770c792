/// Opaque handle to a range tracked by a [`TextBuffer`](crate::TextBuffer).
///
/// Handles are weak: the buffer owns the range, and a released handle simply
/// stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RangeId(pub(crate) u64);

impl RangeId {
	/// Raw numeric value, for logging.
	pub fn raw(self) -> u64 {
		self.0
	}
}

/// Bias determines how a position sitting exactly at an edit boundary is mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
	/// Position stays before text inserted at its location.
	Left,
	/// Position moves after text inserted at its location.
	Right,
}

/// How a tracked range reacts to text inserted exactly at one of its boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gravity {
	/// Inserted text at either boundary lands inside the range.
	#[default]
	Expand,
	/// The range stays where it is; text inserted at a boundary ends up after it.
	Left,
	/// The range is pushed after text inserted at a boundary.
	Right,
}

impl Gravity {
	/// Per-endpoint bias as `(start, end)`.
	pub fn biases(self) -> (Bias, Bias) {
		match self {
			Gravity::Expand => (Bias::Left, Bias::Right),
			Gravity::Left => (Bias::Left, Bias::Left),
			Gravity::Right => (Bias::Right, Bias::Right),
		}
	}
}

/// Maps `pos` through the replacement of `[start, end)` by `inserted` characters.
///
/// Positions inside the replaced span collapse onto the edit point and are then
/// placed before or after the new text according to `bias`.
pub fn map_pos(pos: usize, start: usize, end: usize, inserted: usize, bias: Bias) -> usize {
	if pos < start {
		return pos;
	}
	if pos > end {
		return pos - (end - start) + inserted;
	}
	match bias {
		Bias::Left => start,
		Bias::Right => start + inserted,
	}
}
