//! Errors surfaced to callers of the engine.

use stencil_buffer::BufferId;
use thiserror::Error;

use crate::config::ConfigError;
use crate::graph::InvalidDirection;
use crate::node::{InvalidTabstopId, TabstopId};
use crate::normalize::NormalizeError;
use crate::syntax::ParseError;

/// Everything the fallible [`SnippetEngine`](crate::SnippetEngine) entry
/// points can fail with.
///
/// Corruption of a live session is not in here: it is handled inside the
/// engine by tearing the session down.
#[derive(Debug, Error)]
pub enum SnippetError {
	#[error(transparent)]
	Parse(#[from] ParseError),

	#[error(transparent)]
	Normalize(#[from] NormalizeError),

	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error(transparent)]
	InvalidTabstop(#[from] InvalidTabstopId),

	#[error(transparent)]
	InvalidDirection(#[from] InvalidDirection),

	#[error("tabstop `{0}` is not present in the active snippet")]
	UnknownTabstop(TabstopId),

	#[error("no snippet session is active")]
	NoSession,

	#[error("{0} does not exist")]
	BufferGone(BufferId),

	/// The host forbids edits right now; retry after the lock is released.
	#[error("buffer edits are locked by the host")]
	EditsLocked,
}
