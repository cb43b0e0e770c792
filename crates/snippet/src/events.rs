//! Notifications the engine emits for observers such as a UI layer.

use crate::node::TabstopId;
use crate::session::SessionSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
	Start(SessionSnapshot),
	Stop(SessionSnapshot),
	Suspend(SessionSnapshot),
	Resume(SessionSnapshot),
	/// Focus is about to move.
	JumpPre { from: TabstopId, to: TabstopId },
	Jump { from: TabstopId, to: TabstopId },
}

impl SessionEvent {
	pub fn name(&self) -> &'static str {
		match self {
			SessionEvent::Start(_) => "start",
			SessionEvent::Stop(_) => "stop",
			SessionEvent::Suspend(_) => "suspend",
			SessionEvent::Resume(_) => "resume",
			SessionEvent::JumpPre { .. } => "jump-pre",
			SessionEvent::Jump { .. } => "jump",
		}
	}
}

/// Callback registered with [`SnippetEngine::subscribe`](crate::SnippetEngine::subscribe).
pub type Observer = Box<dyn FnMut(&SessionEvent)>;
