//! The session stack and the entry points a host event loop drives.
//!
//! The engine owns a stack of [`Session`]s. Only the top one reacts to
//! edits; the ones below it are suspended (hidden, ranges still tracked) and
//! get reconciled with the buffer when they become the top again.
//!
//! Nothing here ever hands a corrupt session back to the host. A session
//! whose ranges stopped resolving is logged, reported through
//! [`Host::notify`] and stopped.

use std::path::Path;

use rustc_hash::FxHashSet;
use stencil_buffer::{BufferId, Host, Level, Mode, TextBuffer};

use crate::config::SnippetConfig;
use crate::error::SnippetError;
use crate::events::{Observer, SessionEvent};
use crate::graph::Direction;
use crate::node::{Node, TabstopId};
use crate::normalize::normalize;
use crate::session::{Decoration, Session, SessionError, SessionSnapshot};
use crate::syntax::parse_snippet;
use crate::vars::{Lookup, NoVars, SnippetVarResolver};

/// Work postponed while the host forbids buffer edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
	/// Reconcile the top session with the buffer.
	Sync,
	/// Reconcile the top session, then show it again.
	Resume,
}

pub struct SnippetEngine {
	config: SnippetConfig,
	stack: Vec<Session>,
	observers: Vec<Observer>,
	deferred: Vec<Deferred>,
	syncing: bool,
	next_session: u64,
}

impl std::fmt::Debug for SnippetEngine {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SnippetEngine")
			.field("config", &self.config)
			.field("stack", &self.stack)
			.field("observers", &self.observers.len())
			.field("deferred", &self.deferred)
			.finish()
	}
}

impl Default for SnippetEngine {
	fn default() -> Self {
		Self::new(SnippetConfig::default())
	}
}

impl SnippetEngine {
	pub fn new(config: SnippetConfig) -> Self {
		Self {
			config,
			stack: Vec::new(),
			observers: Vec::new(),
			deferred: Vec::new(),
			syncing: false,
			next_session: 1,
		}
	}

	/// Builds an engine from a TOML settings file.
	pub fn from_config_file(path: &Path) -> Result<Self, SnippetError> {
		Ok(Self::new(SnippetConfig::load(path)?))
	}

	pub fn config(&self) -> &SnippetConfig {
		&self.config
	}

	/// Registers a callback for every [`SessionEvent`].
	pub fn subscribe(&mut self, observer: impl FnMut(&SessionEvent) + 'static) {
		self.observers.push(Box::new(observer));
	}

	/// Number of sessions on the stack, suspended ones included.
	pub fn depth(&self) -> usize {
		self.stack.len()
	}

	pub fn is_active(&self) -> bool {
		!self.stack.is_empty()
	}

	/// The top session.
	pub fn active(&self) -> Option<&Session> {
		self.stack.last()
	}

	/// Every session, bottom of the stack first.
	pub fn sessions(&self) -> &[Session] {
		&self.stack
	}

	/// True while work is waiting for the host to allow edits again.
	pub fn has_deferred(&self) -> bool {
		!self.deferred.is_empty()
	}

	/// Whether the top session still matches its buffer.
	pub fn is_valid<H: Host>(&self, host: &H) -> bool {
		self.stack.last().is_some_and(|session| session.is_valid(host.buffer(session.buffer())))
	}

	/// Parses, normalizes and inserts `body` at the cursor of `buffer`.
	///
	/// `lookup` seeds known values and receives cached variables. See
	/// [`start`](Self::start) for the return value.
	pub fn expand<H: Host>(
		&mut self,
		host: &mut H,
		buffer: BufferId,
		body: &str,
		lookup: &mut Lookup,
		resolver: &dyn SnippetVarResolver,
	) -> Result<bool, SnippetError> {
		let parsed = parse_snippet(body)?;
		let nodes = normalize(parsed, lookup, resolver, &self.config.uncached_vars)?;
		self.start(host, buffer, nodes)
	}

	/// Inserts `nodes` at the cursor of `buffer` and pushes a session for them.
	///
	/// The current top session, if any, is suspended first. Returns `false`
	/// when the snippet has nothing to visit but an empty final tabstop: the
	/// text is inserted, the cursor moved there and no session is created.
	pub fn start<H: Host>(&mut self, host: &mut H, buffer: BufferId, nodes: Vec<Node>) -> Result<bool, SnippetError> {
		let nodes = normalize(nodes, &mut Lookup::default(), &NoVars, &[])?;
		if host.edits_locked() {
			return Err(SnippetError::EditsLocked);
		}
		let buf = host.buffer_mut(buffer).ok_or(SnippetError::BufferGone(buffer))?;

		let id = self.next_session;
		self.next_session += 1;
		let mut session = Session::insert(id, buf, &nodes, &self.config.comment_leaders);

		if session.is_trivial(buf) {
			let focused = session.focus(buf, TabstopId::final_stop());
			session.release(buf);
			if let Err(err) = focused {
				tracing::warn!(%err, "snippet inserted but its final tabstop did not resolve");
			}
			tracing::debug!(session = id, %buffer, "snippet has no tabstops, session not started");
			return Ok(false);
		}

		let first = session.current().clone();
		if let Err(err) = session.focus(buf, first) {
			session.release(buf);
			tracing::warn!(%err, "new snippet session is corrupt, dropping it");
			host.notify(Level::Warn, &format!("snippet session stopped: {err}"));
			return Ok(false);
		}

		if let Some(top) = self.stack.last_mut() {
			top.set_hidden(true);
			let snapshot = top.snapshot(host.buffer(top.buffer()));
			tracing::debug!(session = snapshot.session, depth = self.stack.len(), "suspended snippet session");
			self.emit(SessionEvent::Suspend(snapshot));
		}

		let snapshot = session.snapshot(host.buffer(buffer));
		tracing::debug!(session = id, %buffer, tabstops = session.graph().len(), current = %session.current(), "started snippet session");
		self.stack.push(session);
		self.emit(SessionEvent::Start(snapshot));
		Ok(true)
	}

	/// Pops the top session and resumes the one below it.
	///
	/// Always safe to call; does nothing when no session is active.
	pub fn stop<H: Host>(&mut self, host: &mut H) {
		let Some(session) = self.stack.pop() else {
			return;
		};
		self.finish(host, session);
		self.resume_top(host);
	}

	/// Focuses the next or previous tabstop still present, wrapping around.
	///
	/// Returns the newly focused id, or `None` without an active session.
	pub fn jump<H: Host>(&mut self, host: &mut H, direction: Direction) -> Option<TabstopId> {
		self.navigate(host, |session, present| {
			session.graph().step(session.current(), direction, |id| present.contains(id))
		})
	}

	/// Focuses the first present tabstop in traversal order.
	pub fn jump_first<H: Host>(&mut self, host: &mut H) -> Option<TabstopId> {
		self.navigate(host, |session, present| session.graph().first(|id| present.contains(id)))
	}

	/// Focuses the last present tabstop, normally the final one.
	pub fn jump_last<H: Host>(&mut self, host: &mut H) -> Option<TabstopId> {
		self.navigate(host, |session, present| session.graph().last(|id| present.contains(id)))
	}

	/// Focuses tabstop `id` of the active session.
	pub fn jump_to<H: Host>(&mut self, host: &mut H, id: &TabstopId) -> Result<(), SnippetError> {
		if !self.ensure_valid(host) {
			return Err(SnippetError::NoSession);
		}
		let present = self.stack.last().is_some_and(|session| session.present_ids().contains(id));
		if !present {
			return Err(SnippetError::UnknownTabstop(id.clone()));
		}
		self.navigate(host, |_, _| Some(id.clone()));
		Ok(())
	}

	/// [`jump`](Self::jump) with the direction spelled `next` or `prev`, as
	/// host commands name it.
	pub fn jump_named<H: Host>(&mut self, host: &mut H, direction: &str) -> Result<Option<TabstopId>, SnippetError> {
		let direction: Direction = direction.parse()?;
		Ok(self.jump(host, direction))
	}

	/// [`jump_to`](Self::jump_to) with the id given as text.
	pub fn jump_to_named<H: Host>(&mut self, host: &mut H, id: &str) -> Result<(), SnippetError> {
		let id = TabstopId::new(id)?;
		self.jump_to(host, &id)
	}

	/// Host notification: text of `buffer` changed.
	pub fn on_text_changed<H: Host>(&mut self, host: &mut H, buffer: BufferId) {
		if self.syncing || !self.ensure_valid(host) {
			return;
		}
		if !self.stack.last().is_some_and(|top| top.buffer() == buffer && !top.is_hidden()) {
			return;
		}
		if host.edits_locked() {
			self.defer(Deferred::Sync);
			return;
		}
		if self.sync_top(host) {
			self.autostop_on_edit(host);
		}
	}

	/// Host notification: the cursor of `buffer` moved.
	///
	/// When the cursor lands inside another tabstop of the active session,
	/// focus follows it.
	pub fn on_cursor_moved<H: Host>(&mut self, host: &mut H, buffer: BufferId) {
		if self.syncing || host.edits_locked() || !self.ensure_valid(host) {
			return;
		}
		let Some(top) = self.stack.last() else {
			return;
		};
		if top.buffer() != buffer || top.is_hidden() {
			return;
		}
		let Some(buf) = host.buffer(buffer) else {
			return;
		};
		let Some(target) = top.tabstop_at(buf, buf.cursor()) else {
			return;
		};
		if &target == top.current() {
			return;
		}
		if !self.sync_top(host) {
			return;
		}

		let Some(top) = self.stack.last_mut() else {
			return;
		};
		let from = top.current().clone();
		top.mark_visited();
		let Some(buf) = host.buffer_mut(buffer) else {
			return;
		};
		if let Err(err) = top.follow(buf, target.clone()) {
			self.teardown(host, err);
			return;
		}
		tracing::debug!(session = top.id(), %from, to = %target, "focus followed cursor");
		self.emit(SessionEvent::Jump { from, to: target });
	}

	/// Host notification: the editing mode changed to [`Host::mode`].
	///
	/// Flushes deferred work, then stops the session if insert mode was left
	/// at the final tabstop.
	pub fn on_mode_changed<H: Host>(&mut self, host: &mut H) {
		self.flush_deferred(host);
		if host.mode() != Mode::Normal || !self.config.autostop_on_normal_mode {
			return;
		}
		if self.stack.last().is_some_and(|top| top.current().is_final() && !top.is_hidden()) {
			tracing::debug!("left insert mode at final tabstop, stopping session");
			self.stop(host);
		}
	}

	/// Runs work postponed while edits were locked. Does nothing while they
	/// still are.
	pub fn flush_deferred<H: Host>(&mut self, host: &mut H) {
		if host.edits_locked() || self.deferred.is_empty() {
			return;
		}
		let pending = std::mem::take(&mut self.deferred);
		tracing::trace!(count = pending.len(), "flushing deferred snippet work");
		for item in pending {
			if !self.ensure_valid(host) {
				break;
			}
			match item {
				Deferred::Sync => {
					if self.sync_top(host) {
						self.autostop_on_edit(host);
					}
				}
				Deferred::Resume => self.resume_now(host),
			}
		}
	}

	/// Decorations of the active session.
	pub fn decorations<H: Host>(&self, host: &H) -> Vec<Decoration> {
		self.stack
			.last()
			.and_then(|session| host.buffer(session.buffer()).map(|buf| session.decorations(buf)))
			.unwrap_or_default()
	}

	pub fn snapshot<H: Host>(&self, host: &H) -> Option<SessionSnapshot> {
		let session = self.stack.last()?;
		Some(session.snapshot(host.buffer(session.buffer())))
	}

	fn navigate<H: Host>(
		&mut self,
		host: &mut H,
		target: impl FnOnce(&Session, &FxHashSet<TabstopId>) -> Option<TabstopId>,
	) -> Option<TabstopId> {
		if !self.ensure_valid(host) {
			return None;
		}
		if host.edits_locked() {
			let stale = self
				.stack
				.last()
				.is_some_and(|top| host.buffer(top.buffer()).is_some_and(|buf| !top.is_synced(buf)));
			if stale {
				self.defer(Deferred::Sync);
				return None;
			}
		} else if !self.sync_top(host) {
			return None;
		}

		let top = self.stack.last_mut()?;
		top.mark_visited();
		let present = top.present_ids();
		let from = top.current().clone();
		let to = target(top, &present).unwrap_or_else(|| from.clone());

		self.emit(SessionEvent::JumpPre {
			from: from.clone(),
			to: to.clone(),
		});
		let top = self.stack.last_mut()?;
		let buf = host.buffer_mut(top.buffer())?;
		if let Err(err) = top.focus(buf, to.clone()) {
			self.teardown(host, err);
			return None;
		}
		tracing::debug!(session = top.id(), %from, %to, "jumped");
		self.emit(SessionEvent::Jump { from, to: to.clone() });
		Some(to)
	}

	/// Syncs the top session. Returns `false` if there is none or it had to
	/// be torn down.
	fn sync_top<H: Host>(&mut self, host: &mut H) -> bool {
		let Some(top) = self.stack.last_mut() else {
			return false;
		};
		let Some(buf) = host.buffer_mut(top.buffer()) else {
			return false;
		};
		self.syncing = true;
		let result = top.sync(buf, &self.config.comment_leaders);
		self.syncing = false;
		match result {
			Ok(_) => true,
			Err(err) => {
				self.teardown(host, err);
				false
			}
		}
	}

	fn autostop_on_edit<H: Host>(&mut self, host: &mut H) {
		if !self.config.autostop_on_final_edit {
			return;
		}
		let edited = self
			.stack
			.last()
			.is_some_and(|top| host.buffer(top.buffer()).is_some_and(|buf| top.final_edited(buf)));
		if edited {
			tracing::debug!("final tabstop edited, stopping session");
			self.stop(host);
		}
	}

	/// Tears down the top session while it is corrupt. Returns whether a
	/// valid session remains.
	fn ensure_valid<H: Host>(&mut self, host: &mut H) -> bool {
		while let Some(top) = self.stack.last() {
			match top.validate(host.buffer(top.buffer())) {
				Ok(()) => return true,
				Err(err) => self.teardown(host, err),
			}
		}
		false
	}

	fn teardown<H: Host>(&mut self, host: &mut H, err: SessionError) {
		tracing::warn!(%err, "stopping corrupt snippet session");
		host.notify(Level::Warn, &format!("snippet session stopped: {err}"));
		if let Some(session) = self.stack.pop() {
			self.finish(host, session);
		}
		self.resume_top(host);
	}

	fn finish<H: Host>(&mut self, host: &mut H, session: Session) {
		let snapshot = session.snapshot(host.buffer(session.buffer()));
		if let Some(buf) = host.buffer_mut(session.buffer()) {
			session.release(buf);
		}
		tracing::debug!(session = session.id(), depth = self.stack.len(), "stopped snippet session");
		self.emit(SessionEvent::Stop(snapshot));
	}

	/// Brings the new top back after a stop, deferring if edits are locked.
	fn resume_top<H: Host>(&mut self, host: &mut H) {
		let Some(top) = self.stack.last() else {
			return;
		};
		if let Err(err) = top.validate(host.buffer(top.buffer())) {
			self.teardown(host, err);
			return;
		}
		if host.edits_locked() {
			self.defer(Deferred::Resume);
			return;
		}
		self.resume_now(host);
	}

	fn resume_now<H: Host>(&mut self, host: &mut H) {
		if !self.sync_top(host) {
			return;
		}
		let Some(top) = self.stack.last_mut() else {
			return;
		};
		if !top.is_hidden() {
			return;
		}
		top.set_hidden(false);
		let snapshot = top.snapshot(host.buffer(top.buffer()));
		tracing::debug!(session = snapshot.session, current = %snapshot.current, "resumed snippet session");
		self.emit(SessionEvent::Resume(snapshot));
	}

	fn defer(&mut self, item: Deferred) {
		if !self.deferred.contains(&item) {
			tracing::trace!(?item, "deferring snippet work until edits are allowed");
			self.deferred.push(item);
		}
	}

	fn emit(&mut self, event: SessionEvent) {
		tracing::trace!(event = event.name(), observers = self.observers.len(), "session event");
		for observer in &mut self.observers {
			observer(&event);
		}
	}
}
