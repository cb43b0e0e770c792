//! Tabstop traversal order and the ring of next/prev links.

use std::collections::BTreeMap;

use crate::node::{Node, TabstopId, walk};

/// Navigation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
	Next,
	Prev,
}

/// Error for an unknown direction name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid jump direction `{0}`: expected `next` or `prev`")]
pub struct InvalidDirection(pub String);

impl std::str::FromStr for Direction {
	type Err = InvalidDirection;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"next" => Ok(Direction::Next),
			"prev" => Ok(Direction::Prev),
			other => Err(InvalidDirection(other.to_string())),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabstopLink {
	pub prev: TabstopId,
	pub next: TabstopId,
	pub is_visited: bool,
}

/// Distinct tabstop ids in traversal order, linked into a ring.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TabstopGraph {
	order: Vec<TabstopId>,
	links: BTreeMap<TabstopId, TabstopLink>,
}

impl TabstopGraph {
	/// Collects every tabstop id in `nodes` (placeholders included).
	pub fn build(nodes: &[Node]) -> Self {
		let mut order: Vec<TabstopId> = Vec::new();
		walk(nodes, &mut |node| {
			if let Some(id) = node.tabstop_id() {
				order.push(id.clone());
			}
		});
		order.sort();
		order.dedup();

		let len = order.len();
		let links = order
			.iter()
			.enumerate()
			.map(|(i, id)| {
				let link = TabstopLink {
					prev: order[(i + len - 1) % len].clone(),
					next: order[(i + 1) % len].clone(),
					is_visited: false,
				};
				(id.clone(), link)
			})
			.collect();
		Self { order, links }
	}

	pub fn order(&self) -> &[TabstopId] {
		&self.order
	}

	pub fn len(&self) -> usize {
		self.order.len()
	}

	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	pub fn contains(&self, id: &TabstopId) -> bool {
		self.links.contains_key(id)
	}

	pub fn link(&self, id: &TabstopId) -> Option<&TabstopLink> {
		self.links.get(id)
	}

	pub fn links(&self) -> &BTreeMap<TabstopId, TabstopLink> {
		&self.links
	}

	pub fn mark_visited(&mut self, id: &TabstopId) {
		if let Some(link) = self.links.get_mut(id) {
			link.is_visited = true;
		}
	}

	/// Follows the ring from `from`, skipping ids for which `present` is false.
	///
	/// Returns `from` itself after a full lap when nothing else is present.
	pub fn step(&self, from: &TabstopId, direction: Direction, present: impl Fn(&TabstopId) -> bool) -> Option<TabstopId> {
		let mut cur = from;
		for _ in 0..self.order.len() {
			let link = self.links.get(cur)?;
			cur = match direction {
				Direction::Next => &link.next,
				Direction::Prev => &link.prev,
			};
			if present(cur) {
				return Some(cur.clone());
			}
		}
		None
	}

	/// First present id in traversal order.
	pub fn first(&self, present: impl Fn(&TabstopId) -> bool) -> Option<TabstopId> {
		self.order.iter().find(|id| present(id)).cloned()
	}

	/// Last present id in traversal order.
	pub fn last(&self, present: impl Fn(&TabstopId) -> bool) -> Option<TabstopId> {
		self.order.iter().rev().find(|id| present(id)).cloned()
	}
}
