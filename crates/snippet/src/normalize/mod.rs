//! Normalization: resolves variables and tabstop values, fills missing
//! placeholders, links repeated tabstops to their first occurrence and makes
//! sure a final tabstop exists.

use rustc_hash::FxHashMap;

use crate::node::{Node, Tabstop, TabstopId, contains_tabstop};
use crate::vars::{Lookup, SnippetVarResolver};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
	#[error("tabstop `{id}` contains itself in its placeholder")]
	LinkCycle { id: TabstopId },
}

/// Normalizes parsed nodes.
///
/// Variables are resolved from `lookup` first and `resolver` second, and the
/// result is cached into `lookup`. Names in `uncached` always go to the
/// resolver and are never cached.
pub fn normalize(
	mut nodes: Vec<Node>,
	lookup: &mut Lookup,
	resolver: &dyn SnippetVarResolver,
	uncached: &[String],
) -> Result<Vec<Node>, NormalizeError> {
	let mut resolve = Resolve { lookup, resolver, uncached };
	resolve.nodes(&mut nodes);

	let mut refs = FxHashMap::default();
	link(&mut nodes, &mut refs)?;

	let final_stop = TabstopId::final_stop();
	if !contains_tabstop(&nodes, &final_stop) {
		let mut tabstop = Tabstop::new(final_stop);
		tabstop.placeholder = Some(vec![Node::Text(String::new())]);
		nodes.push(Node::Tabstop(tabstop));
	}
	tracing::trace!(nodes = nodes.len(), linked = refs.len(), "normalized snippet");
	Ok(nodes)
}

struct Resolve<'a> {
	lookup: &'a mut Lookup,
	resolver: &'a dyn SnippetVarResolver,
	uncached: &'a [String],
}

impl Resolve<'_> {
	fn nodes(&mut self, nodes: &mut [Node]) {
		for node in nodes {
			self.node(node);
		}
	}

	fn node(&mut self, node: &mut Node) {
		let resolved = match node {
			Node::Text(_) => return,
			Node::Var(var) => self.var(&var.name),
			Node::Tabstop(tabstop) => self.lookup.get(tabstop.id.as_str()).cloned(),
		};
		if let (Some(value), Some(text)) = (resolved, node.text_mut()) {
			*text = Some(value);
		}

		let has_text = node.resolved_text().is_some();
		let first_choice = match node {
			Node::Tabstop(Tabstop { choices: Some(choices), .. }) => choices.first().cloned(),
			_ => None,
		};
		let Some(placeholder) = node.placeholder_mut() else {
			return;
		};
		if has_text {
			*placeholder = None;
		} else if let Some(children) = placeholder.as_mut() {
			self.nodes(children);
		} else {
			*placeholder = Some(vec![Node::Text(first_choice.unwrap_or_default())]);
		}
	}

	fn var(&mut self, name: &str) -> Option<String> {
		if self.uncached.iter().any(|uncached| uncached == name) {
			return self.resolver.resolve_var(name);
		}
		if let Some(value) = self.lookup.get(name) {
			return Some(value.clone());
		}
		let value = self.resolver.resolve_var(name)?;
		self.lookup.insert(name.to_string(), value.clone());
		Some(value)
	}
}

/// Values the first occurrence of a tabstop hands to later occurrences.
#[derive(Debug, Clone)]
struct Reference {
	text: Option<String>,
	placeholder: Option<Vec<Node>>,
	choices: Option<Vec<String>>,
}

fn link(nodes: &mut [Node], refs: &mut FxHashMap<TabstopId, Reference>) -> Result<(), NormalizeError> {
	for node in nodes {
		let tabstop = match node {
			Node::Text(_) => continue,
			Node::Var(var) => {
				if let Some(children) = &mut var.placeholder {
					link(children, refs)?;
				}
				continue;
			}
			Node::Tabstop(tabstop) => tabstop,
		};

		if let Some(reference) = refs.get(&tabstop.id) {
			tabstop.text = reference.text.clone();
			tabstop.placeholder = reference.placeholder.clone();
			tabstop.choices = reference.choices.clone();
			continue;
		}

		if let Some(children) = &mut tabstop.placeholder {
			if contains_tabstop(children, &tabstop.id) {
				return Err(NormalizeError::LinkCycle { id: tabstop.id.clone() });
			}
			link(children, refs)?;
		}
		refs.insert(
			tabstop.id.clone(),
			Reference {
				text: tabstop.text.clone(),
				placeholder: tabstop.placeholder.clone(),
				choices: tabstop.choices.clone(),
			},
		);
	}
	Ok(())
}
