#![allow(unused_crate_dependencies)]

//! Property tests over generated snippet bodies.

use proptest::prelude::*;
use stencil_buffer::{Host, MemoryHost, Position, TextBuffer};
use stencil_snippet::{
	Direction, Lookup, NoVars, Node, SnippetEngine, TabstopGraph, dedent, escape_text, line_indent, normalize,
	parse_snippet, reindent, render_default, walk,
};

fn text() -> impl Strategy<Value = String> {
	"[a-z \\n$}\\\\]{0,6}".prop_map(|s| escape_text(&s))
}

fn tabstop_id() -> impl Strategy<Value = u32> {
	1u32..5
}

/// Snippet bodies without transforms or final tabstops.
fn body() -> impl Strategy<Value = String> {
	let leaf = prop_oneof![
		text(),
		tabstop_id().prop_map(|n| format!("${n}")),
		(tabstop_id(), "[a-z]{1,3}", "[a-z]{1,3}").prop_map(|(n, a, b)| format!("${{{n}|{a},{b}|}}")),
		"[A-Z]{1,4}".prop_map(|name| format!("${{{name}}}")),
	];
	leaf.prop_recursive(3, 24, 4, |inner| {
		prop_oneof![
			prop::collection::vec(inner.clone(), 0..4).prop_map(|parts| parts.concat()),
			(tabstop_id(), prop::collection::vec(inner, 0..3))
				.prop_map(|(n, parts)| format!("${{{n}:{}}}", parts.concat())),
		]
	})
}

fn normalized(body: &str) -> Option<Vec<Node>> {
	let parsed = parse_snippet(body).ok()?;
	normalize(parsed, &mut Lookup::default(), &NoVars, &[]).ok()
}

proptest! {
	#[test]
	fn generated_bodies_parse(body in body()) {
		prop_assert!(parse_snippet(&body).is_ok(), "failed to parse {body:?}");
	}

	#[test]
	fn default_text_reparses_as_plain_text(body in body()) {
		let parsed = parse_snippet(&body).unwrap();
		let rendered = render_default(&parsed);
		let reparsed = parse_snippet(&escape_text(&rendered)).unwrap();
		prop_assert_eq!(reparsed, vec![Node::Text(rendered)]);
	}

	#[test]
	fn normalized_tree_has_one_final_tabstop(body in body()) {
		let Some(nodes) = normalized(&body) else {
			return Ok(());
		};
		let mut finals = 0;
		walk(&nodes, &mut |node| {
			if node.tabstop_id().is_some_and(|id| id.is_final()) {
				finals += 1;
			}
		});
		prop_assert_eq!(finals, 1);
	}

	#[test]
	fn normalize_is_idempotent(body in body()) {
		let Some(once) = normalized(&body) else {
			return Ok(());
		};
		let twice = normalize(once.clone(), &mut Lookup::default(), &NoVars, &[]).unwrap();
		prop_assert_eq!(twice, once);
	}

	#[test]
	fn stepping_len_times_wraps_around(body in body()) {
		let Some(nodes) = normalized(&body) else {
			return Ok(());
		};
		let graph = TabstopGraph::build(&nodes);
		for start in graph.order() {
			let mut at = start.clone();
			for _ in 0..graph.len() {
				at = graph.step(&at, Direction::Next, |_| true).unwrap();
			}
			prop_assert_eq!(&at, start);
		}
	}

	#[test]
	fn linked_copies_follow_reference_edits(
		typed in "[a-z]{1,3}(\n {0,6}[a-z]{1,3}){0,2}",
		indent in " {0,4}",
		copy_indent in "\t{0,2}",
	) {
		let mut host = MemoryHost::new();
		let buffer = host.open(&indent);
		host.buffer_mut(buffer).unwrap().set_cursor(Position::new(0, indent.len()));
		let mut engine = SnippetEngine::default();
		let body = format!("${{1:x}}\n{copy_indent}<$1>");
		engine.expand(&mut host, buffer, &body, &mut Lookup::default(), &NoVars).unwrap();

		host.buffer_mut(buffer).unwrap().type_text(&typed);
		engine.on_text_changed(&mut host, buffer);

		let snapshot = engine.snapshot(&host).unwrap();
		let copies: Vec<String> = snapshot
			.nodes
			.iter()
			.filter(|node| node.tabstop_id().is_some_and(|id| id.as_str() == "1"))
			.map(|node| node.resolved_text().unwrap_or_default().to_string())
			.collect();
		prop_assert_eq!(copies.len(), 2);
		prop_assert_eq!(&copies[0], &typed);
		let copy = &copies[1];

		let buf = host.buffer(buffer).unwrap();
		let copy_line = buf.line(typed.matches('\n').count() + 1).unwrap();
		let expected = reindent(&dedent(&typed, &indent), line_indent(&copy_line, &[]));
		prop_assert_eq!(copy, &expected);
	}

	#[test]
	fn copies_keep_up_with_interleaved_keystrokes(
		body in prop_oneof![Just("${1:x}$1"), Just("$1$1"), Just("${1:ab}$1$1"), Just("<${1:x}>$1")],
		first in "[a-z]{1,2}",
		keys in prop::collection::vec(prop::option::of("[a-z]{1,2}"), 0..8),
	) {
		let mut host = MemoryHost::new();
		let buffer = host.open("");
		let mut engine = SnippetEngine::default();
		engine.expand(&mut host, buffer, body, &mut Lookup::default(), &NoVars).unwrap();
		let prefix = usize::from(body.starts_with('<'));

		let mut typed = String::new();
		for key in std::iter::once(Some(first)).chain(keys) {
			let buf = host.buffer_mut(buffer).unwrap();
			match key {
				Some(text) => {
					buf.type_text(&text);
					typed.push_str(&text);
				}
				None if !typed.is_empty() => {
					buf.backspace(1);
					typed.pop();
				}
				None => continue,
			}
			engine.on_text_changed(&mut host, buffer);
		}

		let snapshot = engine.snapshot(&host).unwrap();
		let copies: Vec<&str> = snapshot
			.nodes
			.iter()
			.filter(|node| node.tabstop_id().is_some_and(|id| id.as_str() == "1"))
			.map(|node| node.resolved_text().unwrap_or("<placeholder>"))
			.collect();
		prop_assert!(copies.len() >= 2);
		for copy in copies {
			prop_assert_eq!(copy, typed.as_str());
		}
		let cursor = host.buffer(buffer).unwrap().cursor();
		prop_assert_eq!(cursor, Position::new(0, prefix + typed.chars().count()));
	}
}
