#![allow(unused_crate_dependencies)]

//! End-to-end expansion scenarios against the in-memory host.

use pretty_assertions::assert_eq;
use stencil_buffer::{BufferId, Host, MemoryHost, Position, TextBuffer};
use stencil_snippet::{
	Direction, Lookup, NoVars, Node, NormalizeError, SessionEvent, SnippetEngine, SnippetError, TabstopId, normalize,
	parse_snippet, walk,
};

fn id(s: &str) -> TabstopId {
	TabstopId::new(s).unwrap()
}

struct Editor {
	engine: SnippetEngine,
	host: MemoryHost,
	buffer: BufferId,
}

impl Editor {
	fn new(text: &str) -> Self {
		let _ = tracing_subscriber::fmt().with_test_writer().try_init();
		let mut host = MemoryHost::new();
		let buffer = host.open(text);
		if let Some(buf) = host.buffer_mut(buffer) {
			let end = Position::new(buf.line_count() - 1, buf.line(buf.line_count() - 1).map_or(0, |l| l.chars().count()));
			buf.set_cursor(end);
		}
		Self {
			engine: SnippetEngine::default(),
			host,
			buffer,
		}
	}

	fn expand(&mut self, body: &str) -> bool {
		self.engine
			.expand(&mut self.host, self.buffer, body, &mut Lookup::default(), &NoVars)
			.unwrap()
	}

	fn type_text(&mut self, text: &str) {
		self.host.buffer_mut(self.buffer).unwrap().type_text(text);
		self.engine.on_text_changed(&mut self.host, self.buffer);
	}

	fn next(&mut self) -> Option<TabstopId> {
		self.engine.jump(&mut self.host, Direction::Next)
	}

	fn prev(&mut self) -> Option<TabstopId> {
		self.engine.jump(&mut self.host, Direction::Prev)
	}

	fn move_cursor(&mut self, line: usize, col: usize) {
		self.host.buffer_mut(self.buffer).unwrap().set_cursor(Position::new(line, col));
		self.engine.on_cursor_moved(&mut self.host, self.buffer);
	}

	fn current(&self) -> Option<&TabstopId> {
		self.engine.active().map(|session| session.current())
	}

	fn text(&self) -> String {
		self.host.text(self.buffer)
	}
}

#[test]
fn plain_tabstops_are_visited_in_order() {
	let parsed = parse_snippet("T1=$1 T2=$2 T0=$0").unwrap();
	let ids: Vec<_> = parsed.iter().filter_map(Node::tabstop_id).map(TabstopId::as_str).collect();
	assert_eq!(ids, vec!["1", "2", "0"]);

	let mut ed = Editor::new("");
	assert!(ed.expand("T1=$1 T2=$2 T0=$0"));
	assert_eq!(ed.current(), Some(&id("1")));
	ed.type_text("x");
	assert_eq!(ed.next(), Some(id("2")));
	assert_eq!(ed.next(), Some(id("0")));
	assert_eq!(ed.text(), "T1=x T2= T0=");
}

#[test]
fn typing_updates_copy_nested_in_another_placeholder() {
	let mut ed = Editor::new("");
	ed.expand("T1=${1:aa} T2=${2:<$1>}");
	ed.type_text("x");
	assert_eq!(ed.text(), "T1=x T2=<x>");
}

#[test]
fn linked_occurrence_mirrors_reference() {
	let mut ed = Editor::new("");
	ed.expand("T1=${1:text} T1=$1");
	assert_eq!(ed.text(), "T1=text T1=text");
	ed.type_text("y");
	assert_eq!(ed.text(), "T1=y T1=y");
}

#[test]
fn adjacent_copy_receives_every_keystroke() {
	let mut ed = Editor::new("");
	ed.expand("${1:a}$1|$2");
	for key in ["x", "y", "z"] {
		ed.type_text(key);
	}
	assert_eq!(ed.text(), "xyzxyz|");

	assert_eq!(ed.next(), Some(id("2")));
	ed.type_text("Q");
	assert_eq!(ed.prev(), Some(id("1")));
	ed.type_text("W");
	ed.type_text("V");
	assert_eq!(ed.text(), "xyzWVxyzWV|Q");
}

#[test]
fn editing_inside_placeholder_updates_copy() {
	let mut ed = Editor::new("");
	ed.expand("${1:text} $1");
	ed.move_cursor(0, 2);
	ed.type_text("X");
	assert_eq!(ed.text(), "teXxt teXxt");
	ed.next();
	assert_eq!(ed.text(), "teXxt teXxt");
}

#[test]
fn deleting_placeholder_clears_copy() {
	let mut ed = Editor::new("");
	ed.expand("${1:ab} $1");
	ed.host.buffer_mut(ed.buffer).unwrap().delete(Position::new(0, 0), Position::new(0, 2));
	ed.engine.on_text_changed(&mut ed.host, ed.buffer);
	assert_eq!(ed.text(), " ");
	ed.type_text("c");
	assert_eq!(ed.text(), "c c");
}

#[test]
fn choice_normalizes_to_first_option() {
	let nodes = normalize(parse_snippet("T1=${1|left,right|}").unwrap(), &mut Lookup::default(), &NoVars, &[]).unwrap();
	let Node::Tabstop(tabstop) = &nodes[1] else {
		panic!("expected tabstop, got {:?}", nodes[1]);
	};
	assert_eq!(tabstop.placeholder, Some(vec![Node::text("left")]));
	assert_eq!(tabstop.choices, Some(vec!["left".to_string(), "right".to_string()]));
}

#[test]
fn mutual_nesting_is_accepted_but_self_reference_is_not() {
	let nodes = normalize(parse_snippet("${1:$2} ${2:$1}").unwrap(), &mut Lookup::default(), &NoVars, &[]);
	assert!(nodes.is_ok());

	for body in ["${1:$1}", "${1:${2:$1}}"] {
		let err = normalize(parse_snippet(body).unwrap(), &mut Lookup::default(), &NoVars, &[]).unwrap_err();
		assert_eq!(err, NormalizeError::LinkCycle { id: id("1") });
	}

	let mut ed = Editor::new("");
	let err = ed.engine.expand(&mut ed.host, ed.buffer, "${1:$1}", &mut Lookup::default(), &NoVars);
	assert!(matches!(err, Err(SnippetError::Normalize(_))));
}

#[test]
fn multiline_linked_text_keeps_relative_indent() {
	let mut ed = Editor::new("fn main() {\n    ");
	ed.expand("let ${1:v} = 1;\n// ${1}\n$0");
	assert_eq!(ed.text(), "fn main() {\n    let v = 1;\n    // v\n    ");

	ed.type_text("a\n    b");
	assert_eq!(ed.text(), "fn main() {\n    let a\n    b = 1;\n    // a\n    // b\n    ");
}

#[test]
fn wraparound_returns_to_start() {
	let mut ed = Editor::new("");
	ed.expand("$3 ${1:a} ${2:b} $1");
	let count = ed.engine.active().unwrap().graph().len();
	for _ in 0..count {
		ed.next();
	}
	assert_eq!(ed.current(), Some(&id("1")));
}

#[test]
fn overwritten_placeholder_tabstops_are_skipped() {
	let mut ed = Editor::new("");
	ed.expand("${1:call(${2:arg})}; $3");
	ed.type_text("nothing");
	assert_eq!(ed.text(), "nothing; ");
	assert_eq!(ed.next(), Some(id("3")));
	assert_eq!(ed.next(), Some(id("0")));
	assert_eq!(ed.next(), Some(id("1")));
}

#[test]
fn nested_expansion_lifecycle() {
	let mut ed = Editor::new("");
	let events = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
	let sink = events.clone();
	ed.engine.subscribe(move |event| {
		if let SessionEvent::Start(snapshot) | SessionEvent::Resume(snapshot) = event {
			sink.borrow_mut().push((event.name(), snapshot.text()));
		}
	});

	ed.expand("if ${1:cond} {\n\t$0\n}");
	ed.expand("${1:a} == ${2:b}");
	ed.type_text("x");
	ed.next();
	ed.type_text("y");
	ed.engine.stop(&mut ed.host);

	assert_eq!(ed.text(), "if x == y {\n\t\n}");
	assert_eq!(ed.current(), Some(&id("1")));
	assert_eq!(ed.next(), Some(id("0")));
	assert_eq!(ed.host.buffer(ed.buffer).unwrap().cursor(), Position::new(1, 1));
	assert_eq!(
		*events.borrow(),
		vec![
			("start", "if cond {\n\t\n}".to_string()),
			("start", "a == b".to_string()),
			("resume", "if x == y {\n\t\n}".to_string()),
		]
	);
}

#[test]
fn every_node_kind_survives_in_snapshot() {
	let mut ed = Editor::new("");
	ed.expand("${1|a,b|} ${VAR:v} $2");
	let snapshot = ed.engine.snapshot(&ed.host).unwrap();
	let mut kinds = Vec::new();
	walk(&snapshot.nodes, &mut |node| {
		kinds.push(match node {
			Node::Text(_) => "text",
			Node::Tabstop(_) => "tabstop",
			Node::Var(_) => "var",
		})
	});
	assert_eq!(
		kinds,
		vec!["tabstop", "text", "text", "var", "text", "text", "tabstop", "text", "tabstop", "text"]
	);
	assert_eq!(snapshot.text(), "a v ");
}
