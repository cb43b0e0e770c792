use proptest::prelude::*;

use super::*;

fn buf(text: &str) -> RopeBuffer {
	RopeBuffer::new(BufferId(1), text)
}

fn p(line: usize, col: usize) -> Position {
	Position::new(line, col)
}

#[test]
fn lines_strip_terminators() {
	let b = buf("ab\r\ncd\n");
	assert_eq!(b.line_count(), 3);
	assert_eq!(b.line(0).as_deref(), Some("ab"));
	assert_eq!(b.line(1).as_deref(), Some("cd"));
	assert_eq!(b.line(2).as_deref(), Some(""));
	assert_eq!(b.line(3), None);
}

#[test]
fn positions_round_trip_through_offsets() {
	let b = buf("hello\nworld");
	assert_eq!(b.pos_to_char(p(1, 2)), 8);
	assert_eq!(b.char_to_pos(8), p(1, 2));
	assert_eq!(b.pos_to_char(p(0, 99)), 5);
	assert_eq!(b.pos_to_char(p(9, 0)), 11);
}

#[test]
fn expanding_range_absorbs_text_at_both_edges() {
	let mut b = buf("abc");
	let id = b.create_range(p(0, 1), p(0, 2), Gravity::Expand);
	b.insert(p(0, 2), "X");
	b.insert(p(0, 1), "Y");
	assert_eq!(b.range_text(id).as_deref(), Some("YbX"));
}

#[test]
fn left_and_right_ranges_do_not_absorb() {
	let mut b = buf("ab");
	let left = b.create_range(p(0, 0), p(0, 1), Gravity::Left);
	let right = b.create_range(p(0, 1), p(0, 2), Gravity::Right);
	b.insert(p(0, 1), "Z");
	assert_eq!(b.text(), "aZb");
	assert_eq!(b.range_text(left).as_deref(), Some("a"));
	assert_eq!(b.range_text(right).as_deref(), Some("b"));
}

#[test]
fn empty_neighbours_split_around_insertion() {
	let mut b = buf("");
	let before = b.create_range(p(0, 0), p(0, 0), Gravity::Left);
	let active = b.create_range(p(0, 0), p(0, 0), Gravity::Expand);
	let after = b.create_range(p(0, 0), p(0, 0), Gravity::Right);
	b.insert(p(0, 0), "xy");
	assert_eq!(b.range(before), Some((p(0, 0), p(0, 0))));
	assert_eq!(b.range(active), Some((p(0, 0), p(0, 2))));
	assert_eq!(b.range(after), Some((p(0, 2), p(0, 2))));
}

#[test]
fn deletion_collapses_enclosed_ranges() {
	let mut b = buf("one two three");
	let inner = b.create_range(p(0, 4), p(0, 7), Gravity::Right);
	let outer = b.create_range(p(0, 0), p(0, 13), Gravity::Expand);
	b.delete(p(0, 3), p(0, 8));
	assert_eq!(b.text(), "onethree");
	assert_eq!(b.range(inner), Some((p(0, 3), p(0, 3))));
	assert_eq!(b.range_text(outer).as_deref(), Some("onethree"));
}

#[test]
fn type_text_moves_cursor_and_bumps_tick() {
	let mut b = buf("ac");
	b.set_cursor(p(0, 1));
	let tick = b.changedtick();
	b.type_text("b");
	assert_eq!(b.text(), "abc");
	assert_eq!(b.cursor(), p(0, 2));
	assert_eq!(b.changedtick(), tick + 1);
	b.backspace(2);
	assert_eq!(b.text(), "c");
	assert_eq!(b.cursor(), p(0, 0));
}

#[test]
fn reset_content_leaves_stale_ranges_unresolvable() {
	let mut b = buf("line one\nline two\n");
	let id = b.create_range(p(1, 0), p(1, 8), Gravity::Expand);
	b.reset_content("x");
	assert_eq!(b.range(id), None);
}

#[test]
fn released_range_stops_resolving() {
	let mut b = buf("abc");
	let id = b.create_range(p(0, 0), p(0, 1), Gravity::Expand);
	b.release_range(id);
	assert_eq!(b.range(id), None);
	assert_eq!(b.tracked_count(), 0);
}

proptest! {
	#[test]
	fn ranges_stay_ordered_and_in_bounds(
		doc in "[a-z\n]{0,40}",
		edits in proptest::collection::vec((0usize..50, 0usize..50, "[a-z\n]{0,5}"), 0..20),
	) {
		let mut b = buf(&doc);
		let len = b.len_chars();
		let ids = [
			b.create_range(b.char_to_pos(0), b.char_to_pos(len / 2), Gravity::Expand),
			b.create_range(b.char_to_pos(len / 2), b.char_to_pos(len), Gravity::Left),
			b.create_range(b.char_to_pos(len / 3), b.char_to_pos(len / 3), Gravity::Right),
		];
		for (a, z, text) in edits {
			let len = b.len_chars();
			let (a, z) = (a.min(len), z.min(len));
			let (start, end) = (a.min(z), a.max(z));
			b.replace(b.char_to_pos(start), b.char_to_pos(end), &text);
		}
		for id in ids {
			let (start, end) = b.range(id).expect("range resolves");
			prop_assert!(start <= end);
			prop_assert!(b.pos_to_char(end) <= b.len_chars());
		}
	}
}
