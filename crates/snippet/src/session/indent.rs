//! Line indentation used when inserting and propagating multi-line text.

/// Leading whitespace of `line`, extended over a comment leader (and the
/// whitespace after it) when one directly follows.
pub fn line_indent<'a>(line: &'a str, leaders: &[String]) -> &'a str {
	let ws = line.len() - line.trim_start_matches([' ', '\t']).len();
	let rest = &line[ws..];
	let Some(leader) = leaders.iter().filter(|l| !l.is_empty() && rest.starts_with(l.as_str())).max_by_key(|l| l.len())
	else {
		return &line[..ws];
	};
	let after = &rest[leader.len()..];
	let trailing = after.len() - after.trim_start_matches([' ', '\t']).len();
	&line[..ws + leader.len() + trailing]
}

/// Strips `base` from the start of every line but the first.
///
/// Lines that do not carry the full `base` prefix lose their leading
/// whitespace instead.
pub fn dedent(text: &str, base: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for (i, line) in text.split('\n').enumerate() {
		if i > 0 {
			out.push('\n');
			match line.strip_prefix(base) {
				Some(rest) => out.push_str(rest),
				None => out.push_str(line.trim_start_matches([' ', '\t'])),
			}
		} else {
			out.push_str(line);
		}
	}
	out
}

/// Prefixes every line but the first with `indent`.
pub fn reindent(text: &str, indent: &str) -> String {
	if indent.is_empty() {
		return text.to_string();
	}
	text.replace('\n', &format!("\n{indent}"))
}
