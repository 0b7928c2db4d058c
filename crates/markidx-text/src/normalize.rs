/// Lowercases and collapses every whitespace run to a single space.
pub fn normalize_filter(filter: &str) -> String {
	collapse_lower(filter)
}

/// Search string for one markup: `"{kind}\n{text}"`, both halves lowercased
/// and whitespace-collapsed. A markup without text indexes its kind alone.
pub fn normalize_markup(kind: &str, text: Option<&str>) -> String {
	let kind = collapse_lower(kind);
	match text.map(collapse_lower) {
		Some(text) if !text.is_empty() => format!("{}\n{}", kind, text),
		_ => kind,
	}
}

fn collapse_lower(s: &str) -> String {
	let mut out = String::with_capacity(s.len());
	for word in s.split_whitespace() {
		if !out.is_empty() { out.push(' '); }
		out.extend(word.chars().flat_map(char::to_lowercase));
	}
	out
}
