//! Text helpers shared by the manuscript analyzers.
//!
//! All matching is case-insensitive. Offsets are byte offsets and are always
//! snapped to char boundaries before slicing; window radii count chars.

/// Byte offsets of every occurrence of `needle` in `haystack`.
///
/// Both arguments are expected to be lowercased already.
pub fn find_all(haystack: &str, needle: &str) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }
    haystack.match_indices(needle).map(|(i, _)| i).collect()
}

/// Largest char boundary `<= idx`.
pub fn floor_boundary(s: &str, idx: usize) -> usize {
    let mut idx = idx.min(s.len());
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Up to `radius` chars either side of the byte offset `center`.
pub fn window_around(s: &str, center: usize, radius: usize) -> &str {
    let center = floor_boundary(s, center);
    let start = s[..center]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map_or(center, |(i, _)| i);
    let end = s[center..]
        .char_indices()
        .nth(radius)
        .map_or(s.len(), |(i, _)| center + i);
    &s[start..end]
}

/// Lowercased copy of a text that can map its offsets back to the original.
///
/// Lowercasing may change byte lengths ('İ' becomes two chars, 'ẞ' shrinks),
/// so offsets found in the folded text cannot index the original directly.
#[derive(Debug, Clone)]
pub struct FoldedText<'a> {
    original: &'a str,
    folded: String,
    /// `(folded offset, original offset)` for every folded char, ascending.
    origins: Vec<(usize, usize)>,
}

impl<'a> FoldedText<'a> {
    pub fn new(original: &'a str) -> Self {
        let mut folded = String::with_capacity(original.len());
        let mut origins = Vec::with_capacity(original.len());
        for (idx, c) in original.char_indices() {
            for lower in c.to_lowercase() {
                origins.push((folded.len(), idx));
                folded.push(lower);
            }
        }
        Self {
            original,
            folded,
            origins,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.folded
    }

    pub fn original(&self) -> &'a str {
        self.original
    }

    /// Byte offset in the original text of the char at folded offset `idx`.
    pub fn original_offset(&self, idx: usize) -> usize {
        if idx >= self.folded.len() {
            return self.original.len();
        }
        match self.origins.binary_search_by_key(&idx, |&(folded, _)| folded) {
            Ok(i) => self.origins[i].1,
            Err(0) => 0,
            Err(i) => self.origins[i - 1].1,
        }
    }
}

/// First `n` characters.
pub fn head_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Last `n` characters.
pub fn tail_chars(s: &str, n: usize) -> &str {
    let count = s.chars().count();
    if count <= n {
        return s;
    }
    match s.char_indices().nth(count - n) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

/// Lowercased alphanumeric words.
pub fn words(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
}

/// Lowercase, hyphen-separated identifier fragment ("Kael Voss" -> "kael-voss").
pub fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    let mut last_dash = true;
    for c in s.chars().flat_map(|c| c.to_lowercase()) {
        if c.is_alphanumeric() {
            slug.push(c);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Truncate to at most `max` characters on a word boundary, appending "...".
pub fn truncate_words(s: &str, max: usize) -> String {
    let trimmed = s.trim();
    if trimmed.chars().count() <= max {
        return trimmed.to_string();
    }
    let cut = head_chars(trimmed, max);
    match cut.rfind(' ') {
        Some(pos) if pos > 0 => format!("{}...", &cut[..pos]),
        _ => format!("{}...", cut),
    }
}
