//! `${...}` delimited expressions embedded in text

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    /// Inner text of a `${...}` block, delimiters removed.
    Expression(&'a str),
}

/// Splits text into literal runs and `${...}` blocks. Braces inside quoted
/// strings do not count toward nesting. An unterminated `${` is kept as
/// literal text.
pub fn split_template(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;

    while let Some(found) = text[cursor..].find("${") {
        let open = cursor + found;
        let Some(close) = find_close(text, open + 2) else {
            break;
        };
        if open > literal_start {
            segments.push(Segment::Literal(&text[literal_start..open]));
        }
        segments.push(Segment::Expression(&text[open + 2..close]));
        literal_start = close + 1;
        cursor = literal_start;
    }

    if literal_start < text.len() {
        segments.push(Segment::Literal(&text[literal_start..]));
    }
    segments
}

fn find_close(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in text[start..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '{' => depth += 1,
            '}' if depth == 0 => return Some(start + i),
            '}' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Strips `${` `}` when the whole text is one delimited expression, so bare
/// and delimited forms parse the same.
pub fn normalize(text: &str) -> &str {
    let trimmed = text.trim();
    let segments = split_template(trimmed);
    if let [Segment::Expression(inner)] = segments[..] {
        return inner.trim();
    }
    trimmed
}
