//! Text normalization for structural comparison.
//!
//! Comments are removed (block comments nest) and whitespace collapses to
//! nothing, except a single space between two word characters so that
//! `val x` never becomes `valx`. String, raw-string and character literals are
//! copied verbatim.

/// Normalize a source fragment.
pub fn normalize(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        match c {
            '/' if next == Some('/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                pending_space = true;
            }
            '/' if next == Some('*') => {
                i = skip_block_comment(&chars, i);
                pending_space = true;
            }
            c if c.is_whitespace() => {
                pending_space = true;
                i += 1;
            }
            '"' | '\'' => {
                flush_space(&mut out, &mut pending_space, c);
                let end = literal_end(&chars, i);
                out.extend(&chars[i..end]);
                i = end;
            }
            _ => {
                flush_space(&mut out, &mut pending_space, c);
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

/// Whether two fragments differ in more than comments and whitespace.
pub fn differs(a: &str, b: &str) -> bool {
    normalize(a) != normalize(b)
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn flush_space(out: &mut String, pending: &mut bool, next: char) {
    if *pending
        && let Some(prev) = out.chars().last()
        && is_word(prev)
        && is_word(next)
    {
        out.push(' ');
    }
    *pending = false;
}

/// Index just past a (possibly nested) block comment starting at `start`.
fn skip_block_comment(chars: &[char], start: usize) -> usize {
    let mut depth = 0usize;
    let mut i = start;
    while i < chars.len() {
        match (chars[i], chars.get(i + 1)) {
            ('/', Some('*')) => {
                depth += 1;
                i += 2;
            }
            ('*', Some('/')) => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    return i;
                }
            }
            _ => i += 1,
        }
    }
    chars.len()
}

/// Index just past the literal starting at `start`.
///
/// Unterminated literals run to the end of the input.
fn literal_end(chars: &[char], start: usize) -> usize {
    let quote = chars[start];

    if quote == '"' && chars[start..].starts_with(&['"', '"', '"']) {
        let mut i = start + 3;
        while i < chars.len() {
            if chars[i..].starts_with(&['"', '"', '"']) {
                // Extra closing quotes belong to the content
                let mut end = i + 3;
                while end < chars.len() && chars[end] == '"' {
                    end += 1;
                }
                return end;
            }
            i += 1;
        }
        return chars.len();
    }

    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '$' if quote == '"' && chars.get(i + 1) == Some(&'{') => {
                i = template_end(chars, i + 1);
            }
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    chars.len()
}

/// Index just past the `}` closing a `${ .. }` template opened at `open`.
fn template_end(chars: &[char], open: usize) -> usize {
    let mut depth = 0usize;
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            '"' | '\'' => {
                i = literal_end(chars, i);
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    chars.len()
}
