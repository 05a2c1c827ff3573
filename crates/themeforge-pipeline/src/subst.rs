//! Value-position variable substitution.
//!
//! Replaces occurrences of a variable token only where it appears after a
//! `:` in declaration value position, never in selector position. Textual
//! on purpose: this runs on Less source, which no CSS parser accepts.

/// Replace every value-position occurrence of `name` in `content`.
///
/// An occurrence counts when the token is not followed by an identifier
/// character (so `@primary-color` never matches inside `@primary-color-x`)
/// and the nearest preceding `:`/`;`/`{`/`}` is a `:`.
pub(crate) fn substitute_value_position(content: &str, name: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut last = 0;
    for (start, _) in content.match_indices(name) {
        if start < last {
            // Overlaps a replacement we already made.
            continue;
        }
        let end = start + name.len();
        if content[end..]
            .bytes()
            .next()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            continue;
        }
        if !in_value_position(&content[..start]) {
            continue;
        }
        out.push_str(&content[last..start]);
        out.push_str(replacement);
        last = end;
    }
    out.push_str(&content[last..]);
    out
}

fn in_value_position(before: &str) -> bool {
    for b in before.bytes().rev() {
        match b {
            b':' => return true,
            b';' | b'{' | b'}' | b'\n' => return false,
            _ => {}
        }
    }
    false
}
