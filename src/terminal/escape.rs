//! Escaping for the three syntaxes commands are embedded in.
//!
//! Each function targets exactly one context. They are not interchangeable.

/// Escape for the inside of a POSIX double-quoted string.
///
/// Escapes `\ " $ `` ` `` !` and collapses line breaks into one space.
pub fn escape_posix(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_break = false;

    for c in s.chars() {
        if c == '\n' || c == '\r' {
            if !in_break {
                out.push(' ');
                in_break = true;
            }
            continue;
        }
        in_break = false;

        match c {
            '\\' | '"' | '$' | '`' | '!' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }

    out
}

/// Quote `s` as one POSIX single-quoted word.
///
/// For scripts run by a non-interactive shell, where `\!` inside double
/// quotes would keep its backslash. Every byte is literal except `'`,
/// which becomes `'\''`.
pub fn quote_posix(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Escape for the inside of an AppleScript double-quoted string.
pub fn escape_applescript(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '"' | '$') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape for a Windows batch file line.
///
/// `%` and `^` are doubled; `& < > |` get a `^` prefix.
pub fn escape_batch(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%%"),
            '^' => out.push_str("^^"),
            '&' | '<' | '>' | '|' => {
                out.push('^');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
