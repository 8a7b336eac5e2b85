//! Shared helpers for the script and stylesheet transformers:
//! offset to line/column mapping, source line lookup and line wrapping.

/// 1-based line and column of a byte offset in `source`
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = floor_char_boundary(source, offset.min(source.len()));
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

/// Text of the 1-based `line`, without its terminator
pub fn line_text(source: &str, line: usize) -> Option<&str> {
    if line == 0 {
        return None;
    }
    source
        .split('\n')
        .nth(line - 1)
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
}

fn floor_char_boundary(source: &str, mut offset: usize) -> usize {
    while offset > 0 && !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Break minified output into lines of roughly `column` characters.
///
/// A newline goes after the first `;` or `}` found once the current line
/// has reached `column`. Breaks are never placed inside string literals,
/// template literals or comments. `column <= 0` returns the input as is.
pub fn wrap_lines(code: &str, column: i32) -> String {
    if column <= 0 {
        return code.to_string();
    }
    let limit = column as usize;

    let mut out = String::with_capacity(code.len() + code.len() / limit.max(1));
    let mut current = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut in_block_comment = false;
    let mut prev = '\0';

    for c in code.chars() {
        out.push(c);
        if c == '\n' {
            current = 0;
        } else {
            current += 1;
        }

        if in_block_comment {
            if prev == '*' && c == '/' {
                in_block_comment = false;
            }
            prev = c;
            continue;
        }

        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            prev = c;
            continue;
        }

        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '*' if prev == '/' => in_block_comment = true,
            ';' | '}' if current >= limit => {
                out.push('\n');
                current = 0;
            }
            _ => {}
        }
        prev = c;
    }

    out
}
