//! Environment-variable expansion for entity-path values (§6, §11).
//!
//! Generalizes `original_source/utils/expand_env.cpp`'s single-form,
//! platform-conditional state machine (`$VAR` on POSIX, `%VAR%` on
//! Windows) into all four forms the path grammar names regardless of
//! host platform: `$VAR`, `${VAR}`, `$Env:VAR`, `%VAR%` (DESIGN.md Open
//! Question resolution).

/// Expand every recognized environment-variable reference in `input`,
/// substituting the empty string for an unset variable (matching the
/// original's "no-op if `getenv` returns null").
pub fn expand_env(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '$' {
            if chars.get(i + 1) == Some(&'{') {
                if let Some(end) = find(&chars, i + 2, '}') {
                    let name: String = chars[i + 2..end].iter().collect();
                    out.push_str(&lookup(&name));
                    i = end + 1;
                    continue;
                }
            } else if starts_with(&chars, i + 1, "Env:") {
                let name_start = i + 1 + "Env:".len();
                let end = var_name_end(&chars, name_start);
                let name: String = chars[name_start..end].iter().collect();
                out.push_str(&lookup(&name));
                i = end;
                continue;
            } else {
                let name_start = i + 1;
                let end = var_name_end(&chars, name_start);
                if end > name_start {
                    let name: String = chars[name_start..end].iter().collect();
                    out.push_str(&lookup(&name));
                    i = end;
                    continue;
                }
            }
        } else if c == '%' {
            if let Some(end) = find(&chars, i + 1, '%') {
                let name: String = chars[i + 1..end].iter().collect();
                out.push_str(&lookup(&name));
                i = end + 1;
                continue;
            }
        }
        out.push(c);
        i += 1;
    }
    out
}

fn lookup(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}

fn find(chars: &[char], from: usize, target: char) -> Option<usize> {
    chars[from..].iter().position(|&c| c == target).map(|p| p + from)
}

fn starts_with(chars: &[char], from: usize, needle: &str) -> bool {
    let needle: Vec<char> = needle.chars().collect();
    chars.len() >= from + needle.len() && chars[from..from + needle.len()] == needle[..]
}

/// End index (exclusive) of a bare `$VAR`/`$Env:VAR` variable name,
/// terminated by whitespace, `$`, `\`, `/`, or end of string — same
/// terminator set as the original's POSIX branch.
fn var_name_end(chars: &[char], from: usize) -> usize {
    let mut j = from;
    while j < chars.len() {
        match chars[j] {
            ' ' | '$' | '\\' | '/' | ',' => break,
            _ => j += 1,
        }
    }
    j
}
