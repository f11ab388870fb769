//! Cleanup of PEM text pasted into environment variables and secret stores.
//!
//! `.env` files and hosted secret stores mangle multi-line values in a few
//! recurring ways: the value is indented along with the surrounding file,
//! newlines arrive as the two characters `\n`, or the value is wrapped in
//! `"""` lines. [`normalize_pem`] undoes all of them; [`unescape_newlines`]
//! is the narrower treatment applied to the legacy variable.

const BEGIN_MARKER: &str = "-----BEGIN ";
const END_MARKER: &str = "-----END ";

/// Normalize PEM text from `PRIVATE_KEY_PEM`.
///
/// Text without a BEGIN/END pair (or with END before BEGIN) is not sliced
/// and is left for the decoder to reject.
pub fn normalize_pem(raw: &str) -> String {
    let mut text = dedent(raw);
    if has_only_escaped_newlines(&text) {
        text = text.replace("\\n", "\n");
    }

    let lines: Vec<&str> = text
        .trim()
        .lines()
        .filter(|line| !is_quote_artifact(line))
        .collect();

    let begin = lines.iter().position(|line| line.contains(BEGIN_MARKER));
    let end = lines.iter().position(|line| line.contains(END_MARKER));
    let lines = match (begin, end) {
        (Some(begin), Some(end)) if end >= begin => &lines[begin..=end],
        _ => &lines[..],
    };

    let mut normalized = lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    normalized.push('\n');
    normalized
}

/// Legacy treatment for `SNOWFLAKE_PRIVATE_KEY`: trim, then expand `\n`
/// escapes when the value has no real newline.
pub fn unescape_newlines(raw: &str) -> String {
    let text = raw.trim();
    if has_only_escaped_newlines(text) {
        text.replace("\\n", "\n")
    } else {
        text.to_string()
    }
}

fn has_only_escaped_newlines(text: &str) -> bool {
    text.contains("\\n") && !text.contains('\n')
}

fn is_quote_artifact(line: &str) -> bool {
    matches!(line.trim(), r#"""""# | "'''")
}

/// Remove whitespace common to the start of every non-blank line.
/// Whitespace-only lines become empty and do not affect the margin.
fn dedent(text: &str) -> String {
    let margin = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| &line[..line.len() - line.trim_start().len()])
        .reduce(common_prefix)
        .unwrap_or("");

    let mut dedented = text
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                line.strip_prefix(margin).unwrap_or(line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    if text.ends_with('\n') {
        dedented.push('\n');
    }
    dedented
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .char_indices()
        .zip(b.chars())
        .take_while(|((_, ca), cb)| ca == cb)
        .last()
        .map_or(0, |((idx, ca), _)| idx + ca.len_utf8());
    &a[..len]
}
