// Pipeline driver: strip the comment delimiters, tokenize, lay the tokens
// out, decide whether the whole comment fits on one line, and normalize the
// line prefixes of the result.

use crate::lexer::tokenize;
use crate::token::{Token, TokenKind};
use crate::writer::render;

#[derive(Clone, Copy, Debug)]
pub struct Options {
    /// Column budget for every output line, one-line form included.
    pub column_limit: usize,
    /// Re-emit bare structural tags in canonical lower case.
    pub normalize_tags: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            column_limit: 100,
            normalize_tags: true,
        }
    }
}

/// Format one doc comment, delimiters included. `block_indent` is the column
/// at which the comment starts; continuation lines are padded to it. Total:
/// any input comes back formatted, never as an error, and formatting the
/// output again reproduces it unchanged.
pub fn format_doc_comment(comment: &str, block_indent: usize, opts: &Options) -> String {
    let body = strip_delimiters(comment);
    let tokens = tokenize(body);
    let rendered = render(&tokens, block_indent, opts);
    if collapse_allowed(&tokens) {
        if let Some(one_liner) = collapse(&rendered, block_indent, opts.column_limit) {
            return one_liner;
        }
    }
    reindent_and_trim(&rendered, block_indent)
}

fn strip_delimiters(comment: &str) -> &str {
    let s = comment.strip_prefix("/**").unwrap_or(comment);
    s.strip_suffix("*/").unwrap_or(s)
}

/// A comment holding any token that forces its own line break never
/// collapses, no matter how short it renders.
fn collapse_allowed(tokens: &[Token]) -> bool {
    use TokenKind::*;
    tokens.iter().all(|t| {
        !matches!(
            t.kind,
            ListOpen
                | ListClose
                | ListItemOpen
                | HeaderOpen
                | HeaderClose
                | BlockquoteOpen
                | BlockquoteClose
                | PreOpen
                | PreClose
                | TableOpen
                | TableClose
                | LineBreak
                | MarkupComment
                | ForcedNewline
        )
    })
}

/// `/** content */` when the rendering came out as exactly one non-empty
/// content line and the one-line form fits the limit. Evaluated once on the
/// full rendering; there is no partial collapse.
fn collapse(rendered: &str, block_indent: usize, column_limit: usize) -> Option<String> {
    let mut lines = rendered.lines();
    let first = lines.next()?;
    let middle = lines.next()?;
    let last = lines.next()?;
    if lines.next().is_some() || first != "/**" || last.trim_start() != "*/" {
        return None;
    }
    let content = middle.trim_start().strip_prefix('*')?.trim();
    if content.is_empty() {
        return None;
    }
    if block_indent + content.chars().count() + "/**  */".len() > column_limit {
        return None;
    }
    Some(format!("/** {} */", content))
}

/// Trim line ends and re-align every line that carries `*` decoration to one
/// space past the block indent. Raw lines inside markup comments that carry
/// their own decoration line up with the rest of the comment this way.
fn reindent_and_trim(rendered: &str, block_indent: usize) -> String {
    let mut out = String::with_capacity(rendered.len() + 16);
    for (i, line) in rendered.lines().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let line = line.trim_end();
        let stripped = line.trim_start_matches([' ', '\t']);
        if stripped.starts_with('*') {
            for _ in 0..block_indent + 1 {
                out.push(' ');
            }
            out.push_str(stripped);
        } else {
            out.push_str(line);
        }
    }
    out
}

/* ================================= Tests ================================ */
