// src/main.rs
//
// reformadoc — deterministic doc-comment reflower
//
// - Rewrites every /** ... */ comment in a source file into normal form:
//   prose rewrapped to the column limit, bare structural tags lower-cased,
//   redundant close tags dropped, and a comment that fits collapses to a
//   single line.
// - <pre> and <table> sections are copied with their internal spacing and
//   line breaks intact.
// - {@code ...}-style inline directives are opaque; markup inside them is
//   never interpreted.
// - Trailing @tag lines get the conventional blank line before the first one
//   and 4-column continuation indents.
// - Everything outside doc comments is copied byte for byte. String and
//   character literals and ordinary comments are skipped, so comment-looking
//   text inside them is left alone.
// - The pipeline is total: malformed markup degrades to literal text, and
//   formatting already-formatted output reproduces it unchanged.
//
// CLI flags:
//   --column-limit N  : column budget for comment lines (default 100)
//   --keep-tag-case   : leave structural tag casing as written

use clap::{ArgAction, Parser};
use memchr::{memchr, memchr3, memmem, memrchr};
use std::fs;
use std::io;
use std::path::PathBuf;

mod format;
mod lexer;
mod token;
mod writer;

use format::{format_doc_comment, Options};

/// CLI flags
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Column budget for comment lines
    #[arg(long, default_value_t = 100)]
    column_limit: usize,

    /// Leave structural tag casing as written
    #[arg(long = "keep-tag-case", action = ArgAction::SetTrue)]
    keep_tag_case: bool,

    /// Input file
    input: PathBuf,

    /// Output file (default: overwrite input)
    output: Option<PathBuf>,
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();

    let src = fs::read_to_string(&cli.input)?;
    let opts = Options {
        column_limit: cli.column_limit,
        normalize_tags: !cli.keep_tag_case,
    };
    let out = rewrite_source(&src, &opts);

    let out_path = cli.output.as_ref().unwrap_or(&cli.input);
    fs::write(out_path, out)
}

/* =========================== Source rewriting =========================== */

/// Copy `src` while replacing each doc comment with its formatted form.
fn rewrite_source(src: &str, opts: &Options) -> String {
    let bytes = src.as_bytes();
    let n = bytes.len();
    let mut out = String::with_capacity(src.len() + src.len() / 20 + 256);
    let mut i = 0usize;

    while i < n {
        match bytes[i] {
            b'"' => i = copy_string(src, i, &mut out),
            b'\'' => i = copy_char(src, i, &mut out),
            b'/' if bytes[i..].starts_with(b"//") => i = copy_through_line(src, i, &mut out),
            b'/' if bytes[i..].starts_with(b"/**") && !bytes[i..].starts_with(b"/**/") => {
                i = rewrite_doc_comment(src, i, opts, &mut out)
            }
            b'/' if bytes[i..].starts_with(b"/*") => i = copy_block_comment(src, i, &mut out),
            _ => {
                // plain code: copy up to the next byte that could open a
                // literal or comment
                let stop = memchr3(b'"', b'\'', b'/', &bytes[i + 1..])
                    .map(|off| i + 1 + off)
                    .unwrap_or(n);
                out.push_str(&src[i..stop]);
                i = stop;
            }
        }
    }
    out
}

fn rewrite_doc_comment(src: &str, start: usize, opts: &Options, out: &mut String) -> usize {
    let bytes = src.as_bytes();
    let Some(off) = memmem::find(&bytes[start + 3..], b"*/") else {
        // unterminated: leave the tail untouched
        out.push_str(&src[start..]);
        return bytes.len();
    };
    let end = start + 3 + off + 2;
    // continuation lines are padded to the comment's own column
    let line_start = memrchr(b'\n', &bytes[..start]).map(|p| p + 1).unwrap_or(0);
    let block_indent = src[line_start..start].chars().count();
    out.push_str(&format_doc_comment(&src[start..end], block_indent, opts));
    end
}

/// Copy a string literal, escapes respected. Stops at the closing quote or,
/// on malformed input, at end of line.
fn copy_string(src: &str, start: usize, out: &mut String) -> usize {
    let bytes = src.as_bytes();
    let n = bytes.len();
    let mut i = start + 1;
    while i < n {
        match bytes[i] {
            b'\\' if i + 1 < n => i += 2,
            b'"' => {
                i += 1;
                break;
            }
            b'\n' => break,
            _ => i += 1,
        }
    }
    out.push_str(&src[start..i]);
    i
}

/// Copy a character literal. A quote that closes within a few characters is
/// taken as a literal; anything else is a lone apostrophe.
fn copy_char(src: &str, start: usize, out: &mut String) -> usize {
    let bytes = src.as_bytes();
    let n = bytes.len();
    let end = if start + 3 < n && bytes[start + 1] == b'\\' && bytes[start + 3] == b'\'' {
        start + 4
    } else if start + 2 < n && bytes[start + 1] != b'\\' && bytes[start + 2] == b'\'' {
        start + 3
    } else {
        start + 1
    };
    out.push_str(&src[start..end]);
    end
}

fn copy_through_line(src: &str, start: usize, out: &mut String) -> usize {
    let bytes = src.as_bytes();
    let end = memchr(b'\n', &bytes[start..])
        .map(|off| start + off + 1)
        .unwrap_or(bytes.len());
    out.push_str(&src[start..end]);
    end
}

fn copy_block_comment(src: &str, start: usize, out: &mut String) -> usize {
    let bytes = src.as_bytes();
    let end = memmem::find(&bytes[start + 2..], b"*/")
        .map(|off| start + 2 + off + 2)
        .unwrap_or(bytes.len());
    out.push_str(&src[start..end]);
    end
}

/* ================================= Tests ================================ */
