// Doc-comment tokenizer. One left-to-right pass over the comment body with
// three pieces of scanner state: the current region (normal / pre / table),
// the brace depth of any inline directive, and whether the current line has
// produced content yet. Anything that fails to match a recognized form
// degrades to literal text; the scan never fails.

use std::borrow::Cow;

use memchr::memmem;

use crate::token::{Token, TokenKind};

/* ============================== Entry point ============================= */

/// Tokenize a comment body: the text between `/**` and `*/`, per-line `*`
/// decoration still present. Total and always terminating.
pub fn tokenize(body: &str) -> Vec<Token> {
    let body: Cow<str> = if body.contains('\r') {
        Cow::Owned(body.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(body)
    };
    let mut lx = Lexer {
        src: &body,
        pos: 0,
        region: Region::Normal,
        brace_depth: 0,
        line_has_content: false,
        tokens: Vec::new(),
    };
    lx.tokens.push(Token::new(TokenKind::BeginMarker, "/**"));
    // Strip decoration before the first real content the same way a newline
    // strips the decoration of the line that follows it.
    let start = lx.pos;
    lx.consume_decoration();
    if lx.pos > start {
        lx.push(TokenKind::Whitespace, start);
    }
    while lx.pos < lx.src.len() {
        lx.step();
    }
    lx.tokens.push(Token::new(TokenKind::EndMarker, "*/"));
    merge(lx.tokens)
}

/* ============================ Scanner state ============================= */

#[derive(Clone, Copy, PartialEq, Eq)]
enum Region {
    Normal,
    /// Inside `<pre>`: newlines become forced newlines, spacing becomes
    /// literal text, and no markup other than `</pre>` is recognized.
    Pre,
    /// Inside `<table>`, same treatment as `<pre>`.
    Table,
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    region: Region,
    brace_depth: usize,
    line_has_content: bool,
    tokens: Vec<Token>,
}

impl Lexer<'_> {
    fn step(&mut self) {
        let b = self.src.as_bytes()[self.pos];
        match b {
            b'\n' => self.newline(),
            b' ' | b'\t' => self.horizontal_whitespace(),
            b'@' if self.at_block_tag_position() => self.block_tag(),
            b'<' => self.angle(),
            b'{' => self.open_brace(),
            b'}' => self.close_brace(),
            _ => self.literal_run(),
        }
    }

    /// A `@word` counts as a block tag only at the start of a logical line,
    /// outside verbatim regions, and outside inline directives.
    fn at_block_tag_position(&self) -> bool {
        !self.line_has_content && self.region == Region::Normal && self.brace_depth == 0
    }

    fn newline(&mut self) {
        let start = self.pos;
        self.pos += 1;
        self.consume_decoration();
        let kind = if self.region == Region::Normal {
            TokenKind::Whitespace
        } else {
            TokenKind::ForcedNewline
        };
        self.push(kind, start);
        self.line_has_content = false;
    }

    /// Consume line decoration: optionally whitespace-then-asterisk, then at
    /// most one separator space. Taking only one space is what keeps user
    /// indentation intact inside verbatim sections.
    fn consume_decoration(&mut self) {
        let bytes = self.src.as_bytes();
        let mut i = self.pos;
        while i < bytes.len() && is_space_tab(bytes[i]) {
            i += 1;
        }
        if i < bytes.len() && bytes[i] == b'*' {
            self.pos = i + 1;
        }
        if self.pos < bytes.len() && is_space_tab(bytes[self.pos]) {
            self.pos += 1;
        }
    }

    fn horizontal_whitespace(&mut self) {
        let start = self.pos;
        let bytes = self.src.as_bytes();
        while self.pos < bytes.len() && is_space_tab(bytes[self.pos]) {
            self.pos += 1;
        }
        let kind = if self.region == Region::Normal {
            TokenKind::Whitespace
        } else {
            TokenKind::Literal
        };
        self.push(kind, start);
    }

    fn block_tag(&mut self) {
        let start = self.pos;
        self.pos += 1;
        let bytes = self.src.as_bytes();
        while self.pos < bytes.len() && is_word_char(bytes[self.pos]) {
            self.pos += 1;
        }
        self.push(TokenKind::BlockTagStart, start);
        self.line_has_content = true;
    }

    fn angle(&mut self) {
        if self.region != Region::Normal {
            self.verbatim_angle();
            return;
        }
        if self.brace_depth > 0 {
            self.literal_char();
            return;
        }
        if self.src[self.pos..].starts_with("<!--") {
            if let Some(off) = memmem::find(&self.src.as_bytes()[self.pos + 4..], b"-->") {
                let start = self.pos;
                self.pos += 4 + off + 3;
                self.push(TokenKind::MarkupComment, start);
                self.line_has_content = true;
                return;
            }
            // unterminated comment: degrade to a literal '<'
        }
        if let Some(tag) = scan_tag(self.src, self.pos) {
            if let Some(kind) = tag_kind(tag.name, tag.is_end) {
                self.pos += tag.raw.len();
                self.tokens.push(Token::new(kind, tag.raw));
                match kind {
                    TokenKind::PreOpen => self.region = Region::Pre,
                    TokenKind::TableOpen => self.region = Region::Table,
                    _ => {}
                }
                self.line_has_content = true;
                return;
            }
        }
        self.literal_char();
    }

    /// Inside a verbatim region only the region's own close tag means
    /// anything; every other `<` is literal text.
    fn verbatim_angle(&mut self) {
        let name = match self.region {
            Region::Pre => "pre",
            Region::Table => "table",
            Region::Normal => return self.literal_char(),
        };
        if let Some(tag) = scan_tag(self.src, self.pos) {
            if tag.is_end && tag.name.eq_ignore_ascii_case(name) {
                let kind = if self.region == Region::Pre {
                    TokenKind::PreClose
                } else {
                    TokenKind::TableClose
                };
                self.pos += tag.raw.len();
                self.tokens.push(Token::new(kind, tag.raw));
                self.region = Region::Normal;
                self.line_has_content = true;
                return;
            }
        }
        self.literal_char();
    }

    /// `{` starts an opaque inline directive only when an `@`-keyword
    /// follows; inside a directive every brace adjusts the depth so the
    /// matching close is found even when directives nest.
    fn open_brace(&mut self) {
        if self.brace_depth > 0 || self.src.as_bytes().get(self.pos + 1) == Some(&b'@') {
            self.brace_depth += 1;
        }
        self.literal_char();
    }

    fn close_brace(&mut self) {
        self.brace_depth = self.brace_depth.saturating_sub(1);
        self.literal_char();
    }

    /// Emit the single (ASCII) character at `pos` as literal text.
    fn literal_char(&mut self) {
        let start = self.pos;
        self.pos += 1;
        self.push(TokenKind::Literal, start);
        self.line_has_content = true;
    }

    fn literal_run(&mut self) {
        let start = self.pos;
        let bytes = self.src.as_bytes();
        while self.pos < bytes.len() && !is_special(bytes[self.pos]) {
            self.pos += 1;
        }
        self.push(TokenKind::Literal, start);
        self.line_has_content = true;
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token::new(kind, &self.src[start..self.pos]));
    }
}

/* ============================ Tag recognition =========================== */

struct Tag<'a> {
    raw: &'a str,
    name: &'a str,
    is_end: bool,
}

/// Parse a tag at `pos` (src[pos] == '<'). Quote-aware when scanning for the
/// closing '>', and refuses to cross a newline; `None` degrades to literal
/// text in the caller.
fn scan_tag(src: &str, pos: usize) -> Option<Tag<'_>> {
    let bytes = src.as_bytes();
    let n = bytes.len();
    let mut i = pos + 1;
    let mut is_end = false;
    if i < n && bytes[i] == b'/' {
        is_end = true;
        i += 1;
    }
    let name_start = i;
    while i < n && bytes[i].is_ascii_alphanumeric() {
        i += 1;
    }
    if i == name_start || !bytes[name_start].is_ascii_alphabetic() {
        return None;
    }
    let name_end = i;
    let mut quote: u8 = 0;
    while i < n {
        let b = bytes[i];
        if quote != 0 {
            if b == quote {
                quote = 0;
            }
        } else if b == b'"' || b == b'\'' {
            quote = b;
        } else if b == b'>' {
            return Some(Tag {
                raw: &src[pos..=i],
                name: &src[name_start..name_end],
                is_end,
            });
        } else if b == b'\n' {
            return None;
        }
        i += 1;
    }
    None
}

fn tag_kind(name: &str, is_end: bool) -> Option<TokenKind> {
    use TokenKind::*;
    let kind = if name.eq_ignore_ascii_case("p") {
        if is_end { ParagraphClose } else { ParagraphOpen }
    } else if name.eq_ignore_ascii_case("li") {
        if is_end { ListItemClose } else { ListItemOpen }
    } else if matches_ignore_ascii_case(name, &["ul", "ol", "dl"]) {
        if is_end { ListClose } else { ListOpen }
    } else if is_header_name(name) {
        if is_end { HeaderClose } else { HeaderOpen }
    } else if name.eq_ignore_ascii_case("blockquote") {
        if is_end { BlockquoteClose } else { BlockquoteOpen }
    } else if name.eq_ignore_ascii_case("pre") {
        if is_end { PreClose } else { PreOpen }
    } else if name.eq_ignore_ascii_case("table") {
        if is_end { TableClose } else { TableOpen }
    } else if name.eq_ignore_ascii_case("br") && !is_end {
        LineBreak
    } else {
        return None;
    };
    Some(kind)
}

fn matches_ignore_ascii_case(name: &str, set: &[&str]) -> bool {
    set.iter().any(|s| name.eq_ignore_ascii_case(s))
}

fn is_header_name(name: &str) -> bool {
    let b = name.as_bytes();
    b.len() == 2 && (b[0] == b'h' || b[0] == b'H') && (b'1'..=b'6').contains(&b[1])
}

/* ========================== Utility predicates ========================== */

#[inline]
fn is_space_tab(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

#[inline]
fn is_word_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[inline]
fn is_special(b: u8) -> bool {
    matches!(b, b'\n' | b' ' | b'\t' | b'<' | b'{' | b'}')
}

/* ============================== Merge pass ============================== */

/// Join adjacent literals and adjacent whitespace, and glue a `@`-word onto
/// the literal before the whitespace that precedes it. The writer's
/// "literals are unsplittable" guarantee depends on this pass, and the glue
/// rule is what keeps wrapping from opening a line with a `@`-word that is
/// not a real block tag.
fn merge(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    for tok in tokens {
        if let Some(prev) = out.last_mut() {
            if prev.kind == TokenKind::Literal && tok.kind == TokenKind::Literal {
                prev.text.push_str(&tok.text);
                continue;
            }
            if prev.kind == TokenKind::Whitespace && tok.kind == TokenKind::Whitespace {
                prev.text.push_str(&tok.text);
                continue;
            }
        }
        if tok.kind == TokenKind::Literal
            && tok.text.starts_with('@')
            && out.len() >= 2
            && out[out.len() - 1].kind == TokenKind::Whitespace
            && out[out.len() - 2].kind == TokenKind::Literal
        {
            out.pop();
            let prev = out.last_mut().unwrap();
            prev.text.push(' ');
            prev.text.push_str(&tok.text);
            continue;
        }
        out.push(tok);
    }
    out
}

/* ================================= Tests ================================ */
