// Layout engine: consumes the token stream and re-emits wrapped, indented,
// decorated comment text. Greedy column-limited wrapping, with structural
// tokens overriding the wrap: some force line breaks or blank lines, some
// push and pop list indentation, some are dropped outright.
//
// Vertical whitespace is requested, not written: each token asks for at most
// a space / newline / blank line before the next written token, requests only
// ever escalate, and a blank line degrades to a newline inside a list or a
// block tag section. Input newlines never matter on their own -- the output
// layout is purely a function of token kinds.

use std::borrow::Cow;

use crate::format::Options;
use crate::token::{Token, TokenKind};

/// Columns added per list nesting level and for block tag continuations.
const INDENT_STEP: usize = 4;

/// Separation requested before the next written token. Requests combine by
/// taking the maximum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Requested {
    None,
    Space,
    Newline,
    BlankLine,
}

pub fn render(tokens: &[Token], block_indent: usize, opts: &Options) -> String {
    let mut w = Writer::new(block_indent, opts);
    for token in tokens {
        match token.kind {
            TokenKind::BeginMarker => w.begin(),
            TokenKind::EndMarker => {
                w.end();
                break;
            }
            TokenKind::BlockTagStart => w.block_tag_start(token),
            TokenKind::ListOpen => w.list_open(token),
            TokenKind::ListClose => w.list_close(token),
            TokenKind::ListItemOpen => w.list_item_open(token),
            // Close tags with no layout meaning drop out of the output.
            TokenKind::ListItemClose | TokenKind::ParagraphClose => {}
            TokenKind::HeaderOpen => w.header_open(token),
            TokenKind::HeaderClose => w.header_close(token),
            TokenKind::ParagraphOpen => w.paragraph_open(token),
            TokenKind::BlockquoteOpen | TokenKind::BlockquoteClose => w.blockquote(token),
            TokenKind::PreOpen | TokenKind::PreClose | TokenKind::TableClose => {
                w.write_token(token)
            }
            TokenKind::TableOpen => w.table_open(token),
            TokenKind::MarkupComment => w.markup_comment(token),
            TokenKind::LineBreak => w.line_break(token),
            TokenKind::Whitespace => w.whitespace(),
            TokenKind::ForcedNewline => w.forced_newline(),
            TokenKind::Literal => w.write_token(token),
        }
    }
    w.out
}

struct Writer {
    out: String,
    block_indent: usize,
    column_limit: usize,
    normalize_tags: bool,
    /// Columns left on the current line; negative once an unsplittable token
    /// has overrun the limit.
    remaining: isize,
    at_line_start: bool,
    requested: Requested,
    /// Number of list items whose continuation indentation is in effect.
    item_depth: usize,
    /// Inside an item of the innermost open list, as opposed to an item of
    /// some enclosing list.
    in_innermost_item: bool,
    /// Inside the trailing block tag section.
    in_block_tag: bool,
    wrote_anything: bool,
    last_kind: Option<TokenKind>,
}

impl Writer {
    fn new(block_indent: usize, opts: &Options) -> Self {
        Writer {
            out: String::new(),
            block_indent,
            column_limit: opts.column_limit,
            normalize_tags: opts.normalize_tags,
            remaining: 0,
            at_line_start: false,
            requested: Requested::None,
            item_depth: 0,
            in_innermost_item: false,
            in_block_tag: false,
            wrote_anything: false,
            last_kind: None,
        }
    }

    /* --------------------------- per-kind rules -------------------------- */

    fn begin(&mut self) {
        self.out.push_str("/**");
        self.newline(0);
    }

    fn end(&mut self) {
        // pending separation requests die here; the close marker brings its
        // own line
        self.out.push('\n');
        self.pad(self.block_indent + 1);
        self.out.push_str("*/");
    }

    fn block_tag_start(&mut self, token: &Token) {
        if !self.wrote_anything {
            // tags are the only content, no leading blank line
        } else if !self.in_block_tag {
            self.request(Requested::BlankLine);
        } else {
            self.request(Requested::Newline);
        }
        // a block tag implicitly closes any list still open above it
        self.item_depth = 0;
        self.in_innermost_item = false;
        self.in_block_tag = false;
        self.write_token(token);
        self.in_block_tag = true;
    }

    fn list_open(&mut self, token: &Token) {
        self.request(Requested::BlankLine);
        self.write_token(token);
        self.in_innermost_item = false;
        self.request(Requested::Newline);
    }

    fn list_close(&mut self, token: &Token) {
        self.request(Requested::Newline);
        self.item_depth = self.item_depth.saturating_sub(1);
        self.write_token(token);
        self.request(Requested::BlankLine);
    }

    fn list_item_open(&mut self, token: &Token) {
        self.request(Requested::Newline);
        if self.in_innermost_item {
            // a sibling item replaces the previous one's continuation indent
            self.in_innermost_item = false;
            self.item_depth = self.item_depth.saturating_sub(1);
        }
        self.write_token(token);
        self.in_innermost_item = true;
        self.item_depth += 1;
    }

    fn header_open(&mut self, token: &Token) {
        self.request(Requested::BlankLine);
        self.write_token(token);
    }

    fn header_close(&mut self, token: &Token) {
        self.write_token(token);
        self.request(Requested::BlankLine);
    }

    fn paragraph_open(&mut self, token: &Token) {
        if !self.wrote_anything {
            // an initial <p> adds nothing; drop it
            return;
        }
        self.request(Requested::BlankLine);
        self.write_token(token);
    }

    fn blockquote(&mut self, token: &Token) {
        self.request(Requested::BlankLine);
        self.write_token(token);
        self.request(Requested::BlankLine);
    }

    fn table_open(&mut self, token: &Token) {
        self.request(Requested::BlankLine);
        self.write_token(token);
    }

    fn markup_comment(&mut self, token: &Token) {
        self.request(Requested::Newline);
        self.write_token(token);
        self.request(Requested::Newline);
    }

    fn line_break(&mut self, token: &Token) {
        self.write_token(token);
        self.request(Requested::Newline);
    }

    fn whitespace(&mut self) {
        // right after these, the next token's position is already decided;
        // a separator would only reflow into the markup
        if matches!(
            self.last_kind,
            Some(TokenKind::ParagraphOpen | TokenKind::HeaderOpen | TokenKind::ListItemOpen)
        ) {
            return;
        }
        self.request(Requested::Space);
    }

    fn forced_newline(&mut self) {
        self.requested = Requested::None;
        self.newline(0);
    }

    /* ----------------------------- mechanics ----------------------------- */

    fn request(&mut self, level: Requested) {
        self.requested = self.requested.max(level);
    }

    fn inner_indent(&self) -> usize {
        self.item_depth * INDENT_STEP + if self.in_block_tag { INDENT_STEP } else { 0 }
    }

    fn write_token(&mut self, token: &Token) {
        if !self.wrote_anything {
            // nothing precedes the first written token, so there is nothing
            // to separate it from
            self.requested = Requested::None;
        }
        if self.requested == Requested::BlankLine && (self.item_depth > 0 || self.in_block_tag) {
            // no blank lines between list items or block tag sections, so
            // none within one either
            self.requested = Requested::Newline;
        }
        let mut need_space = false;
        match self.requested {
            Requested::BlankLine => self.blank_line(),
            Requested::Newline => self.newline(self.inner_indent()),
            Requested::Space => need_space = true,
            Requested::None => {}
        }
        self.requested = Requested::None;

        let text = display_text(token, self.normalize_tags);
        let width = match &text {
            Cow::Borrowed(_) => token.width(),
            Cow::Owned(replaced) => replaced.chars().count(),
        } as isize;
        if !self.at_line_start && need_space && width + 1 > self.remaining {
            // break instead of the separator; the token itself is never split
            self.newline(self.inner_indent());
            need_space = false;
        }
        if !self.at_line_start && need_space {
            self.out.push(' ');
            self.remaining -= 1;
        }
        self.out.push_str(&text);
        self.remaining -= width;
        self.at_line_start = false;
        self.wrote_anything = true;
        self.last_kind = Some(token.kind);
    }

    fn blank_line(&mut self) {
        self.out.push('\n');
        self.pad(self.block_indent + 1);
        self.out.push('*');
        self.newline(self.inner_indent());
    }

    fn newline(&mut self, auto_indent: usize) {
        self.out.push('\n');
        self.pad(self.block_indent + 1);
        self.out.push_str("* ");
        self.remaining = self.column_limit as isize - self.block_indent as isize - 3;
        if auto_indent > 0 {
            self.pad(auto_indent);
            self.remaining -= auto_indent as isize;
        }
        self.at_line_start = true;
    }

    fn pad(&mut self, n: usize) {
        for _ in 0..n {
            self.out.push(' ');
        }
    }
}

/* ========================= Tag-case normalization ======================= */

fn is_tag(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        ListOpen
            | ListClose
            | ListItemOpen
            | ListItemClose
            | HeaderOpen
            | HeaderClose
            | ParagraphOpen
            | ParagraphClose
            | BlockquoteOpen
            | BlockquoteClose
            | PreOpen
            | PreClose
            | TableOpen
            | TableClose
            | LineBreak
    )
}

fn display_text<'t>(token: &'t Token, normalize_tags: bool) -> Cow<'t, str> {
    if normalize_tags && is_tag(token.kind) {
        if let Some(canonical) = canonical_tag(&token.text) {
            return canonical.into();
        }
    }
    token.text.as_str().into()
}

/// Canonical lower-case spelling for a bare tag (`<P>`, `<p/>`, `</UL>`).
/// Tags carrying attributes pass through untouched.
fn canonical_tag(text: &str) -> Option<String> {
    let inner = text.strip_prefix('<')?.strip_suffix('>')?;
    let (inner, is_end) = match inner.strip_prefix('/') {
        Some(rest) => (rest, true),
        None => (inner, false),
    };
    let name_len = inner
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    let (name, rest) = inner.split_at(name_len);
    if name.is_empty() {
        return None;
    }
    let rest = rest.trim_matches([' ', '\t']);
    if !rest.is_empty() && rest != "/" {
        return None;
    }
    let slash = if is_end { "/" } else { "" };
    Some(format!("<{}{}>", slash, name.to_ascii_lowercase()))
}

/* ================================= Tests ================================ */

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(text: &str) -> Token {
        Token::new(TokenKind::Literal, text)
    }

    fn ws() -> Token {
        Token::new(TokenKind::Whitespace, " ")
    }

    fn tag(kind: TokenKind, text: &str) -> Token {
        Token::new(kind, text)
    }

    fn markers(body: Vec<Token>) -> Vec<Token> {
        let mut toks = vec![Token::new(TokenKind::BeginMarker, "/**")];
        toks.extend(body);
        toks.push(Token::new(TokenKind::EndMarker, "*/"));
        toks
    }

    fn render_default(tokens: Vec<Token>, limit: usize) -> String {
        let opts = Options {
            column_limit: limit,
            ..Options::default()
        };
        render(&markers(tokens), 0, &opts)
    }

    #[test]
    fn words_wrap_at_the_limit() {
        // " * " leaves 12 columns at limit 15
        let toks = vec![lit("aaaa"), ws(), lit("bbbb"), ws(), lit("cccc")];
        assert_eq!(
            render_default(toks, 15),
            "/**\n * aaaa bbbb\n * cccc\n */"
        );
    }

    #[test]
    fn overlong_literal_is_not_split() {
        let toks = vec![lit("aaaa"), ws(), lit("bbbbbbbbbbbbbbbbbbbb")];
        assert_eq!(
            render_default(toks, 15),
            "/**\n * aaaa\n * bbbbbbbbbbbbbbbbbbbb\n */"
        );
    }

    #[test]
    fn item_continuations_indent_by_four() {
        let toks = vec![
            tag(TokenKind::ListOpen, "<ul>"),
            tag(TokenKind::ListItemOpen, "<li>"),
            lit("aaaa"),
            ws(),
            lit("bbbb"),
            tag(TokenKind::ListClose, "</ul>"),
        ];
        assert_eq!(
            render_default(toks, 12),
            "/**\n * <ul>\n * <li>aaaa\n *     bbbb\n * </ul>\n */"
        );
    }

    #[test]
    fn blank_line_degrades_inside_block_tag_section() {
        let toks = vec![
            Token::new(TokenKind::BlockTagStart, "@param"),
            ws(),
            lit("x"),
            ws(),
            tag(TokenKind::ParagraphOpen, "<p>"),
            lit("y"),
        ];
        assert_eq!(
            render_default(toks, 40),
            "/**\n * @param x\n *     <p>y\n */"
        );
    }

    #[test]
    fn canonical_tag_spellings() {
        assert_eq!(canonical_tag("<P>").as_deref(), Some("<p>"));
        assert_eq!(canonical_tag("<p/>").as_deref(), Some("<p>"));
        assert_eq!(canonical_tag("</UL>").as_deref(), Some("</ul>"));
        assert_eq!(canonical_tag("<BR >").as_deref(), Some("<br>"));
        assert_eq!(canonical_tag("<p class=x>"), None);
    }
}
