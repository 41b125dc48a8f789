// Token model shared by the lexer and the writer. A "token" here is often
// larger or smaller than what a reader would naturally expect: every span that
// needs special whitespace or indentation treatment from the writer gets its
// own kind, and everything else is folded into literals.

/// Classifies one lexed span of a doc comment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// `/**`
    BeginMarker,
    /// `*/`
    EndMarker,
    /// The `@foo` that begins a trailing block tag line like `@returns`.
    BlockTagStart,
    ListOpen,
    ListClose,
    ListItemOpen,
    ListItemClose,
    HeaderOpen,
    HeaderClose,
    ParagraphOpen,
    ParagraphClose,
    BlockquoteOpen,
    BlockquoteClose,
    PreOpen,
    PreClose,
    TableOpen,
    TableClose,
    /// A `<!-- ... -->` comment, captured raw. The one kind whose text may
    /// span newlines; the writer reproduces it verbatim.
    MarkupComment,
    /// `<br>`
    LineBreak,
    /// Whitespace outside a `<pre>` or `<table>` section, leading newlines
    /// and line decoration included. Renders as a single space or a wrap
    /// point, never as itself.
    Whitespace,
    /// A newline inside a `<pre>` or `<table>` section. User formatting in
    /// these sections is preserved, newlines included.
    ForcedNewline,
    /// Anything else: words, unrecognized tags, inline directives, and all
    /// horizontal whitespace inside `<pre>`/`<table>` sections. Adjacent
    /// literals are merged before lexing returns, so the writer can treat
    /// every literal as unsplittable.
    Literal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Token {
            kind,
            text: text.into(),
        }
    }

    /// Width in char units. Multi-byte characters count as one unit each;
    /// display width is not considered.
    pub fn width(&self) -> usize {
        self.text.chars().count()
    }
}
