use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Ident,
    Str,
    Num,
    Symbol,
    Annotation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Token text. String literals exclude their quotes, annotations keep the `@`.
    pub text: &'a str,
    /// Byte offset of the first character (the opening quote for strings).
    pub offset: usize,
    /// Byte offset one past the last character.
    pub end: usize,
    /// Raw body of a `/** ... */` comment directly preceding this token.
    pub doc: Option<&'a str>,
    /// Byte offset of that comment's opening `/**`.
    pub doc_offset: Option<usize>,
}

impl Token<'_> {
    pub fn is_symbol(&self, sym: char) -> bool {
        self.kind == TokenKind::Symbol && self.text.starts_with(sym)
    }

    /// Keyword or identifier with the given text.
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self.kind, TokenKind::Keyword | TokenKind::Ident) && self.text == word
    }

    pub fn is_name(&self) -> bool {
        matches!(self.kind, TokenKind::Keyword | TokenKind::Ident)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("Unterminated string literal")]
    UnterminatedString { offset: usize },
    #[error("Unterminated block comment")]
    UnterminatedComment { offset: usize },
}

impl LexError {
    pub fn offset(&self) -> usize {
        match self {
            Self::UnterminatedString { offset } | Self::UnterminatedComment { offset } => *offset,
        }
    }
}

pub const KEYWORDS: &[&str] = &[
    "protocol", "record", "enum", "fixed", "union", "array", "map", "null", "boolean", "int",
    "long", "float", "double", "bytes", "string", "void", "import", "idl", "schema", "throws",
    "oneway", "error", "date", "time_ms", "timestamp_ms", "decimal", "uuid",
];

const SYMBOLS: &str = "<>{}()[];,=?";

/// Token stream plus the non-fatal problems found while scanning.
#[derive(Debug, Clone, Default)]
pub struct Lexed<'a> {
    pub tokens: Vec<Token<'a>>,
    pub errors: Vec<LexError>,
}

pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    pending_doc: Option<(usize, &'a str)>,
    errors: Vec<LexError>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            pending_doc: None,
            errors: Vec::new(),
        }
    }

    fn pos(&mut self) -> usize {
        self.chars.peek().map_or(self.input.len(), |&(i, _)| i)
    }

    fn peek_second(&self) -> Option<char> {
        let mut it = self.chars.clone();
        it.next();
        it.next().map(|(_, c)| c)
    }

    fn skip_line_comment(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c == '\n' {
                break;
            }
            self.chars.next();
        }
    }

    fn skip_block_comment(&mut self, start: usize) {
        // consume "/*"
        self.chars.next();
        self.chars.next();
        let body_start = start + 2;
        loop {
            match self.chars.next() {
                Some((i, '*')) if matches!(self.chars.peek(), Some(&(_, '/'))) => {
                    self.chars.next();
                    let body = &self.input[body_start..i];
                    if let Some(doc) = body.strip_prefix('*') {
                        self.pending_doc = Some((start, doc));
                    }
                    return;
                }
                Some(_) => {}
                None => {
                    self.errors.push(LexError::UnterminatedComment { offset: start });
                    return;
                }
            }
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.chars.peek() {
                Some(&(_, c)) if c.is_whitespace() => {
                    self.chars.next();
                }
                Some(&(start, '/')) => match self.peek_second() {
                    Some('/') => self.skip_line_comment(),
                    Some('*') => self.skip_block_comment(start),
                    _ => break,
                },
                _ => break,
            }
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        while let Some(&(_, c)) = self.chars.peek() {
            if !pred(c) {
                break;
            }
            self.chars.next();
        }
        self.pos()
    }

    fn read_string(&mut self, start: usize) -> Token<'a> {
        loop {
            match self.chars.next() {
                Some((i, '"')) => return self.token(TokenKind::Str, start + 1, i, start, i + 1),
                Some((_, '\\')) => {
                    self.chars.next();
                }
                Some(_) => {}
                None => {
                    self.errors.push(LexError::UnterminatedString { offset: start });
                    let end = self.input.len();
                    return self.token(TokenKind::Str, start + 1, end, start, end);
                }
            }
        }
    }

    fn read_quoted_ident(&mut self, start: usize) -> Token<'a> {
        let close = self.take_while(|c| c != '`');
        self.chars.next();
        let end = self.pos();
        self.token(TokenKind::Ident, start + 1, close, start, end)
    }

    fn token(
        &mut self,
        kind: TokenKind,
        text_start: usize,
        text_end: usize,
        offset: usize,
        end: usize,
    ) -> Token<'a> {
        let doc = self.pending_doc.take();
        Token {
            kind,
            text: &self.input[text_start..text_end],
            offset,
            end,
            doc: doc.map(|(_, body)| body),
            doc_offset: doc.map(|(at, _)| at),
        }
    }

    pub fn next_token(&mut self) -> Option<Token<'a>> {
        loop {
            self.skip_trivia();
            let (start, c) = *self.chars.peek()?;

            let tok = match c {
                '@' => {
                    self.chars.next();
                    let end = self.take_while(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-'));
                    self.token(TokenKind::Annotation, start, end, start, end)
                }
                '"' => {
                    self.chars.next();
                    self.read_string(start)
                }
                '`' => {
                    self.chars.next();
                    self.read_quoted_ident(start)
                }
                c if c.is_ascii_digit()
                    || (c == '-' && self.peek_second().is_some_and(|n| n.is_ascii_digit())) =>
                {
                    self.chars.next();
                    let end = self.take_while(|c| c.is_ascii_digit() || c == '.');
                    self.token(TokenKind::Num, start, end, start, end)
                }
                c if c.is_alphabetic() || c == '_' => {
                    let end = self.take_while(|c| c.is_alphanumeric() || c == '_' || c == '.');
                    let kind = if KEYWORDS.contains(&&self.input[start..end]) {
                        TokenKind::Keyword
                    } else {
                        TokenKind::Ident
                    };
                    self.token(kind, start, end, start, end)
                }
                c if SYMBOLS.contains(c) => {
                    self.chars.next();
                    let end = start + c.len_utf8();
                    self.token(TokenKind::Symbol, start, end, start, end)
                }
                _ => {
                    // Unknown character, skip it
                    self.chars.next();
                    continue;
                }
            };

            return Some(tok);
        }
    }

    pub fn tokenize(mut self) -> Lexed<'a> {
        let mut tokens = Vec::new();
        while let Some(tok) = self.next_token() {
            tokens.push(tok);
        }
        Lexed {
            tokens,
            errors: self.errors,
        }
    }
}

/// Index of the `}` closing the `{` at `open`, counting only symbol tokens so
/// braces inside strings and comments never participate.
pub fn matching_brace(tokens: &[Token<'_>], open: usize) -> Option<usize> {
    if !tokens.get(open)?.is_symbol('{') {
        return None;
    }
    let mut depth = 0usize;
    for (i, tok) in tokens.iter().enumerate().skip(open) {
        if tok.is_symbol('{') {
            depth += 1;
        } else if tok.is_symbol('}') {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Strip `*` decorations from a raw doc comment body.
pub fn clean_doc(raw: &str) -> String {
    raw.lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix('*').map_or(line, str::trim_start)
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_and_text(input: &str) -> Vec<(TokenKind, &str)> {
        Lexer::new(input)
            .tokenize()
            .tokens
            .into_iter()
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            kinds_and_text("record User { string name; }"),
            vec![
                (TokenKind::Keyword, "record"),
                (TokenKind::Ident, "User"),
                (TokenKind::Symbol, "{"),
                (TokenKind::Keyword, "string"),
                (TokenKind::Ident, "name"),
                (TokenKind::Symbol, ";"),
                (TokenKind::Symbol, "}"),
            ]
        );
    }

    #[test]
    fn test_qualified_name_is_one_token() {
        let toks = kinds_and_text("com.example.User ref;");
        assert_eq!(toks[0], (TokenKind::Ident, "com.example.User"));
    }

    #[test]
    fn test_comments_skipped() {
        let input = "// line { \n/* block } */ enum E { A }";
        let toks = kinds_and_text(input);
        assert_eq!(toks[0], (TokenKind::Keyword, "enum"));
        assert_eq!(toks.len(), 5);
    }

    #[test]
    fn test_annotation_and_string() {
        let toks = kinds_and_text(r#"@namespace("com.acme") @java-class("x.Y")"#);
        assert_eq!(toks[0], (TokenKind::Annotation, "@namespace"));
        assert_eq!(toks[2], (TokenKind::Str, "com.acme"));
        assert_eq!(toks[4], (TokenKind::Annotation, "@java-class"));
    }

    #[test]
    fn test_string_escape_does_not_terminate() {
        let lexed = Lexer::new(r#""a \" b" x"#).tokenize();
        assert_eq!(lexed.tokens[0].text, r#"a \" b"#);
        assert_eq!(lexed.tokens[1].text, "x");
        assert!(lexed.errors.is_empty());
    }

    #[test]
    fn test_numbers() {
        let toks = kinds_and_text("16 -1 3.5 - x");
        assert_eq!(toks[0], (TokenKind::Num, "16"));
        assert_eq!(toks[1], (TokenKind::Num, "-1"));
        assert_eq!(toks[2], (TokenKind::Num, "3.5"));
        assert_eq!(toks[3], (TokenKind::Ident, "x"));
    }

    #[test]
    fn test_offsets() {
        let lexed = Lexer::new("  fixed MD5(16);").tokenize();
        assert_eq!(lexed.tokens[0].offset, 2);
        assert_eq!(lexed.tokens[0].end, 7);
        assert_eq!(lexed.tokens[1].offset, 8);
    }

    #[test]
    fn test_unterminated_input_terminates() {
        let lexed = Lexer::new("record A { \"oops").tokenize();
        assert_eq!(lexed.errors, vec![LexError::UnterminatedString { offset: 11 }]);
        assert_eq!(lexed.tokens.last().map(|t| t.text), Some("oops"));

        let lexed = Lexer::new("record A /* never closed").tokenize();
        assert_eq!(lexed.errors.len(), 1);
        assert_eq!(lexed.tokens.len(), 2);
    }

    #[test]
    fn test_unknown_chars_skipped() {
        let toks = kinds_and_text("# $ record");
        assert_eq!(toks, vec![(TokenKind::Keyword, "record")]);
    }

    #[test]
    fn test_doc_comment_attached() {
        let lexed = Lexer::new("/** A user. */\nrecord User {}").tokenize();
        assert_eq!(lexed.tokens[0].doc.map(clean_doc).as_deref(), Some("A user."));
        assert_eq!(lexed.tokens[0].doc_offset, Some(0));
        assert!(lexed.tokens[1].doc.is_none());

        let lexed = Lexer::new("int a; /* plain */ long b;").tokenize();
        assert!(lexed.tokens.iter().all(|t| t.doc_offset.is_none()));
    }

    #[test]
    fn test_backtick_ident() {
        let toks = kinds_and_text("string `error`;");
        assert_eq!(toks[1], (TokenKind::Ident, "error"));
    }

    #[test]
    fn test_matching_brace_ignores_strings() {
        let lexed = Lexer::new(r#"record A { string s = "}"; union { null, B } b; }"#).tokenize();
        let close = matching_brace(&lexed.tokens, 2).unwrap();
        assert_eq!(close, lexed.tokens.len() - 1);
    }
}
