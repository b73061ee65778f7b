//! Lexer for JavaScript/TypeScript module source using logos
//!
//! Only the tokens that matter for export analysis get their own variant.
//! Everything else collapses into `Ident`, `Operator` or one of the literal
//! kinds so that the grammar can treat it as opaque.

use logos::{Lexer, Logos};

use crate::error::ParseError;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

fn slice(lex: &mut Lexer<Token>) -> String {
    lex.slice().to_string()
}

fn string_body(lex: &mut Lexer<Token>) -> String {
    let s = lex.slice();
    s[1..s.len() - 1].to_string()
}

/// Template literal starting at the backtick just matched, with nested
/// `${...}` substitutions followed to their matching brace
fn template(lex: &mut Lexer<Token>) -> Option<String> {
    let len = template_end(lex.remainder())?;
    lex.bump(len);
    Some(lex.slice().to_string())
}

/// Length of a template literal after its opening backtick, through the
/// closing one
fn template_end(src: &str) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => return Some(i + 1),
            b'$' if bytes.get(i + 1) == Some(&b'{') => i += 2 + substitution_end(&src[i + 2..])?,
            _ => i += 1,
        }
    }
    None
}

/// Length of a `${...}` substitution after its opening brace, through the
/// matching `}`
fn substitution_end(src: &str) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' if depth == 0 => return Some(i + 1),
            b'}' => depth -= 1,
            b'`' => {
                i += 1 + template_end(&src[i + 1..])?;
                continue;
            }
            quote @ (b'\'' | b'"') => {
                i += 1 + string_end(&src[i + 1..], quote)?;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Length of a quoted string after its opening quote, through the closing one
fn string_end(src: &str, quote: u8) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return None,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// Length of a regex literal after its opening slash, through the flags
fn regex_end(src: &str) -> Option<usize> {
    let mut in_class = false;
    let mut chars = src.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\n' | '\r' => return None,
            '\\' => {
                chars.next();
            }
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => {
                let rest = &src[i + 1..];
                let flags = rest
                    .find(|c: char| !c.is_ascii_alphabetic())
                    .unwrap_or(rest.len());
                return Some(i + 1 + flags);
            }
            _ => {}
        }
    }
    None
}

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\n\r\x0B\x0C]+")]
pub enum Token {
    // Keywords that drive export analysis
    #[token("export")]
    Export,
    #[token("default")]
    Default,
    #[token("function")]
    Function,
    #[token("class")]
    Class,

    // Declaration modifiers
    #[token("async")]
    Async,
    #[token("abstract")]
    Abstract,
    #[token("declare")]
    Declare,

    // Delimiters
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,

    // Punctuation with a role in the grammar
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("=")]
    Assign,
    #[token("*")]
    Star,
    #[token("@")]
    At,

    // Every other punctuator (longer patterns win)
    #[token("=>", slice)]
    #[token("==", slice)]
    #[token("===", slice)]
    #[token("!=", slice)]
    #[token("!==", slice)]
    #[token("<", slice)]
    #[token(">", slice)]
    #[token("<=", slice)]
    #[token(">=", slice)]
    #[token("+", slice)]
    #[token("-", slice)]
    #[token("/", slice)]
    #[token("%", slice)]
    #[token("**", slice)]
    #[token("++", slice)]
    #[token("--", slice)]
    #[token("<<", slice)]
    #[token(">>", slice)]
    #[token(">>>", slice)]
    #[token("&", slice)]
    #[token("|", slice)]
    #[token("^", slice)]
    #[token("!", slice)]
    #[token("~", slice)]
    #[token("&&", slice)]
    #[token("||", slice)]
    #[token("??", slice)]
    #[token("?", slice)]
    #[token("?.", slice)]
    #[token(":", slice)]
    #[token("+=", slice)]
    #[token("-=", slice)]
    #[token("*=", slice)]
    #[token("/=", slice)]
    #[token("%=", slice)]
    #[token("**=", slice)]
    #[token("<<=", slice)]
    #[token(">>=", slice)]
    #[token(">>>=", slice)]
    #[token("&=", slice)]
    #[token("|=", slice)]
    #[token("^=", slice)]
    #[token("&&=", slice)]
    #[token("||=", slice)]
    #[token("??=", slice)]
    #[token("..", slice)]
    #[token("...", slice)]
    #[token("#", slice)]
    #[token("\\", slice)]
    Operator(String),

    // Literals - identifiers must come after keywords
    #[regex(r"[a-zA-Z_$\u{80}-\u{10FFFF}][a-zA-Z0-9_$\u{80}-\u{10FFFF}]*", slice, priority = 1)]
    #[regex(r"#[a-zA-Z_$][a-zA-Z0-9_$]*", slice)]
    Ident(String),

    #[regex(r#""([^"\\\n]|\\(.|\n))*""#, string_body)]
    #[regex(r#"'([^'\\\n]|\\(.|\n))*'"#, string_body)]
    Str(String),

    #[token("`", template)]
    Template(String),

    /// `/.../flags` in a position where an expression may start. Produced by
    /// [`lex`], never by the logos matcher.
    Regex(String),

    #[regex(r"[0-9][0-9a-zA-Z_]*(\.[0-9a-zA-Z_]*)?", slice)]
    #[regex(r"\.[0-9][0-9a-zA-Z_]*", slice)]
    Number(String),

    /// A quote with no closing partner on its line, as in `Don't` in text
    /// that was not recognised as JSX. Runs to the end of the line.
    #[regex(r#"'([^'\\\n]|\\(.|\n))*\\?"#)]
    #[regex(r#""([^"\\\n]|\\(.|\n))*\\?"#)]
    StrayQuote,

    // Every prefix of a block comment that is not closed yet
    #[regex(r"/\*([^*]|\*+[^*/])*\**")]
    UnterminatedComment,

    // Comments (skip)
    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    #[regex(r"/\*([^*]|\*+[^*/])*\*+/", logos::skip)]
    BlockComment,

    #[regex(r"#![^\n]*", logos::skip)]
    Hashbang,
}

impl Token {
    /// Opening or closing bracket of any kind
    pub fn is_delimiter(&self) -> bool {
        matches!(
            self,
            Token::BraceOpen
                | Token::BraceClose
                | Token::ParenOpen
                | Token::ParenClose
                | Token::BracketOpen
                | Token::BracketClose
        )
    }

    /// Whether an expression may end with this token
    fn ends_expression(&self) -> bool {
        match self {
            Token::Ident(_)
            | Token::Str(_)
            | Token::Template(_)
            | Token::Regex(_)
            | Token::Number(_)
            | Token::BraceClose
            | Token::ParenClose
            | Token::BracketClose => true,
            Token::Operator(op) => op == "++" || op == "--",
            _ => false,
        }
    }

    /// Whether this token, at the start of a line, continues the previous one
    fn continues_expression(&self) -> bool {
        match self {
            Token::Operator(op) => !matches!(op.as_str(), "++" | "--" | "!" | "~" | "..."),
            Token::Dot
            | Token::Assign
            | Token::Star
            | Token::Comma
            | Token::Semicolon
            | Token::Template(_) => true,
            other => other.is_delimiter(),
        }
    }
}

/// Words after which `/` starts a regex and `<` may open a JSX element
const EXPRESSION_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await",
];

/// What the scanner is looking at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Script code, with the number of braces opened in this frame
    Code { braces: usize },
    /// Inside `<name ...>`; `closing` once the tag ends an element
    Tag { closing: bool },
    /// Text between an opening and a closing tag
    Children,
}

/// Drives the logos matcher one token at a time so that regex literals and
/// JSX text can be cut out of the input before logos sees them
struct Scanner<'a> {
    input: &'a str,
    pos: usize,
    jsx: bool,
    modes: Vec<Mode>,
    tokens: Vec<(Token, Span)>,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str, jsx: bool) -> Self {
        Self {
            input,
            pos: 0,
            jsx,
            modes: vec![Mode::Code { braces: 0 }],
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<(Token, Span)>, ParseError> {
        let input = self.input;

        loop {
            if self.modes.last() == Some(&Mode::Children) {
                let rest = &input[self.pos..];
                self.pos += rest.find(|c: char| c == '<' || c == '{').unwrap_or(rest.len());
            }

            let mut lexer = Token::lexer(&input[self.pos..]);
            let Some(result) = lexer.next() else { break };
            let span = self.pos + lexer.span().start..self.pos + lexer.span().end;

            let token = match result {
                Ok(Token::UnterminatedComment) => {
                    return Err(ParseError::Lexical {
                        span: span.start..input.len(),
                        message: "Unterminated block comment".to_string(),
                    })
                }
                Ok(token) => token,
                Err(()) if lexer.slice() == "`" => {
                    return Err(ParseError::Lexical {
                        span: span.start..input.len(),
                        message: "Unterminated template literal".to_string(),
                    })
                }
                Err(()) => {
                    return Err(ParseError::Lexical {
                        message: format!("Unexpected character '{}'", &input[span.clone()]),
                        span,
                    })
                }
            };

            let (token, span) = self.refine(token, span);
            self.pos = span.end;
            self.enter(&token, &span);
            self.push(token, span);
        }

        if self.modes.len() > 1 {
            let end = input.len();
            return Err(ParseError::Lexical {
                span: end..end,
                message: "Unclosed JSX element".to_string(),
            });
        }
        Ok(self.tokens)
    }

    /// Whether the next token starts an expression rather than continuing one
    fn expression_may_start(&self) -> bool {
        match self.tokens.last() {
            None => true,
            Some((Token::Ident(word), _)) => EXPRESSION_KEYWORDS.contains(&word.as_str()),
            Some((token, _)) => !token.ends_expression(),
        }
    }

    /// Whether `<` ending at `after` opens a JSX element
    fn opens_tag(&self, after: usize) -> bool {
        if !self.jsx || !self.expression_may_start() {
            return false;
        }
        let rest = &self.input[after..];
        if rest.starts_with('>') {
            return true;
        }
        if !rest.starts_with(|c: char| c.is_alphabetic() || c == '_' || c == '$') {
            return false;
        }
        let name_len = rest
            .find(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '$' | '.' | ':' | '-')))
            .unwrap_or(rest.len());
        let next = rest[name_len..].trim_start();
        // `<T,>` and `<T extends U>` are type parameters
        let type_parameter = next.starts_with(',')
            || next
                .strip_prefix("extends")
                .is_some_and(|after| after.starts_with(char::is_whitespace));
        !next.is_empty() && !type_parameter
    }

    /// Re-read a token whose meaning depends on the mode
    fn refine(&self, token: Token, span: Span) -> (Token, Span) {
        match (self.modes.last(), &token) {
            (Some(Mode::Code { .. }), Token::Operator(op))
                if (op == "/" || op == "/=") && self.expression_may_start() =>
            {
                if let Some(len) = regex_end(&self.input[span.start + 1..]) {
                    let end = span.start + 1 + len;
                    return (Token::Regex(self.input[span.start..end].to_string()), span.start..end);
                }
            }
            (Some(Mode::Tag { .. }), Token::Operator(op)) if op.len() > 1 && op.starts_with('>') => {
                return (Token::Operator(">".to_string()), span.start..span.start + 1);
            }
            (Some(Mode::Children), Token::Operator(op)) if op.len() > 1 && op.starts_with('<') => {
                return (Token::Operator("<".to_string()), span.start..span.start + 1);
            }
            _ => {}
        }
        (token, span)
    }

    /// Follow JSX nesting through one token
    fn enter(&mut self, token: &Token, span: &Span) {
        let Some(&top) = self.modes.last() else { return };
        let is_op = |s: &str| matches!(token, Token::Operator(op) if op == s);
        let depth = self.modes.len();

        match (top, token) {
            (Mode::Code { braces }, Token::BraceOpen) => self.set_top(Mode::Code { braces: braces + 1 }),
            (Mode::Code { braces: 0 }, Token::BraceClose) if depth > 1 => {
                self.modes.pop();
            }
            (Mode::Code { braces }, Token::BraceClose) => {
                self.set_top(Mode::Code { braces: braces.saturating_sub(1) })
            }
            (Mode::Code { .. }, _) if is_op("<") && self.opens_tag(span.end) => {
                self.modes.push(Mode::Tag { closing: false })
            }
            (Mode::Tag { .. } | Mode::Children, Token::BraceOpen) => {
                self.modes.push(Mode::Code { braces: 0 })
            }
            (Mode::Tag { closing: true }, _) if is_op(">") => {
                self.modes.pop();
            }
            (Mode::Tag { closing: false }, _) if is_op(">") => self.set_top(Mode::Children),
            (Mode::Tag { .. }, _) if is_op("/") => self.set_top(Mode::Tag { closing: true }),
            (Mode::Children, _) if is_op("<") => {
                if self.input[span.end..].trim_start().starts_with('/') {
                    self.set_top(Mode::Tag { closing: true });
                } else {
                    self.modes.push(Mode::Tag { closing: false });
                }
            }
            _ => {}
        }
    }

    fn set_top(&mut self, mode: Mode) {
        if let Some(top) = self.modes.last_mut() {
            *top = mode;
        }
    }

    /// Append a token, first inserting a zero-width `Semicolon` if a line
    /// break outside JSX ends the previous statement
    fn push(&mut self, token: Token, span: Span) {
        let boundary = match self.tokens.last() {
            Some((prev, prev_span)) if self.modes.len() == 1 => {
                let gap = &self.input[prev_span.end..span.start];
                (gap.contains('\n') && prev.ends_expression() && !token.continues_expression())
                    .then_some(prev_span.end)
            }
            _ => None,
        };
        if let Some(at) = boundary {
            self.tokens.push((Token::Semicolon, at..at));
        }
        self.tokens.push((token, span));
    }
}

/// Lex input string into tokens with spans
///
/// Line breaks that end a statement are made explicit: a zero-width
/// `Semicolon` is inserted wherever an expression ends on one line and the
/// next line starts something that cannot continue it.
///
/// `/` where an expression may start is read as a regex literal, and text
/// between JSX tags is skipped. Source that does not close its JSX elements
/// is lexed again with JSX detection off.
pub fn lex(input: &str) -> Result<Vec<(Token, Span)>, ParseError> {
    Scanner::new(input, true)
        .run()
        .or_else(|error| Scanner::new(input, false).run().map_err(|_| error))
}
