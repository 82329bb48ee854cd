use std::{borrow::Cow, fmt::Display, ops::Range};

use log::{debug, trace};
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::report::{ErrorClass, Report};

pub const KEYWORDS: &[&str] = &["plot", "default", "overwrite", "ow", "axis"];
pub const STATEMENT_DELIMITER: &str = ";;";
pub const MODIFIER_DELIMITER: &str = "|";
pub const IMPLICIT_DELIMITER: &str = "implicit";
pub const FIGURE_DELIMITER: &str = "---";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    #[error("expected a keyword before `{0}`")]
    StatementExpected(String),
    #[error("$ is reserved to call variables")]
    ReservedSigil,
    #[error("string is not finished")]
    UnterminatedString,
    #[error("missing {0}")]
    MissingOpening(char),
    #[error("missing {0}")]
    MissingClosing(char),
    #[error("cannot parse {0}")]
    CannotParse(String),
}

impl LexErrorKind {
    pub fn category(&self) -> &'static str {
        match self {
            LexErrorKind::StatementExpected(_) => "statement expected",
            _ => "invalid expression",
        }
    }
}

#[derive(Error, Debug, Diagnostic)]
#[error("{}: {}", .kind.category(), .kind)]
#[diagnostic(code(plank::lex))]
pub struct LexError {
    pub kind: LexErrorKind,

    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: SourceSpan,

    report: Report,
}

impl LexError {
    pub fn line(&self) -> usize {
        self.report.line()
    }

    pub fn span(&self) -> SourceSpan {
        self.span
    }

    pub fn report(&self) -> &Report {
        &self.report
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bracket {
    OpenParen,
    CloseParen,
    OpenSquare,
    CloseSquare,
}

impl Bracket {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '(' => Some(Bracket::OpenParen),
            ')' => Some(Bracket::CloseParen),
            '[' => Some(Bracket::OpenSquare),
            ']' => Some(Bracket::CloseSquare),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Bracket::OpenParen => '(',
            Bracket::CloseParen => ')',
            Bracket::OpenSquare => '[',
            Bracket::CloseSquare => ']',
        }
    }

    pub fn is_open(self) -> bool {
        matches!(self, Bracket::OpenParen | Bracket::OpenSquare)
    }

    pub fn counterpart(self) -> Bracket {
        match self {
            Bracket::OpenParen => Bracket::CloseParen,
            Bracket::CloseParen => Bracket::OpenParen,
            Bracket::OpenSquare => Bracket::CloseSquare,
            Bracket::CloseSquare => Bracket::OpenSquare,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Identifier,
    Variable,
    String,
    Int,
    Float,
    WeakDelimiter(Bracket),
    ModifierDelimiter,
    StatementDelimiter,
    FigureDelimiter,
}

impl TokenKind {
    /// Structural delimiters; weak delimiters only build containers.
    pub fn is_delimiter(self) -> bool {
        matches!(
            self,
            TokenKind::ModifierDelimiter | TokenKind::StatementDelimiter | TokenKind::FigureDelimiter
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Keyword => write!(f, "keyword"),
            TokenKind::Identifier => write!(f, "identifier"),
            TokenKind::Variable => write!(f, "variable"),
            TokenKind::String => write!(f, "string"),
            TokenKind::Int => write!(f, "int"),
            TokenKind::Float => write!(f, "float"),
            TokenKind::WeakDelimiter(_) => write!(f, "weak_delimiter"),
            TokenKind::ModifierDelimiter => write!(f, "modifier_delimiter"),
            TokenKind::StatementDelimiter => write!(f, "statement_delimiter"),
            TokenKind::FigureDelimiter => write!(f, "figure_delimiter"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'de> {
    pub kind: TokenKind,
    pub literal: Cow<'de, str>,
    /// Zero-based source line.
    pub line: usize,
    /// Indices of the whitespace-separated words of `line` this token came from.
    pub words: Range<usize>,
    pub span: SourceSpan,
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.kind, self.literal)
    }
}

/// Where the lexer stands between two words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Context {
    #[default]
    Idle,
    InStatement,
    InModifier { name_pending: bool },
}

/// Bracket depth of the current line.
#[derive(Debug, Default)]
struct Depth {
    parens: usize,
    squares: usize,
}

impl Depth {
    fn track(&mut self, bracket: Bracket) -> Result<(), LexErrorKind> {
        match bracket {
            Bracket::OpenParen => self.parens += 1,
            Bracket::OpenSquare => self.squares += 1,
            Bracket::CloseParen => {
                self.parens = self
                    .parens
                    .checked_sub(1)
                    .ok_or(LexErrorKind::MissingOpening('('))?;
            }
            Bracket::CloseSquare => {
                self.squares = self
                    .squares
                    .checked_sub(1)
                    .ok_or(LexErrorKind::MissingOpening('['))?;
            }
        }
        Ok(())
    }

    fn unclosed(&self) -> Option<char> {
        if self.parens != 0 {
            Some(')')
        } else if self.squares != 0 {
            Some(']')
        } else {
            None
        }
    }
}

fn delimiter_kind(word: &str) -> Option<TokenKind> {
    if word == STATEMENT_DELIMITER {
        Some(TokenKind::StatementDelimiter)
    } else if word == MODIFIER_DELIMITER {
        Some(TokenKind::ModifierDelimiter)
    } else if word.len() >= 3 && word.chars().all(|c| c == '-') {
        Some(TokenKind::FigureDelimiter)
    } else {
        None
    }
}

fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

fn is_quote(c: char) -> bool {
    matches!(c, '"' | '\'' | '`')
}

/// Classifies one bracket-free content run.
fn classify(run: &str) -> Result<(TokenKind, Cow<'_, str>), LexErrorKind> {
    if let Some(name) = run.strip_prefix('$') {
        if name.is_empty() {
            return Err(LexErrorKind::ReservedSigil);
        }
        return Ok((TokenKind::Variable, Cow::Borrowed(name)));
    }

    let (sign, unsigned) = match run.strip_prefix('-') {
        Some(unsigned) => ("-", unsigned),
        None => ("", run),
    };
    if !unsigned.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return Ok((TokenKind::Identifier, Cow::Borrowed(run)));
    }

    let numeric = unsigned.chars().all(|c| c.is_ascii_digit() || c == '.')
        && unsigned.matches('.').count() <= 1
        && unsigned.contains(|c: char| c.is_ascii_digit());
    if !numeric {
        return Err(LexErrorKind::CannotParse(run.to_string()));
    }

    let kind = if unsigned.contains('.') {
        TokenKind::Float
    } else {
        TokenKind::Int
    };
    // turns .5 into 0.5
    let literal = if unsigned.starts_with('.') {
        Cow::Owned(format!("{sign}0{unsigned}"))
    } else {
        Cow::Borrowed(run)
    };
    Ok((kind, literal))
}

pub struct Lexer<'de> {
    filename: Option<&'de str>,
    whole: &'de str,
    tokens: Vec<Token<'de>>,
}

impl<'de> Lexer<'de> {
    pub fn new(filename: Option<&'de str>, input: &'de str) -> Self {
        Lexer {
            filename,
            whole: input,
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token<'de>>, LexError> {
        let mut context = Context::Idle;
        let mut lines = 0;
        let whole = self.whole;
        for (line_no, line) in whole.lines().enumerate() {
            context = self.lex_line(context, line_no, line)?;
            lines += 1;
        }
        self.drop_trailing_statement_delimiters();
        debug!("tokenized {lines} lines into {} tokens", self.tokens.len());
        Ok(self.tokens)
    }

    fn lex_line(
        &mut self,
        mut context: Context,
        line_no: usize,
        line: &'de str,
    ) -> Result<Context, LexError> {
        let words: Vec<&'de str> = line.split_whitespace().collect();
        let mut depth = Depth::default();
        let mut i = 0;

        while i < words.len() {
            let word = words[i];
            if word.starts_with('#') {
                break;
            }

            let delimiter = delimiter_kind(word);
            if i == 0 && delimiter.is_none() && self.needs_implicit_delimiter() {
                trace!("implicit statement delimiter before line {}", line_no + 1);
                let offset = self.offset(word);
                self.push(
                    TokenKind::StatementDelimiter,
                    Cow::Borrowed(IMPLICIT_DELIMITER),
                    line_no,
                    0..0,
                    offset..offset,
                );
                context = Context::Idle;
            }

            context = match delimiter {
                Some(kind) => self.lex_delimiter(context, kind, line_no, &words, i)?,
                None if context == (Context::InModifier { name_pending: true }) && is_keyword(word) => {
                    self.push_word(TokenKind::Identifier, line_no, word, i);
                    Context::InModifier {
                        name_pending: false,
                    }
                }
                None if is_keyword(word) => {
                    self.push_word(TokenKind::Keyword, line_no, word, i);
                    match context {
                        Context::Idle => Context::InStatement,
                        context => context,
                    }
                }
                None if context == Context::Idle => {
                    return Err(self.error(
                        LexErrorKind::StatementExpected(word.to_string()),
                        line_no,
                        &words,
                        i..i + 1,
                    ));
                }
                None => {
                    i = self.lex_literal(line_no, &words, i, &mut depth)?;
                    match context {
                        Context::InModifier { .. } => Context::InModifier {
                            name_pending: false,
                        },
                        context => context,
                    }
                }
            };
            i += 1;
        }

        if let Some(closer) = depth.unclosed() {
            let last = i.saturating_sub(1);
            return Err(self.error(
                LexErrorKind::MissingClosing(closer),
                line_no,
                &words,
                last..last + 1,
            ));
        }

        Ok(context)
    }

    fn lex_delimiter(
        &mut self,
        context: Context,
        kind: TokenKind,
        line_no: usize,
        words: &[&'de str],
        i: usize,
    ) -> Result<Context, LexError> {
        let word = words[i];
        match kind {
            TokenKind::ModifierDelimiter if context == Context::Idle => Err(self.error(
                LexErrorKind::StatementExpected(word.to_string()),
                line_no,
                words,
                i..i + 1,
            )),
            TokenKind::ModifierDelimiter => {
                self.push_word(kind, line_no, word, i);
                Ok(Context::InModifier { name_pending: true })
            }
            TokenKind::FigureDelimiter => {
                self.drop_trailing_statement_delimiters();
                let bytes = self.range_of(word);
                self.push(kind, Cow::Borrowed(FIGURE_DELIMITER), line_no, i..i + 1, bytes);
                Ok(Context::Idle)
            }
            _ => {
                self.push_word(kind, line_no, word, i);
                Ok(Context::Idle)
            }
        }
    }

    /// Lexes the literal starting at `words[i]` and returns the index of the
    /// last word it consumed.
    fn lex_literal(
        &mut self,
        line_no: usize,
        words: &[&'de str],
        mut i: usize,
        depth: &mut Depth,
    ) -> Result<usize, LexError> {
        let mut rest: &'de str = words[i];
        let mut content_seen = false;

        while let Some(c) = rest.chars().next() {
            if let Some(bracket) = Bracket::from_char(c) {
                depth
                    .track(bracket)
                    .map_err(|kind| self.error(kind, line_no, words, i..i + 1))?;
                let (literal, remainder) = rest.split_at(1);
                let bytes = self.range_of(literal);
                self.push(
                    TokenKind::WeakDelimiter(bracket),
                    Cow::Borrowed(literal),
                    line_no,
                    i..i + 1,
                    bytes,
                );
                rest = remainder;
                continue;
            }

            // one content run per word, brackets aside
            if content_seen {
                return Err(self.error(
                    LexErrorKind::CannotParse(words[i].to_string()),
                    line_no,
                    words,
                    i..i + 1,
                ));
            }
            content_seen = true;

            if is_quote(c) {
                let (last, remainder) = self.lex_string(line_no, words, i, rest)?;
                i = last;
                rest = remainder;
                continue;
            }

            let end = rest
                .find(|c: char| Bracket::from_char(c).is_some())
                .unwrap_or(rest.len());
            let (run, remainder) = rest.split_at(end);
            let (kind, literal) =
                classify(run).map_err(|kind| self.error(kind, line_no, words, i..i + 1))?;
            let bytes = self.range_of(run);
            self.push(kind, literal, line_no, i..i + 1, bytes);
            rest = remainder;
        }

        Ok(i)
    }

    /// `rest` is the tail of `words[i]` starting at the opening quote.
    fn lex_string(
        &mut self,
        line_no: usize,
        words: &[&'de str],
        i: usize,
        rest: &'de str,
    ) -> Result<(usize, &'de str), LexError> {
        let (quote, body) = rest.split_at(1);
        let start = self.offset(rest);

        if let Some(end) = body.find(quote) {
            let remainder = &body[end + 1..];
            let stop = self.offset(remainder);
            self.push(
                TokenKind::String,
                Cow::Borrowed(&body[..end]),
                line_no,
                i..i + 1,
                start..stop,
            );
            return Ok((i, remainder));
        }

        let mut text = body.to_string();
        for (j, word) in words.iter().copied().enumerate().skip(i + 1) {
            text.push(' ');
            if let Some(end) = word.find(quote) {
                text.push_str(&word[..end]);
                let remainder = &word[end + 1..];
                let stop = self.offset(remainder);
                self.push(
                    TokenKind::String,
                    Cow::Owned(text),
                    line_no,
                    i..j + 1,
                    start..stop,
                );
                return Ok((j, remainder));
            }
            text.push_str(word);
        }

        Err(self.error(
            LexErrorKind::UnterminatedString,
            line_no,
            words,
            i..words.len(),
        ))
    }

    fn needs_implicit_delimiter(&self) -> bool {
        self.tokens
            .last()
            .is_some_and(|token| !token.kind.is_delimiter())
    }

    fn drop_trailing_statement_delimiters(&mut self) {
        while self
            .tokens
            .last()
            .is_some_and(|token| token.kind == TokenKind::StatementDelimiter)
        {
            self.tokens.pop();
        }
    }

    fn push(
        &mut self,
        kind: TokenKind,
        literal: Cow<'de, str>,
        line: usize,
        words: Range<usize>,
        bytes: Range<usize>,
    ) {
        self.tokens.push(Token {
            kind,
            literal,
            line,
            words,
            span: SourceSpan::from(bytes),
        });
    }

    fn push_word(&mut self, kind: TokenKind, line: usize, word: &'de str, i: usize) {
        let bytes = self.range_of(word);
        self.push(kind, Cow::Borrowed(word), line, i..i + 1, bytes);
    }

    /// Byte offset of a slice of the input.
    fn offset(&self, part: &str) -> usize {
        part.as_ptr() as usize - self.whole.as_ptr() as usize
    }

    fn range_of(&self, part: &str) -> Range<usize> {
        let start = self.offset(part);
        start..start + part.len()
    }

    fn error(
        &self,
        kind: LexErrorKind,
        line_no: usize,
        words: &[&'de str],
        focus: Range<usize>,
    ) -> LexError {
        let start = self.offset(words[focus.start]);
        let last = words[focus.end - 1];
        let span = SourceSpan::from(start..self.offset(last) + last.len());
        let message = format!("{}\n{kind}", kind.category());

        LexError {
            report: Report::new(
                ErrorClass::Lexical,
                message,
                line_no,
                words.iter().copied(),
                focus,
            ),
            src: NamedSource::new(self.filename.unwrap_or("<input>"), self.whole.to_string()),
            span,
            kind,
        }
    }
}
