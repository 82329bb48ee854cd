use std::{fmt::Display, ops::Range};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Lexical,
    Syntax,
    Type,
    Internal,
}

impl Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorClass::Lexical => write!(f, "Lexical error"),
            ErrorClass::Syntax => write!(f, "Syntax error"),
            ErrorClass::Type => write!(f, "Type error"),
            ErrorClass::Internal => write!(f, "Internal error"),
        }
    }
}

/// Plain-text rendering of a fatal error: a banner naming the class, the
/// offending line with a caret under the focused words, and the error text.
///
/// `focus` indexes into `words`. An empty range points just before the word
/// at `focus.start`, or past the end of the line when that index is out of
/// bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    class: ErrorClass,
    message: String,
    line: usize,
    words: Vec<String>,
    focus: Range<usize>,
}

impl Report {
    pub fn new<S: Into<String>>(
        class: ErrorClass,
        message: impl Into<String>,
        line: usize,
        words: impl IntoIterator<Item = S>,
        focus: Range<usize>,
    ) -> Self {
        Report {
            class,
            message: message.into(),
            line,
            words: words.into_iter().map(Into::into).collect(),
            focus,
        }
    }

    pub fn class(&self) -> ErrorClass {
        self.class
    }

    /// One-based line number.
    pub fn line(&self) -> usize {
        self.line + 1
    }

    fn column(&self, index: usize) -> usize {
        self.words[..index]
            .iter()
            .map(|word| word.chars().count() + 1)
            .sum()
    }

    /// Returns the caret column and caret width.
    fn caret(&self, excerpt_width: usize) -> (usize, usize) {
        let len = self.words.len();
        if self.focus.start >= len {
            let column = if excerpt_width == 0 { 0 } else { excerpt_width + 1 };
            return (column, 1);
        }
        if self.focus.is_empty() {
            return (self.column(self.focus.start), 1);
        }
        let end = self.focus.end.min(len);
        let start = self.column(self.focus.start);
        let stop = self.column(end - 1) + self.words[end - 1].chars().count();
        (start, stop - start)
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let excerpt = self.words.join(" ");
        let excerpt_width = excerpt.chars().count();
        let (column, carets) = self.caret(excerpt_width);
        let marker = format!(
            "{}{}{}",
            "-".repeat(column),
            "^".repeat(carets),
            "-".repeat(excerpt_width.saturating_sub(column + carets))
        );
        let indicator = format!(" (line {})", self.line());

        let title = format!(" {} ", self.class);
        let longest = self
            .message
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        let width = longest
            .max(marker.chars().count() + indicator.len())
            .max(title.len());
        let padding = width - title.len();

        writeln!(
            f,
            "{}{title}{}",
            "=".repeat(padding.div_ceil(2)),
            "=".repeat(padding / 2)
        )?;
        writeln!(f, "{excerpt}")?;
        writeln!(f, "{marker}{indicator}")?;
        writeln!(f)?;
        writeln!(f, "{}", self.message)?;
        writeln!(f, "{}", "=".repeat(width))
    }
}
