use crate::lex::{Token, TokenKind};

/// Forward-only view over a token slice with one token of lookahead.
#[derive(Debug)]
pub struct Cursor<'t, 'de> {
    tokens: &'t [Token<'de>],
    index: usize,
}

impl<'t, 'de> Cursor<'t, 'de> {
    pub fn new(tokens: &'t [Token<'de>]) -> Self {
        Cursor { tokens, index: 0 }
    }

    pub fn current(&self) -> Option<&'t Token<'de>> {
        self.tokens.get(self.index)
    }

    pub fn current_kind(&self) -> Option<TokenKind> {
        self.current().map(|token| token.kind)
    }

    /// Consumes and returns the current token.
    pub fn advance(&mut self) -> Option<&'t Token<'de>> {
        let token = self.current()?;
        self.index += 1;
        Some(token)
    }

    pub fn is_at_end(&self) -> bool {
        self.index >= self.tokens.len()
    }

    /// Last token of the whole sequence, used to place end-of-input errors.
    pub fn last(&self) -> Option<&'t Token<'de>> {
        self.tokens.last()
    }
}
