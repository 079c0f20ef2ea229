use crate::lexer::{Token, TokenKind};

use super::parser::SyntaxError;

/// Accumulates tokens across interactive lines and releases them only once
/// the input is balanced, so the console can tell "needs more lines" from
/// "malformed".
///
/// Besides braces and parentheses the balance stack tracks `if` and
/// `function` keywords: a guard or signature line leaves its keyword on the
/// stack until the opening brace of its block arrives, which lets
/// `if x < 3` on its own line buffer instead of parsing incomplete.
///
/// In batch mode the buffer is pass-through and imbalance is left for the
/// parser to report.
pub struct TokenBuffer {
    interactive: bool,
    tokens: Vec<Token>,
    balance: Vec<TokenKind>,
}

impl TokenBuffer {
    pub fn new(interactive: bool) -> Self {
        TokenBuffer {
            interactive,
            tokens: Vec::new(),
            balance: Vec::new(),
        }
    }

    /// Adds freshly lexed tokens. A closer that does not match the top of
    /// the balance stack discards the whole buffer and reports.
    pub fn add(&mut self, new_tokens: Vec<Token>) -> Result<(), SyntaxError> {
        if !self.interactive {
            self.tokens = new_tokens;
            return Ok(());
        }

        for token in new_tokens {
            match token.kind {
                TokenKind::LeftBrace | TokenKind::LeftParen => {
                    if token.kind == TokenKind::LeftBrace
                        && matches!(
                            self.balance.last(),
                            Some(TokenKind::If) | Some(TokenKind::Function)
                        )
                    {
                        self.balance.pop();
                    }
                    self.balance.push(token.kind);
                }
                TokenKind::If | TokenKind::Function => {
                    self.balance.push(token.kind);
                }
                TokenKind::RightBrace | TokenKind::RightParen => {
                    if self.balance.last() != Some(&opening_for(token.kind)) {
                        self.clear();
                        return Err(SyntaxError::new("Unexpected token", Some(token)));
                    }
                    self.balance.pop();
                }
                _ => {}
            }
            self.tokens.push(token);
        }
        Ok(())
    }

    /// Takes the buffered tokens if the input is balanced; `None` means more
    /// lines are needed.
    pub fn take_ready(&mut self) -> Option<Vec<Token>> {
        if self.balance.is_empty() {
            Some(std::mem::take(&mut self.tokens))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
        self.balance.clear();
    }
}

fn opening_for(kind: TokenKind) -> TokenKind {
    match kind {
        TokenKind::RightBrace => TokenKind::LeftBrace,
        TokenKind::RightParen => TokenKind::LeftParen,
        _ => unreachable!("not a closing token: {:?}", kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn feed(buffer: &mut TokenBuffer, line: &str) -> Result<(), SyntaxError> {
        buffer.add(tokenize(line))
    }

    #[test]
    fn test_balanced_line_is_released() {
        let mut buffer = TokenBuffer::new(true);
        feed(&mut buffer, "x = 1;\n").unwrap();
        assert!(buffer.take_ready().is_some());
    }

    #[test]
    fn test_open_brace_defers() {
        let mut buffer = TokenBuffer::new(true);
        feed(&mut buffer, "while x < 3 {\n").unwrap();
        assert!(buffer.take_ready().is_none());
        feed(&mut buffer, "x = x + 1;\n").unwrap();
        assert!(buffer.take_ready().is_none());
        feed(&mut buffer, "}\n").unwrap();
        let tokens = buffer.take_ready().unwrap();
        assert!(!tokens.is_empty());
    }

    #[test]
    fn test_if_guard_line_defers_until_block_opens() {
        let mut buffer = TokenBuffer::new(true);
        feed(&mut buffer, "if x < 3\n").unwrap();
        assert!(buffer.take_ready().is_none());
        feed(&mut buffer, "{ x = 0; }\n").unwrap();
        assert!(buffer.take_ready().is_some());
    }

    #[test]
    fn test_mismatched_closer_reports_and_discards() {
        let mut buffer = TokenBuffer::new(true);
        assert!(feed(&mut buffer, "x = (1 + 2};\n").is_err());
        feed(&mut buffer, "y = 1;\n").unwrap();
        // Only the fresh line survives
        let tokens = buffer.take_ready().unwrap();
        assert_eq!(&*tokens[0].text, "y");
    }

    #[test]
    fn test_batch_mode_is_pass_through() {
        let mut buffer = TokenBuffer::new(false);
        feed(&mut buffer, "while x {\n").unwrap();
        assert!(buffer.take_ready().is_some());
    }
}
