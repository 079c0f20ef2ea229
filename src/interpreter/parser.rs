use std::path::PathBuf;
use std::rc::Rc;

use crate::ast::{BinaryOp, BlockId, DebugInfo, ExprId, ExprKind, Program, StmtKind};
use crate::lexer::{tokenize, Token, TokenKind};
use crate::logging;
use crate::types::Type;
use crate::value::Value;

use super::token_buffer::TokenBuffer;

/// A parse-time failure, carrying the token it was detected at. Syntax
/// errors never participate in the language's `try`/`catch`; interactive
/// mode reports them and discards the buffered input.
#[derive(Debug, Clone)]
pub struct SyntaxError {
    pub message: String,
    pub token: Option<Token>,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, token: Option<Token>) -> Self {
        SyntaxError {
            message: message.into(),
            token,
        }
    }
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.token {
            Some(token) => write!(
                f,
                "{}:{} : {}: {}\n\t{}",
                token.line, token.column, self.message, token.text, token.source_line
            ),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for SyntaxError {}

/// Ordered directory list used to resolve `import <name>` to a file of
/// exactly that name.
#[derive(Debug, Clone, Default)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, dir: impl Into<PathBuf>) {
        self.dirs.push(dir.into());
    }

    pub fn find(&self, module_name: &str) -> Option<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(module_name))
            .find(|candidate| candidate.is_file())
    }
}

/// Front end of the interpreter: feeds source text through the token buffer
/// and recursive descent into the program arena. One parser instance serves
/// a whole session, so the buffer can carry interactive input across lines.
pub struct Parser {
    file: Rc<str>,
    path: SearchPath,
    buffer: TokenBuffer,
}

impl Parser {
    pub fn new(file_name: Option<&str>, path: SearchPath, interactive: bool) -> Self {
        Parser {
            file: Rc::from(file_name.unwrap_or("<unnamed>")),
            path,
            buffer: TokenBuffer::new(interactive),
        }
    }

    /// Parses a chunk of source into a fresh top-level sequence. `Ok(None)`
    /// means the input is incomplete (or empty) and more lines are needed.
    pub fn parse(
        &mut self,
        source: &str,
        program: &mut Program,
    ) -> Result<Option<BlockId>, SyntaxError> {
        self.buffer.add(tokenize(source))?;

        let tokens = match self.buffer.take_ready() {
            Some(tokens) if !tokens.is_empty() => tokens,
            _ => return Ok(None),
        };

        let root = parse_sequence(program, tokens, self.file.clone(), &self.path)?;
        logging::debug(
            "parser",
            format_args!("parsed {} top-level statements", program.block_len(root)),
        );
        Ok(Some(root))
    }
}

/// Parses a complete token sequence into a new block. Used for top-level
/// input and, recursively, for imported modules.
fn parse_sequence(
    program: &mut Program,
    tokens: Vec<Token>,
    file: Rc<str>,
    path: &SearchPath,
) -> Result<BlockId, SyntaxError> {
    let mut cursor = TokenCursor {
        tokens,
        current: 0,
        paren_stack: Vec::new(),
        program,
        file,
        path,
    };
    cursor.parse_top_level()
}

struct TokenCursor<'p> {
    tokens: Vec<Token>,
    current: usize,
    /// Open parentheses/braces and pending assignments; a statement-position
    /// call only demands its trailing `;` when this is empty.
    paren_stack: Vec<TokenKind>,
    program: &'p mut Program,
    file: Rc<str>,
    path: &'p SearchPath,
}

impl TokenCursor<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn previous(&self) -> Option<Token> {
        if self.current > 0 {
            self.tokens.get(self.current - 1).cloned()
        } else {
            None
        }
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.current).cloned();
        if token.is_some() {
            self.current += 1;
        }
        token
    }

    /// Fails with `message` at the previous token when the input ended.
    fn assert_some(&self, message: &str) -> Result<&Token, SyntaxError> {
        self.peek()
            .ok_or_else(|| SyntaxError::new(message, self.previous()))
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<Token, SyntaxError> {
        match self.peek() {
            Some(token) if token.kind == kind => Ok(self.advance().unwrap()),
            _ => Err(SyntaxError::new(message, self.previous())),
        }
    }

    fn parse_top_level(&mut self) -> Result<BlockId, SyntaxError> {
        let block = self.program.add_block();
        while let Some(token) = self.peek() {
            if token.kind == TokenKind::Semicolon {
                let token = self.advance().unwrap();
                let debug = self.debug_info(&token);
                self.program.append(block, StmtKind::Nop, Some(debug));
                continue;
            }
            self.parse_statement(block, "Unexpected token after")?;
        }
        Ok(block)
    }

    fn debug_info(&self, token: &Token) -> DebugInfo {
        DebugInfo {
            line: token.line,
            column: token.column,
            text: token.source_line.clone(),
            file: self.file.clone(),
        }
    }

    /// Parses one statement and appends it to `block`, stamped with the
    /// leading token's location.
    fn parse_statement(&mut self, block: BlockId, message: &str) -> Result<(), SyntaxError> {
        let leading = self
            .peek()
            .cloned()
            .ok_or_else(|| SyntaxError::new(message, self.previous()))?;

        let kind = match leading.kind {
            TokenKind::Identifier => self.parse_identifier_statement()?,
            TokenKind::If => {
                let (condition, body) = self.parse_guarded_block()?;
                StmtKind::If { condition, body }
            }
            TokenKind::ElseIf => {
                let (condition, body) = self.parse_guarded_block()?;
                StmtKind::ElseIf { condition, body }
            }
            TokenKind::Else => {
                self.advance();
                self.assert_block_follows()?;
                StmtKind::Else {
                    body: self.parse_block()?,
                }
            }
            TokenKind::While => {
                let (condition, body) = self.parse_guarded_block()?;
                StmtKind::While { condition, body }
            }
            TokenKind::Break => {
                self.advance();
                self.parse_semicolon("Expected \";\" after")?;
                StmtKind::Break
            }
            TokenKind::LeftBrace => StmtKind::Block(self.parse_block()?),
            TokenKind::Function => self.parse_function()?,
            TokenKind::Return => self.parse_return()?,
            TokenKind::Try => {
                self.advance();
                self.assert_block_follows()?;
                StmtKind::Try {
                    body: self.parse_block()?,
                }
            }
            TokenKind::Catch => self.parse_catch()?,
            TokenKind::Import => self.parse_import()?,
            _ => return Err(SyntaxError::new(message, self.previous().or(Some(leading)))),
        };

        let debug = self.debug_info(&leading);
        self.program.append(block, kind, Some(debug));
        Ok(())
    }

    /// identifier [index]? followed by an assignment or a call.
    fn parse_identifier_statement(&mut self) -> Result<StmtKind, SyntaxError> {
        let name_token = self.advance().unwrap();
        let name = name_token.as_identifier();

        let mut target = ExprKind::Identifier(name.clone());
        let mut indexed = false;
        if self.peek_kind() == Some(TokenKind::LeftBracket) {
            target = self.parse_indexed_identifier(name.clone())?;
            indexed = true;
        }

        match self.peek_kind() {
            Some(TokenKind::Assign) => {
                let target = self.program.add_expr(target);
                self.parse_assign(target)
            }
            Some(TokenKind::LeftParen) if !indexed => {
                let call = self.parse_call(name)?;
                self.parse_semicolon("Expected \";\" after")?;
                Ok(StmtKind::Call { call })
            }
            _ => Err(SyntaxError::new(
                "Expected assignment or function call after",
                self.previous(),
            )),
        }
    }

    fn parse_assign(&mut self, target: ExprId) -> Result<StmtKind, SyntaxError> {
        self.paren_stack.push(TokenKind::Assign);
        self.advance();

        let value = self.require_expression("Expected expression after")?;
        self.parse_semicolon("Expected \";\" or operator after")?;

        self.paren_stack.pop();
        Ok(StmtKind::Assign { target, value })
    }

    fn parse_indexed_identifier(&mut self, name: Rc<str>) -> Result<ExprKind, SyntaxError> {
        self.advance();
        let index = self.require_expression("Expression expected after")?;
        self.expect(TokenKind::RightBracket, "Expected \"]\" after")?;
        Ok(ExprKind::IndexedIdentifier { name, index })
    }

    /// Shared shape of `if`/`elseif`/`while`: guard expression then block.
    fn parse_guarded_block(&mut self) -> Result<(ExprId, BlockId), SyntaxError> {
        self.advance();
        let condition = self.require_expression("Expected expression after")?;
        self.assert_block_follows()?;
        let body = self.parse_block()?;
        Ok((condition, body))
    }

    fn assert_block_follows(&self) -> Result<(), SyntaxError> {
        match self.peek_kind() {
            Some(TokenKind::LeftBrace) => Ok(()),
            _ => Err(SyntaxError::new("Block expected after", self.previous())),
        }
    }

    /// Assumes the current token is `{`.
    fn parse_block(&mut self) -> Result<BlockId, SyntaxError> {
        self.advance();
        let block = self.program.add_block();
        while let Some(token) = self.peek() {
            if token.kind == TokenKind::RightBrace {
                break;
            }
            self.parse_statement(block, "Expected statement after")?;
        }
        self.expect(TokenKind::RightBrace, "Expected right brace after")?;
        Ok(block)
    }

    fn parse_function(&mut self) -> Result<StmtKind, SyntaxError> {
        self.advance();
        let name_token = self.expect(TokenKind::Identifier, "Expected identifier after")?;
        let name = name_token.as_identifier();

        self.expect(TokenKind::LeftParen, "Expected \"(\" after")?;
        let mut params = Vec::new();
        while self.peek_kind() != Some(TokenKind::RightParen) {
            let param = self.expect(TokenKind::Identifier, "Expected parameter name after")?;
            params.push(param.as_identifier());
            if self.peek_kind() == Some(TokenKind::Comma) {
                self.advance();
            }
        }
        self.expect(TokenKind::RightParen, "Expected \")\" after")?;

        self.assert_block_follows()?;
        let body = self.parse_block()?;
        Ok(StmtKind::Function { name, params, body })
    }

    fn parse_return(&mut self) -> Result<StmtKind, SyntaxError> {
        self.advance();
        self.assert_some("Expected \";\" or expression after")?;

        if self.peek_kind() == Some(TokenKind::Semicolon) {
            self.advance();
            let value = self.program.add_expr(ExprKind::Literal(Value::Null));
            return Ok(StmtKind::Return { value });
        }

        let value = self.require_expression("Expected expression after")?;
        self.parse_semicolon("Expected \";\" after")?;
        Ok(StmtKind::Return { value })
    }

    fn parse_catch(&mut self) -> Result<StmtKind, SyntaxError> {
        self.advance();
        self.assert_some("Expected block or expression after")?;

        let mut binding = None;
        if self.peek_kind() == Some(TokenKind::LeftParen) {
            self.advance();
            let name = self.expect(TokenKind::Identifier, "Expected identifier after")?;
            binding = Some(name.as_identifier());
            self.expect(
                TokenKind::RightParen,
                "Missing closing parenthesis after",
            )?;
        }

        self.assert_block_follows()?;
        let body = self.parse_block()?;
        Ok(StmtKind::Catch { binding, body })
    }

    /// Resolves the module against the search path and parses it into the
    /// same arena, so positions inside the module stay valid for the
    /// session's lifetime.
    fn parse_import(&mut self) -> Result<StmtKind, SyntaxError> {
        self.advance();
        let module_token = self.expect(TokenKind::Identifier, "Expected module name after")?;
        let name = module_token.as_identifier();

        let module_path = self.path.find(&name).ok_or_else(|| {
            SyntaxError::new(
                format!("Cannot find module {}", name),
                Some(module_token.clone()),
            )
        })?;

        let source = std::fs::read_to_string(&module_path).map_err(|e| {
            SyntaxError::new(
                format!("Cannot read module {}: {}", name, e),
                Some(module_token.clone()),
            )
        })?;

        logging::debug(
            "parser",
            format_args!("import {} resolved to {}", name, module_path.display()),
        );

        let module_file: Rc<str> = Rc::from(module_path.to_string_lossy().as_ref());
        let module = parse_sequence(
            &mut *self.program,
            tokenize(&source),
            module_file,
            self.path,
        )?;
        Ok(StmtKind::Import { name, module })
    }

    fn parse_semicolon(&mut self, message: &str) -> Result<(), SyntaxError> {
        self.expect(TokenKind::Semicolon, message)?;
        Ok(())
    }

    fn require_expression(&mut self, message: &str) -> Result<ExprId, SyntaxError> {
        match self.parse_expression()? {
            Some(expr) => Ok(expr),
            None => Err(SyntaxError::new(message, self.previous())),
        }
    }

    /// Additive level. Comparisons sit here too, at the same precedence as
    /// `+`/`-`; `1 < 2 + 3` folds left-to-right.
    fn parse_expression(&mut self) -> Result<Option<ExprId>, SyntaxError> {
        const OPS: &[TokenKind] = &[
            TokenKind::Add,
            TokenKind::Sub,
            TokenKind::Eq,
            TokenKind::NotEq,
            TokenKind::Less,
            TokenKind::LessEq,
            TokenKind::Greater,
            TokenKind::GreaterEq,
        ];
        self.parse_binary(OPS, Self::parse_term)
    }

    fn parse_term(&mut self) -> Result<Option<ExprId>, SyntaxError> {
        const OPS: &[TokenKind] = &[TokenKind::Mul, TokenKind::Div, TokenKind::Mod];
        self.parse_binary(OPS, Self::parse_factor)
    }

    fn parse_binary(
        &mut self,
        ops: &[TokenKind],
        next: fn(&mut Self) -> Result<Option<ExprId>, SyntaxError>,
    ) -> Result<Option<ExprId>, SyntaxError> {
        let mut node = match next(self)? {
            Some(node) => node,
            None => return Ok(None),
        };

        while let Some(kind) = self.peek_kind() {
            if !ops.contains(&kind) {
                break;
            }
            let op = token_to_operator(kind)
                .ok_or_else(|| SyntaxError::new("No valid operator given after", self.previous()))?;
            self.advance();
            self.assert_some("Expected expression after")?;

            let right = match next(self)? {
                Some(right) => right,
                None => {
                    return Err(SyntaxError::new("Expected expression after", self.previous()))
                }
            };
            node = self.program.add_expr(ExprKind::Binary {
                op,
                left: node,
                right,
            });
        }

        Ok(Some(node))
    }

    fn parse_factor(&mut self) -> Result<Option<ExprId>, SyntaxError> {
        let token = match self.peek() {
            Some(token) => token.clone(),
            None => return Ok(None),
        };

        if token.kind == TokenKind::LeftParen {
            self.paren_stack.push(TokenKind::LeftParen);
            self.advance();
            let node = self.parse_expression()?;
            self.expect(TokenKind::RightParen, "Missing closing parenthesis after")?;
            self.paren_stack.pop();
            return Ok(node);
        }

        let literal = match token.kind {
            TokenKind::Identifier => None,
            TokenKind::IntLiteral => Some(Value::Int(token.as_int().ok_or_else(|| {
                SyntaxError::new("Invalid int literal", Some(token.clone()))
            })?)),
            TokenKind::FloatLiteral => Some(Value::Float(token.as_float().ok_or_else(|| {
                SyntaxError::new("Invalid float literal", Some(token.clone()))
            })?)),
            TokenKind::StringLiteral => Some(Value::Str(token.as_string())),
            TokenKind::BoolLiteral => Some(Value::Bool(token.as_bool())),
            TokenKind::Null => Some(Value::Null),
            _ => {
                return Err(SyntaxError::new(
                    "Expected identifier or literal instead of",
                    Some(token),
                ))
            }
        };

        self.advance();
        self.assert_some("Expected \";\" or expression")?;

        if let Some(value) = literal {
            return Ok(Some(self.program.add_expr(ExprKind::Literal(value))));
        }

        let name = token.as_identifier();

        // identifier[...] is a typed list literal when the identifier names
        // a registered type, an element read otherwise
        if self.peek_kind() == Some(TokenKind::LeftBracket) {
            if Type::from_keyword(&name).is_some() {
                return Ok(Some(self.parse_list_literal(name)?));
            }
            let indexed = self.parse_indexed_identifier(name)?;
            return Ok(Some(self.program.add_expr(indexed)));
        }

        if self.peek_kind() == Some(TokenKind::LeftParen) {
            return Ok(Some(self.parse_call(name)?));
        }

        if self.peek_kind() == Some(TokenKind::Lambda) {
            self.advance();
            match self.peek_kind() {
                Some(TokenKind::LeftBrace) => {}
                _ => {
                    return Err(SyntaxError::new(
                        "Expected block in lambda expression",
                        self.previous(),
                    ))
                }
            }
            let body = self.parse_block()?;
            let lambda = ExprKind::Lambda {
                params: vec![name],
                body,
            };
            return Ok(Some(self.program.add_expr(lambda)));
        }

        Ok(Some(self.program.add_expr(ExprKind::Identifier(name))))
    }

    fn parse_list_literal(&mut self, elem_keyword: Rc<str>) -> Result<ExprId, SyntaxError> {
        self.advance();
        let mut elements = Vec::new();
        while let Some(token) = self.peek() {
            if token.kind == TokenKind::RightBracket {
                break;
            }
            let element = self.require_expression("Expected expression after")?;
            elements.push(element);
            match self.peek_kind() {
                Some(TokenKind::Comma) => {
                    self.advance();
                }
                Some(TokenKind::RightBracket) => {}
                _ => {
                    return Err(SyntaxError::new(
                        "Expected \",\" or \"]\"",
                        self.peek().cloned().or_else(|| self.previous()),
                    ))
                }
            }
        }
        self.expect(TokenKind::RightBracket, "Expected \"]\" after")?;
        Ok(self.program.add_expr(ExprKind::ListLiteral {
            elem_keyword,
            elements,
        }))
    }

    /// A call in expression or statement position. Outside any nesting the
    /// call must be followed by `;` or an operator.
    fn parse_call(&mut self, name: Rc<str>) -> Result<ExprId, SyntaxError> {
        let call = self.parse_call_internal(name)?;

        if self.paren_stack.is_empty() {
            let follows_ok = match self.peek_kind() {
                None => false,
                Some(TokenKind::Semicolon) => true,
                Some(kind) => token_to_operator(kind).is_some(),
            };
            if !follows_ok {
                return Err(SyntaxError::new(
                    "Expected \";\" or operator after",
                    self.previous(),
                ));
            }
        }

        Ok(call)
    }

    fn parse_call_internal(&mut self, name: Rc<str>) -> Result<ExprId, SyntaxError> {
        self.paren_stack.push(TokenKind::LeftParen);
        self.advance();

        let mut args = Vec::new();
        while let Some(token) = self.peek() {
            if token.kind == TokenKind::RightParen {
                break;
            }
            match self.parse_expression()? {
                Some(arg) => args.push(arg),
                None => break,
            }
            if self.peek_kind() == Some(TokenKind::Comma) {
                self.advance();
            }
        }

        self.expect(TokenKind::RightParen, "Expected \")\" after")?;
        self.paren_stack.pop();

        // Calls naming a registered type are cast pseudo-calls; the registry
        // is immutable, so deciding here agrees with call-time resolution
        let kind = if Type::from_keyword(&name).is_some() {
            ExprKind::TypedExpr { keyword: name, args }
        } else {
            ExprKind::Call { name, args }
        };
        Ok(self.program.add_expr(kind))
    }
}

fn token_to_operator(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Add => Some(BinaryOp::Add),
        TokenKind::Sub => Some(BinaryOp::Sub),
        TokenKind::Mul => Some(BinaryOp::Mul),
        TokenKind::Div => Some(BinaryOp::Div),
        TokenKind::Mod => Some(BinaryOp::Mod),
        TokenKind::Eq => Some(BinaryOp::Eq),
        TokenKind::NotEq => Some(BinaryOp::NotEq),
        TokenKind::Less => Some(BinaryOp::Less),
        TokenKind::LessEq => Some(BinaryOp::LessEq),
        TokenKind::Greater => Some(BinaryOp::Greater),
        TokenKind::GreaterEq => Some(BinaryOp::GreaterEq),
        _ => None,
    }
}
