use chumsky::prelude::*;
use std::rc::Rc;

use crate::diagnostic::{line_col, line_text};

/// Token classification. Comments, newlines and unrecognized characters are
/// consumed during tokenization and never reach the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    StringLiteral,
    FloatLiteral,
    IntLiteral,
    BoolLiteral,
    // Keywords
    Function,
    If,
    ElseIf,
    Else,
    ForEach,
    For,
    While,
    Break,
    Return,
    Try,
    Catch,
    Import,
    Null,
    // Brackets
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,
    // Operators
    Lambda,
    Add,
    Sub,
    Div,
    Mod,
    Mul,
    LessEq,
    Less,
    GreaterEq,
    Greater,
    Eq,
    Assign,
    NotEq,
    Comma,
    Dot,
    Identifier,
    // Separators
    Semicolon,
    // Anything no pattern claims; dropped before tokens are returned
    Unknown,
}

/// A classified slice of source text, with enough position information for
/// syntax errors and backtraces.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: Rc<str>,
    pub line: usize,
    pub column: usize,
    pub source_line: Rc<str>,
}

impl Token {
    pub fn as_identifier(&self) -> Rc<str> {
        self.text.clone()
    }

    pub fn as_int(&self) -> Option<i64> {
        self.text.parse().ok()
    }

    pub fn as_float(&self) -> Option<f32> {
        // Strip the mandatory "f" suffix
        self.text[..self.text.len() - 1].parse().ok()
    }

    pub fn as_string(&self) -> Rc<str> {
        Rc::from(self.text.trim_matches('"'))
    }

    pub fn as_bool(&self) -> bool {
        &*self.text == "true"
    }
}

fn lexer<'a>()
-> impl Parser<'a, &'a str, Vec<(TokenKind, SimpleSpan)>, extra::Err<Simple<'a, char>>> {
    // Float literals carry a mandatory "f" suffix: 2.432f, 41.f, 1093f.
    // A bare "12.5" lexes as int-dot-int and dies in the parser.
    let float = text::digits(10)
        .then(just('.').then(text::digits(10).or_not()).or_not())
        .then(just('f'))
        .to(TokenKind::FloatLiteral);

    let int = text::digits(10).to(TokenKind::IntLiteral);

    // No escape sequences; the quotes stay in the token text
    let string = just('"')
        .then(none_of('"').repeated())
        .then(just('"'))
        .to(TokenKind::StringLiteral);

    // Lexing whole words first is what keeps "if" out of "ifx"
    let word = text::ident().map(|s: &str| match s {
        "true" | "false" => TokenKind::BoolLiteral,
        "function" => TokenKind::Function,
        "if" => TokenKind::If,
        "elseif" => TokenKind::ElseIf,
        "else" => TokenKind::Else,
        "foreach" => TokenKind::ForEach,
        "for" => TokenKind::For,
        "while" => TokenKind::While,
        "break" => TokenKind::Break,
        "return" => TokenKind::Return,
        "try" => TokenKind::Try,
        "catch" => TokenKind::Catch,
        "import" => TokenKind::Import,
        "null" => TokenKind::Null,
        _ => TokenKind::Identifier,
    });

    let op_multi = choice((
        just("=>").to(TokenKind::Lambda),
        just("<=").to(TokenKind::LessEq),
        just(">=").to(TokenKind::GreaterEq),
        just("==").to(TokenKind::Eq),
        just("!=").to(TokenKind::NotEq),
    ));

    let op_single = choice((
        just('{').to(TokenKind::LeftBrace),
        just('}').to(TokenKind::RightBrace),
        just('[').to(TokenKind::LeftBracket),
        just(']').to(TokenKind::RightBracket),
        just('(').to(TokenKind::LeftParen),
        just(')').to(TokenKind::RightParen),
        just('+').to(TokenKind::Add),
        just('-').to(TokenKind::Sub),
        just('/').to(TokenKind::Div),
        just('%').to(TokenKind::Mod),
        just('*').to(TokenKind::Mul),
        just('<').to(TokenKind::Less),
        just('>').to(TokenKind::Greater),
        just('=').to(TokenKind::Assign),
        just(',').to(TokenKind::Comma),
        just('.').to(TokenKind::Dot),
        just(';').to(TokenKind::Semicolon),
    ));

    let token = choice((float, int, string, word, op_multi, op_single));

    let comment = just("//")
        .then(any().and_is(just('\n').not()).repeated())
        .padded();

    token
        .or(any().to(TokenKind::Unknown))
        .map_with(|kind, e| (kind, e.span()))
        .padded_by(comment.repeated())
        .padded()
        .repeated()
        .collect()
        .then_ignore(end())
}

/// Tokenizes a whole source text. There is no failure case: characters no
/// pattern claims are skipped, and malformed input is the parser's problem.
pub fn tokenize(source: &str) -> Vec<Token> {
    let raw = match lexer().parse(source).into_output() {
        Some(raw) => raw,
        None => return Vec::new(),
    };

    raw.into_iter()
        .filter(|(kind, _)| *kind != TokenKind::Unknown)
        .map(|(kind, span)| {
            let (line, column) = line_col(source, span.start);
            Token {
                kind,
                text: Rc::from(&source[span.start..span.end]),
                line,
                column,
                source_line: Rc::from(line_text(source, line).trim()),
            }
        })
        .collect()
}
