// Sandbox lexer
// Turns custom algorithm text into line-tagged tokens

use super::SandboxError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Int(i64),
    Ident(String),

    // Keywords
    Let,
    If,
    Else,
    While,
    For,
    In,
    Rev,
    Break,
    Continue,
    Return,

    // Delimiters
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    DotDot,

    // Operators
    Assign,
    PlusAssign,
    MinusAssign,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    AndAnd,
    OrOr,
    Bang,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
}

fn keyword(word: &str) -> Option<Token> {
    let token = match word {
        "let" => Token::Let,
        "if" => Token::If,
        "else" => Token::Else,
        "while" => Token::While,
        "for" => Token::For,
        "in" => Token::In,
        "rev" => Token::Rev,
        "break" => Token::Break,
        "continue" => Token::Continue,
        "return" => Token::Return,
        _ => return None,
    };
    Some(token)
}

/// Tokenize the whole program
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, SandboxError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];

        if c == '\n' {
            line += 1;
            pos += 1;
            continue;
        }
        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        // Line comments: `//` and `#`
        if c == '#' || (c == '/' && chars.get(pos + 1) == Some(&'/')) {
            while pos < chars.len() && chars[pos] != '\n' {
                pos += 1;
            }
            continue;
        }

        if c.is_ascii_digit() {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '_') {
                pos += 1;
            }
            let text: String = chars[start..pos].iter().filter(|&&d| d != '_').collect();
            let value = text.parse::<i64>().map_err(|_| SandboxError::Parse {
                line,
                message: format!("integer literal '{}' is too large", text),
            })?;
            tokens.push(Spanned {
                token: Token::Int(value),
                line,
            });
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '_') {
                pos += 1;
            }
            let word: String = chars[start..pos].iter().collect();
            let token = keyword(&word).unwrap_or(Token::Ident(word));
            tokens.push(Spanned { token, line });
            continue;
        }

        let next = chars.get(pos + 1).copied();
        let (token, width) = match (c, next) {
            ('.', Some('.')) => (Token::DotDot, 2),
            ('=', Some('=')) => (Token::Eq, 2),
            ('!', Some('=')) => (Token::NotEq, 2),
            ('<', Some('=')) => (Token::LtEq, 2),
            ('>', Some('=')) => (Token::GtEq, 2),
            ('+', Some('=')) => (Token::PlusAssign, 2),
            ('-', Some('=')) => (Token::MinusAssign, 2),
            ('&', Some('&')) => (Token::AndAnd, 2),
            ('|', Some('|')) => (Token::OrOr, 2),
            ('{', _) => (Token::LBrace, 1),
            ('}', _) => (Token::RBrace, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            ('[', _) => (Token::LBracket, 1),
            (']', _) => (Token::RBracket, 1),
            (';', _) => (Token::Semicolon, 1),
            (',', _) => (Token::Comma, 1),
            ('=', _) => (Token::Assign, 1),
            ('<', _) => (Token::Lt, 1),
            ('>', _) => (Token::Gt, 1),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('%', _) => (Token::Percent, 1),
            ('!', _) => (Token::Bang, 1),
            _ => {
                return Err(SandboxError::Parse {
                    line,
                    message: format!("unexpected character '{}'", c),
                })
            }
        };

        tokens.push(Spanned { token, line });
        pos += width;
    }

    Ok(tokens)
}
