use std::iter::Peekable;
use std::str::Chars;

use crate::errors::{Loc, SyntaxError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    Let,
    Var,
    Each,
    For,
    Loop,
    While,
    Do,
    Return,
    Break,
    Continue,
    True,
    False,

    // Literals and names
    Ident,
    Number,
    Str,

    // Markers
    Out,      // `<:`
    At,       // `@`
    AttrOpen, // `#[`

    // Assignment operators
    Assign,
    PlusAssign,
    MinusAssign,

    // Operators
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,
    Bang,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Dot,

    // Punctuation
    Colon,
    Comma,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    // Layout
    NewLine,
    Eof,
}

impl TokenKind {
    /// Stable human-readable name used in diagnostics, so error messages
    /// do not depend on the enum's Debug formatting.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Let => "'let'",
            TokenKind::Var => "'var'",
            TokenKind::Each => "'each'",
            TokenKind::For => "'for'",
            TokenKind::Loop => "'loop'",
            TokenKind::While => "'while'",
            TokenKind::Do => "'do'",
            TokenKind::Return => "'return'",
            TokenKind::Break => "'break'",
            TokenKind::Continue => "'continue'",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::Ident => "identifier",
            TokenKind::Number => "number",
            TokenKind::Str => "string",
            TokenKind::Out => "'<:'",
            TokenKind::At => "'@'",
            TokenKind::AttrOpen => "'#['",
            TokenKind::Assign => "'='",
            TokenKind::PlusAssign => "'+='",
            TokenKind::MinusAssign => "'-='",
            TokenKind::EqEq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::LtEq => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::GtEq => "'>='",
            TokenKind::AndAnd => "'&&'",
            TokenKind::OrOr => "'||'",
            TokenKind::Bang => "'!'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Dot => "'.'",
            TokenKind::Colon => "':'",
            TokenKind::Comma => "','",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::NewLine => "newline",
            TokenKind::Eof => "end of input",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token. String tokens hold the decoded contents.
    pub text: String,
    pub loc: Loc,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, loc: Loc) -> Self {
        Token {
            kind,
            text: text.into(),
            loc,
        }
    }
}

fn keyword_kind(word: &str) -> Option<TokenKind> {
    match word {
        "let" => Some(TokenKind::Let),
        "var" => Some(TokenKind::Var),
        "each" => Some(TokenKind::Each),
        "for" => Some(TokenKind::For),
        "loop" => Some(TokenKind::Loop),
        "while" => Some(TokenKind::While),
        "do" => Some(TokenKind::Do),
        "return" => Some(TokenKind::Return),
        "break" => Some(TokenKind::Break),
        "continue" => Some(TokenKind::Continue),
        "true" => Some(TokenKind::True),
        "false" => Some(TokenKind::False),
        _ => None,
    }
}

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input: input.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn loc(&self) -> Loc {
        Loc::new(self.line, self.column)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.input.next();
        if let Some(c) = ch {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        ch
    }

    fn peek(&mut self) -> Option<char> {
        self.input.peek().copied()
    }

    /// Consume the next char if it matches, for two-char operators.
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_spaces(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == ' ' || ch == '\t' || ch == '\r' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn read_string(&mut self, start: Loc) -> Result<String, SyntaxError> {
        let mut result = String::new();
        loop {
            match self.advance() {
                Some('"') => return Ok(result),
                Some('\\') => match self.advance() {
                    Some('n') => result.push('\n'),
                    Some('r') => result.push('\r'),
                    Some('t') => result.push('\t'),
                    Some('\\') => result.push('\\'),
                    Some('"') => result.push('"'),
                    Some(other) => result.push(other),
                    None => {
                        return Err(SyntaxError::new("unterminated string literal", start));
                    }
                },
                Some(ch) => result.push(ch),
                None => {
                    return Err(SyntaxError::new("unterminated string literal", start));
                }
            }
        }
    }

    fn read_number(&mut self, first: char) -> String {
        let mut text = String::new();
        text.push(first);
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        // A single decimal point followed by digits continues the number.
        if self.peek() == Some('.') {
            let mut probe = self.input.clone();
            probe.next();
            if probe.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                text.push('.');
                self.advance();
                while let Some(ch) = self.peek() {
                    if ch.is_ascii_digit() {
                        text.push(ch);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }
        text
    }

    fn read_word(&mut self, first: char) -> String {
        let mut word = String::new();
        word.push(first);
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                word.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        word
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_spaces();
            let loc = self.loc();
            let ch = match self.advance() {
                Some(c) => c,
                None => break,
            };

            let token = match ch {
                '\n' => Token::new(TokenKind::NewLine, "\n", loc),
                '"' => {
                    let contents = self.read_string(loc)?;
                    Token::new(TokenKind::Str, contents, loc)
                }
                '/' => {
                    if self.eat('/') {
                        self.skip_line_comment();
                        continue;
                    }
                    Token::new(TokenKind::Slash, "/", loc)
                }
                '<' => {
                    if self.eat(':') {
                        Token::new(TokenKind::Out, "<:", loc)
                    } else if self.eat('=') {
                        Token::new(TokenKind::LtEq, "<=", loc)
                    } else {
                        Token::new(TokenKind::Lt, "<", loc)
                    }
                }
                '>' => {
                    if self.eat('=') {
                        Token::new(TokenKind::GtEq, ">=", loc)
                    } else {
                        Token::new(TokenKind::Gt, ">", loc)
                    }
                }
                '=' => {
                    if self.eat('=') {
                        Token::new(TokenKind::EqEq, "==", loc)
                    } else {
                        Token::new(TokenKind::Assign, "=", loc)
                    }
                }
                '!' => {
                    if self.eat('=') {
                        Token::new(TokenKind::NotEq, "!=", loc)
                    } else {
                        Token::new(TokenKind::Bang, "!", loc)
                    }
                }
                '+' => {
                    if self.eat('=') {
                        Token::new(TokenKind::PlusAssign, "+=", loc)
                    } else {
                        Token::new(TokenKind::Plus, "+", loc)
                    }
                }
                '-' => {
                    if self.eat('=') {
                        Token::new(TokenKind::MinusAssign, "-=", loc)
                    } else {
                        Token::new(TokenKind::Minus, "-", loc)
                    }
                }
                '&' => {
                    if self.eat('&') {
                        Token::new(TokenKind::AndAnd, "&&", loc)
                    } else {
                        return Err(SyntaxError::new("unexpected character '&'", loc));
                    }
                }
                '|' => {
                    if self.eat('|') {
                        Token::new(TokenKind::OrOr, "||", loc)
                    } else {
                        return Err(SyntaxError::new("unexpected character '|'", loc));
                    }
                }
                '#' => {
                    if self.eat('[') {
                        Token::new(TokenKind::AttrOpen, "#[", loc)
                    } else {
                        return Err(SyntaxError::new("unexpected character '#'", loc));
                    }
                }
                '@' => Token::new(TokenKind::At, "@", loc),
                '*' => Token::new(TokenKind::Star, "*", loc),
                '%' => Token::new(TokenKind::Percent, "%", loc),
                '.' => Token::new(TokenKind::Dot, ".", loc),
                ':' => Token::new(TokenKind::Colon, ":", loc),
                ',' => Token::new(TokenKind::Comma, ",", loc),
                '(' => Token::new(TokenKind::LParen, "(", loc),
                ')' => Token::new(TokenKind::RParen, ")", loc),
                '{' => Token::new(TokenKind::LBrace, "{", loc),
                '}' => Token::new(TokenKind::RBrace, "}", loc),
                '[' => Token::new(TokenKind::LBracket, "[", loc),
                ']' => Token::new(TokenKind::RBracket, "]", loc),
                c if c.is_ascii_digit() => {
                    let text = self.read_number(c);
                    Token::new(TokenKind::Number, text, loc)
                }
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let word = self.read_word(c);
                    match keyword_kind(&word) {
                        Some(kind) => Token::new(kind, word, loc),
                        None => Token::new(TokenKind::Ident, word, loc),
                    }
                }
                other => {
                    return Err(SyntaxError::new(
                        format!("unexpected character '{}'", other),
                        loc,
                    ));
                }
            };
            tokens.push(token);
        }

        tokens.push(Token::new(TokenKind::Eof, "", self.loc()));
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .expect("lex failed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_keywords_and_idents() {
        assert_eq!(
            kinds("let varx var"),
            vec![
                TokenKind::Let,
                TokenKind::Ident,
                TokenKind::Var,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_out_marker_vs_less_than() {
        assert_eq!(
            kinds("<: a < b <= c"),
            vec![
                TokenKind::Out,
                TokenKind::Ident,
                TokenKind::Lt,
                TokenKind::Ident,
                TokenKind::LtEq,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_attr_open_is_one_token() {
        assert_eq!(
            kinds("#[cache]"),
            vec![
                TokenKind::AttrOpen,
                TokenKind::Ident,
                TokenKind::RBracket,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_bare_hash_is_an_error() {
        let err = Lexer::new("# x").tokenize().unwrap_err();
        assert!(err.message.contains("unexpected character '#'"));
        assert_eq!(err.loc, Loc::new(1, 1));
    }

    #[test]
    fn test_compound_assignment_operators() {
        assert_eq!(
            kinds("x += 1\ny -= 2"),
            vec![
                TokenKind::Ident,
                TokenKind::PlusAssign,
                TokenKind::Number,
                TokenKind::NewLine,
                TokenKind::Ident,
                TokenKind::MinusAssign,
                TokenKind::Number,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_string_escapes_decoded() {
        let tokens = Lexer::new(r#""a\nb\"c""#).tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].text, "a\nb\"c");
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("\"oops").tokenize().unwrap_err();
        assert!(err.message.contains("unterminated string"));
    }

    #[test]
    fn test_number_with_decimal_point() {
        let tokens = Lexer::new("3.25 7. 4").tokenize().unwrap();
        assert_eq!(tokens[0].text, "3.25");
        // `7.` is a number followed by a dot, not a float literal.
        assert_eq!(tokens[1].kind, TokenKind::Number);
        assert_eq!(tokens[1].text, "7");
        assert_eq!(tokens[2].kind, TokenKind::Dot);
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("let x = 1 // trailing\n// whole line\nx"),
            vec![
                TokenKind::Let,
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::Number,
                TokenKind::NewLine,
                TokenKind::NewLine,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_locations_track_lines_and_columns() {
        let tokens = Lexer::new("let x\n  var y").tokenize().unwrap();
        assert_eq!(tokens[0].loc, Loc::new(1, 1));
        assert_eq!(tokens[1].loc, Loc::new(1, 5));
        assert_eq!(tokens[2].loc, Loc::new(1, 6)); // newline
        assert_eq!(tokens[3].loc, Loc::new(2, 3));
        assert_eq!(tokens[4].loc, Loc::new(2, 7));
    }

    #[test]
    fn test_eof_location_past_input() {
        let tokens = Lexer::new("ab").tokenize().unwrap();
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
        assert_eq!(tokens.last().unwrap().loc, Loc::new(1, 3));
    }
}
