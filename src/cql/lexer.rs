//! Lexer for CQL query text

use crate::error::{Result, SearchError};

/// Token types for CQL parsing
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Unquoted word: an index, relation, boolean or term
    Word(String),
    /// Double-quoted term
    Quoted(String),
    /// Relation or modifier comparator symbol
    Comparator(String),
    /// Modifier introducer
    Slash,
    LeftParen,
    RightParen,
    /// End of input
    Eof,
}

/// Lexer for tokenizing CQL query text
pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    /// Create a new lexer for the given input string
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        let ch = match self.current_char() {
            Some(ch) => ch,
            None => return Ok(Token::Eof),
        };

        match ch {
            '(' => {
                self.advance();
                Ok(Token::LeftParen)
            }
            ')' => {
                self.advance();
                Ok(Token::RightParen)
            }
            '/' => {
                self.advance();
                Ok(Token::Slash)
            }
            '"' => {
                self.advance();
                self.read_quoted_string()
            }
            '=' | '<' | '>' => Ok(self.read_comparator(ch)),
            _ => Ok(self.read_word()),
        }
    }

    fn read_comparator(&mut self, first: char) -> Token {
        self.advance();
        let second = self.current_char();
        let symbol = match (first, second) {
            ('=', Some('=')) | ('<', Some('=')) | ('>', Some('=')) | ('<', Some('>')) => {
                self.advance();
                let mut symbol = first.to_string();
                if let Some(second) = second {
                    symbol.push(second);
                }
                symbol
            }
            _ => first.to_string(),
        };
        Token::Comparator(symbol)
    }

    fn read_word(&mut self) -> Token {
        let mut word = String::new();
        while let Some(ch) = self.current_char() {
            if Self::is_word_char(ch) {
                word.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        Token::Word(word)
    }

    fn read_quoted_string(&mut self) -> Result<Token> {
        let mut s = String::new();

        while let Some(ch) = self.current_char() {
            self.advance();
            match ch {
                '"' => return Ok(Token::Quoted(s)),
                '\\' => match self.current_char() {
                    Some(escaped @ ('"' | '\\')) => {
                        s.push(escaped);
                        self.advance();
                    }
                    // other escapes are kept for the compiler (masking characters)
                    _ => s.push('\\'),
                },
                _ => s.push(ch),
            }
        }

        Err(SearchError::QueryParse(
            "Unterminated quoted string".to_string(),
        ))
    }

    fn is_word_char(ch: char) -> bool {
        !ch.is_whitespace() && !matches!(ch, '(' | ')' | '=' | '<' | '>' | '/' | '"')
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().map(char::is_whitespace).unwrap_or(false) {
            self.advance();
        }
    }
}
