//! Recursive descent parser for CQL
//!
//! # Grammar
//!
//! ```text
//! query     := clause (BOOLEAN modifiers clause)*
//! clause    := '(' query ')' | index relation modifiers term | term
//! relation  := COMPARATOR | WORD
//! modifiers := ('/' WORD (COMPARATOR value)?)*
//! term      := WORD | QUOTED
//! ```
//!
//! Booleans (`and`, `or`, `not`, `prox`) are case-insensitive and left
//! associative with equal precedence.

use super::ast::{BooleanOp, CqlNode, Modifier, Relation, SERVER_CHOICE, SERVER_CHOICE_RELATION};
use super::lexer::{Lexer, Token};
use crate::error::{Result, SearchError};

/// Relation words recognized without a context-set prefix
const RELATION_WORDS: &[&str] = &["any", "all", "exact", "within", "adj", "scr", "encloses"];

/// Parser for CQL query text
pub struct CqlParser {
    lexer: Lexer,
    current_token: Token,
}

impl CqlParser {
    /// Create a new parser for the given query text
    pub fn new(input: &str) -> Result<Self> {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token()?;
        Ok(Self {
            lexer,
            current_token,
        })
    }

    /// Parse query text into a tree
    pub fn parse(input: &str) -> Result<CqlNode> {
        Self::new(input)?.parse_query()
    }

    /// Parse the whole input
    pub fn parse_query(&mut self) -> Result<CqlNode> {
        if self.current_token == Token::Eof {
            return Err(SearchError::QueryParse("Empty query".to_string()));
        }

        let query = self.parse_boolean_expr()?;

        if self.current_token != Token::Eof {
            return Err(SearchError::QueryParse(format!(
                "Unexpected token after query: {:?}",
                self.current_token
            )));
        }

        Ok(query)
    }

    /// Parse: query := clause (BOOLEAN modifiers clause)*
    fn parse_boolean_expr(&mut self) -> Result<CqlNode> {
        let mut left = self.parse_clause()?;

        while let Some(op) = self.boolean_op() {
            self.advance()?;
            let modifiers = self.parse_modifiers()?;
            let right = self.parse_clause()?;
            left = CqlNode::Boolean {
                op,
                modifiers,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parse: clause := '(' query ')' | index relation modifiers term | term
    fn parse_clause(&mut self) -> Result<CqlNode> {
        match self.current_token.clone() {
            Token::LeftParen => {
                self.advance()?;
                let inner = self.parse_boolean_expr()?;
                self.expect(Token::RightParen)?;
                Ok(inner)
            }
            Token::Quoted(term) => {
                self.advance()?;
                Ok(CqlNode::server_choice(term))
            }
            Token::Word(word) => {
                self.advance()?;
                match self.current_token.clone() {
                    Token::Comparator(symbol) => {
                        self.advance()?;
                        self.parse_relation_tail(word, symbol)
                    }
                    Token::Word(next) if self.boolean_op().is_none() && is_relation_word(&next) => {
                        self.advance()?;
                        self.parse_relation_tail(word, next)
                    }
                    Token::Word(next) if self.boolean_op().is_none() => {
                        Err(SearchError::QueryParse(format!(
                            "Unknown relation '{}' after index '{}'",
                            next, word
                        )))
                    }
                    _ => Ok(CqlNode::Term {
                        qualifier: SERVER_CHOICE.to_string(),
                        relation: Relation::new(SERVER_CHOICE_RELATION),
                        term: word,
                    }),
                }
            }
            other => Err(SearchError::QueryParse(format!(
                "Expected a search clause, got {:?}",
                other
            ))),
        }
    }

    fn parse_relation_tail(&mut self, qualifier: String, base: String) -> Result<CqlNode> {
        let modifiers = self.parse_modifiers()?;
        let term = self.parse_term()?;
        Ok(CqlNode::Term {
            qualifier,
            relation: Relation { base, modifiers },
            term,
        })
    }

    /// Parse: modifiers := ('/' WORD (COMPARATOR value)?)*
    fn parse_modifiers(&mut self) -> Result<Vec<Modifier>> {
        let mut modifiers = Vec::new();
        while self.current_token == Token::Slash {
            self.advance()?;
            let name = match self.current_token.clone() {
                Token::Word(name) => name,
                other => {
                    return Err(SearchError::QueryParse(format!(
                        "Expected a modifier name, got {:?}",
                        other
                    )))
                }
            };
            self.advance()?;

            let mut modifier = Modifier::new(name);
            if let Token::Comparator(comparator) = self.current_token.clone() {
                self.advance()?;
                let value = self.parse_term()?;
                modifier = modifier.with_value(comparator, value);
            }
            modifiers.push(modifier);
        }
        Ok(modifiers)
    }

    fn parse_term(&mut self) -> Result<String> {
        match self.current_token.clone() {
            Token::Word(term) | Token::Quoted(term) => {
                self.advance()?;
                Ok(term)
            }
            other => Err(SearchError::QueryParse(format!(
                "Expected a search term, got {:?}",
                other
            ))),
        }
    }

    /// Boolean operator at the current token, if any
    fn boolean_op(&self) -> Option<BooleanOp> {
        match &self.current_token {
            Token::Word(word) => match BooleanOp::from_name(word) {
                BooleanOp::Other(_) => None,
                op => Some(op),
            },
            _ => None,
        }
    }

    /// Advance to the next token
    fn advance(&mut self) -> Result<()> {
        self.current_token = self.lexer.next_token()?;
        Ok(())
    }

    /// Expect a specific token and advance
    fn expect(&mut self, expected: Token) -> Result<()> {
        if std::mem::discriminant(&self.current_token) == std::mem::discriminant(&expected) {
            self.advance()
        } else {
            Err(SearchError::QueryParse(format!(
                "Expected {:?}, got {:?}",
                expected, self.current_token
            )))
        }
    }
}

/// Known relation words and any context-set prefixed name (`cql.within`)
fn is_relation_word(word: &str) -> bool {
    let lower = word.to_ascii_lowercase();
    RELATION_WORDS.contains(&lower.as_str()) || word.contains('.')
}
