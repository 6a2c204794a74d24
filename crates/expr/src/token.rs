// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Expression lexer

use weft_core::ExpressionError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    True,
    False,
    Null,
    // Punctuation and operators
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Colon,
    Question,
    Pipe,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Bang,
}

/// Tokenize an expression source string.
pub fn tokenize(src: &str) -> Result<Vec<Token>, ExpressionError> {
    let mut tokens = Vec::new();
    let bytes = src.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            '{' => {
                tokens.push(Token::LBrace);
                i += 1;
            }
            '}' => {
                tokens.push(Token::RBrace);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            ':' => {
                tokens.push(Token::Colon);
                i += 1;
            }
            '?' => {
                tokens.push(Token::Question);
                i += 1;
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '=' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::EqEq);
                    i += 2;
                } else {
                    return Err(ExpressionError::parse(excerpt(src, i)));
                }
            }
            '!' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::NotEq);
                    i += 2;
                } else {
                    tokens.push(Token::Bang);
                    i += 1;
                }
            }
            '<' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::Le);
                    i += 2;
                } else {
                    tokens.push(Token::Lt);
                    i += 1;
                }
            }
            '>' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::Ge);
                    i += 2;
                } else {
                    tokens.push(Token::Gt);
                    i += 1;
                }
            }
            '&' => {
                if bytes.get(i + 1) == Some(&b'&') {
                    tokens.push(Token::AndAnd);
                    i += 2;
                } else {
                    return Err(ExpressionError::parse(excerpt(src, i)));
                }
            }
            '|' => {
                if bytes.get(i + 1) == Some(&b'|') {
                    tokens.push(Token::OrOr);
                    i += 2;
                } else {
                    tokens.push(Token::Pipe);
                    i += 1;
                }
            }
            '"' | '\'' => {
                let (s, consumed) = lex_string(src, i, c)?;
                tokens.push(Token::Str(s));
                i += consumed;
            }
            '0'..='9' => {
                let (n, consumed) = lex_number(src, i)?;
                tokens.push(Token::Number(n));
                i += consumed;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < bytes.len() {
                    let c = bytes[i] as char;
                    if c.is_ascii_alphanumeric() || c == '_' {
                        i += 1;
                    } else {
                        break;
                    }
                }
                let word = &src[start..i];
                tokens.push(match word {
                    "true" => Token::True,
                    "false" => Token::False,
                    "null" => Token::Null,
                    _ => Token::Ident(word.to_string()),
                });
            }
            _ => return Err(ExpressionError::parse(excerpt(src, i))),
        }
    }

    Ok(tokens)
}

/// Lex a quoted string with `\` escapes; returns (content, bytes consumed).
fn lex_string(src: &str, start: usize, quote: char) -> Result<(String, usize), ExpressionError> {
    let bytes = src.as_bytes();
    let mut out = String::new();
    let mut i = start + 1;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c == quote {
            return Ok((out, i - start + 1));
        }
        if c == '\\' {
            let next = bytes.get(i + 1).map(|b| *b as char);
            match next {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some(c @ ('\\' | '"' | '\'')) => out.push(c),
                _ => return Err(ExpressionError::parse(excerpt(src, i))),
            }
            i += 2;
            continue;
        }
        // Multibyte pass-through
        let ch_len = src[i..].chars().next().map(|c| c.len_utf8()).unwrap_or(1);
        out.push_str(&src[i..i + ch_len]);
        i += ch_len;
    }
    Err(ExpressionError::parse("unterminated string"))
}

/// Lex a number literal (integer or decimal); returns (value, bytes consumed).
fn lex_number(src: &str, start: usize) -> Result<(f64, usize), ExpressionError> {
    let bytes = src.as_bytes();
    let mut i = start;
    let mut seen_dot = false;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_ascii_digit() {
            i += 1;
        } else if c == '.' && !seen_dot && bytes.get(i + 1).is_some_and(|b| b.is_ascii_digit()) {
            seen_dot = true;
            i += 1;
        } else {
            break;
        }
    }
    let text = &src[start..i];
    text.parse()
        .map(|n| (n, i - start))
        .map_err(|_| ExpressionError::parse(excerpt(src, start)))
}

/// A short source excerpt around an offending position.
pub(crate) fn excerpt(src: &str, at: usize) -> String {
    let end = (at + 24).min(src.len());
    let mut s = at;
    while s > 0 && !src.is_char_boundary(s) {
        s -= 1;
    }
    let mut e = end;
    while e < src.len() && !src.is_char_boundary(e) {
        e += 1;
    }
    src[s..e].to_string()
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
