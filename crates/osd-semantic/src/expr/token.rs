//! Lexer for rule expressions

use super::ExprError;

/// A single lexical token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),

    True,
    False,
    None,

    And,
    Or,
    Not,
    In,

    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
}

/// Tokenize an expression source string.
///
/// Characters outside the rule grammar (`.` between identifiers, `=`
/// alone, `&`, `|`, `;`, backticks) are lexical errors, which is what
/// rejects attribute access and assignment before parsing even starts.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            ' ' | '\t' | '\r' | '\n' => {
                chars.next();
            }
            '0'..='9' => {
                tokens.push(lex_number(source, &mut chars)?);
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let mut end = start;
                while let Some(&(i, ch)) = chars.peek() {
                    if ch.is_ascii_alphanumeric() || ch == '_' {
                        end = i + ch.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(keyword_or_ident(&source[start..end]));
            }
            '\'' | '"' => {
                tokens.push(lex_string(&mut chars, c)?);
            }
            '<' => {
                chars.next();
                tokens.push(two_char(&mut chars, '=', Token::Le, Token::Lt));
            }
            '>' => {
                chars.next();
                tokens.push(two_char(&mut chars, '=', Token::Ge, Token::Gt));
            }
            '=' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '='))) {
                    chars.next();
                    tokens.push(Token::Eq);
                } else {
                    return Err(ExprError::Syntax(
                        "assignment is not allowed in rule expressions".to_string(),
                    ));
                }
            }
            '!' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '='))) {
                    chars.next();
                    tokens.push(Token::Ne);
                } else {
                    return Err(ExprError::Syntax("unexpected character '!'".to_string()));
                }
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '%' => {
                chars.next();
                tokens.push(Token::Percent);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '[' => {
                chars.next();
                tokens.push(Token::LBracket);
            }
            ']' => {
                chars.next();
                tokens.push(Token::RBracket);
            }
            '{' => {
                chars.next();
                tokens.push(Token::LBrace);
            }
            '}' => {
                chars.next();
                tokens.push(Token::RBrace);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            ':' => {
                chars.next();
                tokens.push(Token::Colon);
            }
            other => {
                return Err(ExprError::Syntax(format!(
                    "unexpected character '{}'",
                    other
                )));
            }
        }
    }

    Ok(tokens)
}

fn keyword_or_ident(word: &str) -> Token {
    match word {
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        "in" => Token::In,
        "True" => Token::True,
        "False" => Token::False,
        "None" => Token::None,
        _ => Token::Ident(word.to_string()),
    }
}

fn lex_number(
    source: &str,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
) -> Result<Token, ExprError> {
    let start = chars.peek().map(|&(i, _)| i).unwrap_or(0);
    let mut end = start;
    let mut is_float = false;

    while let Some(&(i, ch)) = chars.peek() {
        match ch {
            '0'..='9' => {
                end = i + 1;
                chars.next();
            }
            '.' if !is_float => {
                is_float = true;
                end = i + 1;
                chars.next();
            }
            'e' | 'E' => {
                is_float = true;
                end = i + 1;
                chars.next();
                if let Some(&(j, sign)) = chars.peek() {
                    if sign == '+' || sign == '-' {
                        end = j + 1;
                        chars.next();
                    }
                }
            }
            _ => break,
        }
    }

    let text = &source[start..end];
    if is_float {
        text.parse::<f64>()
            .map(Token::Float)
            .map_err(|_| ExprError::Syntax(format!("invalid number '{}'", text)))
    } else {
        text.parse::<i64>()
            .map(Token::Int)
            .map_err(|_| ExprError::Syntax(format!("invalid number '{}'", text)))
    }
}

fn lex_string(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    quote: char,
) -> Result<Token, ExprError> {
    chars.next(); // opening quote
    let mut text = String::new();
    loop {
        match chars.next() {
            Some((_, ch)) if ch == quote => return Ok(Token::Str(text)),
            Some((_, '\\')) => match chars.next() {
                Some((_, 'n')) => text.push('\n'),
                Some((_, 't')) => text.push('\t'),
                Some((_, '\\')) => text.push('\\'),
                Some((_, ch)) if ch == quote => text.push(ch),
                Some((_, other)) => {
                    text.push('\\');
                    text.push(other);
                }
                None => return Err(ExprError::Syntax("unterminated string".to_string())),
            },
            Some((_, ch)) => text.push(ch),
            None => return Err(ExprError::Syntax("unterminated string".to_string())),
        }
    }
}

fn two_char(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    follow: char,
    matched: Token,
    single: Token,
) -> Token {
    if matches!(chars.peek(), Some(&(_, ch)) if ch == follow) {
        chars.next();
        matched
    } else {
        single
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operators_and_idents() {
        let tokens = tokenize("0 < len(receptor_ids) <= number_ska_dishes").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Int(0),
                Token::Lt,
                Token::Ident("len".to_string()),
                Token::LParen,
                Token::Ident("receptor_ids".to_string()),
                Token::RParen,
                Token::Le,
                Token::Ident("number_ska_dishes".to_string()),
            ]
        );
    }

    #[test]
    fn test_keywords() {
        let tokens = tokenize("x in y and not True or None").unwrap();
        assert!(tokens.contains(&Token::In));
        assert!(tokens.contains(&Token::And));
        assert!(tokens.contains(&Token::Not));
        assert!(tokens.contains(&Token::Or));
        assert!(tokens.contains(&Token::True));
        assert!(tokens.contains(&Token::None));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(tokenize("42").unwrap(), vec![Token::Int(42)]);
        assert_eq!(tokenize("1.5").unwrap(), vec![Token::Float(1.5)]);
        assert_eq!(tokenize("3.5e9").unwrap(), vec![Token::Float(3.5e9)]);
        assert_eq!(tokenize("1e-3").unwrap(), vec![Token::Float(1e-3)]);
    }

    #[test]
    fn test_strings_both_quotes() {
        assert_eq!(
            tokenize("'Band_1'").unwrap(),
            vec![Token::Str("Band_1".to_string())]
        );
        assert_eq!(
            tokenize("\"Band_2\"").unwrap(),
            vec![Token::Str("Band_2".to_string())]
        );
    }

    #[test]
    fn test_lone_equals_rejected() {
        assert!(matches!(tokenize("x = 1"), Err(ExprError::Syntax(_))));
    }

    #[test]
    fn test_dot_outside_number_rejected() {
        assert!(matches!(tokenize("x.y"), Err(ExprError::Syntax(_))));
    }
}
