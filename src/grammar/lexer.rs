use serde::Serialize;

use super::{END_MARK, IDENTIFIER, INTEGER_LITERAL, SPECIAL_TERMINALS};
use crate::error::LexError;
use crate::Grammar;

/// A lexed token. `kind` is what the grammar matches against (a terminal spelling, `<id>`,
/// `<i_lit>` or `<eof>`), `image` is the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: String,
    pub image: String,
}

impl Token {
    pub fn new(kind: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            image: image.into(),
        }
    }

    pub fn end_mark() -> Self {
        Self::new(END_MARK, END_MARK)
    }

    pub fn is_end_mark(&self) -> bool {
        self.kind == END_MARK
    }
}

fn lex_error(chars: &[char], start: usize, end: usize) -> LexError {
    let line = chars[..start].iter().filter(|&&c| c == '\n').count() + 1;
    let column = start
        - chars[..start]
            .iter()
            .rposition(|&c| c == '\n')
            .map_or(0, |p| p + 1)
        + 1;
    LexError {
        text: chars[start..end].iter().collect(),
        line,
        column,
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl Grammar {
    /// Splits `source` into tokens using this grammar's terminal spellings. Words that spell a
    /// terminal are keywords, other words are `<id>`, digit runs are `<i_lit>`, and anything
    /// else is matched against the terminals by longest prefix. Always ends with `<eof>`.
    pub fn tokenize(&self, source: &str) -> Result<Vec<Token>, LexError> {
        let literals: Vec<&str> = self
            .terminal_iter()
            .map(String::as_str)
            .filter(|t| !SPECIAL_TERMINALS.contains(t))
            .collect();

        let chars: Vec<char> = source.chars().collect();
        let mut tokens: Vec<Token> = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            let start = i;

            if c.is_whitespace() && !literals.iter().any(|t| t.starts_with(c)) {
                i += 1;
            } else if c.is_alphabetic() || c == '_' {
                while i < chars.len() && is_identifier_char(chars[i]) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                if literals.contains(&word.as_str()) {
                    tokens.push(Token::new(word.clone(), word));
                } else {
                    tokens.push(Token::new(IDENTIFIER, word));
                }
            } else if c.is_ascii_digit() {
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                if i < chars.len() && chars[i].is_alphabetic() {
                    while i < chars.len() && is_identifier_char(chars[i]) {
                        i += 1;
                    }
                    return Err(lex_error(&chars, start, i));
                }
                tokens.push(Token::new(
                    INTEGER_LITERAL,
                    chars[start..i].iter().collect::<String>(),
                ));
            } else {
                let mut current = String::new();
                let mut matched: Option<usize> = None;
                while i < chars.len() {
                    let mut candidate = current.clone();
                    candidate.push(chars[i]);
                    if !literals.iter().any(|t| t.starts_with(candidate.as_str())) {
                        break;
                    }
                    current = candidate;
                    i += 1;
                    if literals.contains(&current.as_str()) {
                        matched = Some(i);
                    }
                }

                match matched {
                    Some(end) => {
                        let image: String = chars[start..end].iter().collect();
                        tokens.push(Token::new(image.clone(), image));
                        i = end;
                    }
                    None => return Err(lex_error(&chars, start, i.max(start + 1))),
                }
            }
        }

        tokens.push(Token::end_mark());
        log::debug!("lexed {} tokens", tokens.len());
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use crate::Grammar;

    fn kinds(grammar: &Grammar, source: &str) -> Vec<String> {
        grammar
            .tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn keywords_identifiers_and_numbers() {
        let g = Grammar::parse("<s> ::= \"read\" \"<id>\" | \"write\" \"<i_lit>\"").unwrap();
        let tokens = g.tokenize("read reader\nwrite 42").unwrap();

        assert_eq!(
            tokens.iter().map(|t| t.kind.as_str()).collect::<Vec<_>>(),
            vec!["read", "<id>", "write", "<i_lit>", "<eof>"]
        );
        assert_eq!(tokens[1].image, "reader");
        assert_eq!(tokens[3].image, "42");
    }

    #[test]
    fn longest_operator_wins() {
        let g = Grammar::parse(
            "<c> ::= \"<id>\" <ro> \"<id>\"\n<ro> ::= \"<\" | \"<=\" | \"<>\" | \":=\"",
        )
        .unwrap();

        assert_eq!(
            kinds(&g, "a<=b a<b a<>b a:=b"),
            vec![
                "<id>", "<=", "<id>", "<id>", "<", "<id>", "<id>", "<>", "<id>", "<id>", ":=",
                "<id>", "<eof>"
            ]
        );
    }

    #[test]
    fn partial_operator_is_an_error() {
        let g = Grammar::parse("<s> ::= \"<id>\" \":=\" \"<id>\"").unwrap();
        let err = g.tokenize("a :\n b").unwrap_err();

        assert_eq!(err.text, ":");
        assert_eq!((err.line, err.column), (1, 3));
    }

    #[test]
    fn unknown_character_is_an_error() {
        let g = Grammar::parse("<s> ::= \"<id>\"").unwrap();
        let err = g.tokenize("x\n  $").unwrap_err();

        assert_eq!(err.text, "$");
        assert_eq!((err.line, err.column), (2, 3));
    }

    #[test]
    fn number_followed_by_letter_is_an_error() {
        let g = Grammar::parse("<s> ::= \"<i_lit>\"").unwrap();
        let err = g.tokenize("12ab").unwrap_err();

        assert_eq!(err.text, "12ab");
    }

    #[test]
    fn newline_terminal_is_not_skipped() {
        let g = Grammar::parse("<s> ::= \"<id>\" \"\\n\" \"<id>\"").unwrap();

        assert_eq!(kinds(&g, "a\nb"), vec!["<id>", "\n", "<id>", "<eof>"]);
    }

    #[test]
    fn empty_source_is_just_eof() {
        let g = Grammar::parse("<s> ::= \"\"").unwrap();

        assert_eq!(kinds(&g, "   "), vec!["<eof>"]);
    }
}
