use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("rules must start with '<'")]
    RuleStart,
    #[error("symbols can only contain letters, digits, '_' or '-'")]
    SymbolChar,
    #[error("symbol names cannot be empty")]
    EmptyName,
    #[error("rule name must be followed by '::='")]
    Separator,
    #[error("symbol must begin with '<' or '\"'")]
    ItemStart,
    #[error("unterminated string literal")]
    UnterminatedLiteral,
    #[error("'|' continuation without a preceding rule")]
    DanglingAlternative,
    #[error("grammar definition is incomplete")]
    Incomplete,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("line {line}, column {column}: {kind}")]
    Syntax {
        line: usize,
        column: usize,
        kind: SyntaxErrorKind,
    },
    #[error("rule <{rule}> refers to undefined rule <{name}>")]
    UndefinedRule { rule: String, name: String },
    #[error("grammar has no rules")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}, column {column}: cannot match \"{text}\"")]
pub struct LexError {
    pub text: String,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("grammar error: {0}")]
    Grammar(#[from] GrammarError),
    #[error("lexer error: {0}")]
    Lex(#[from] LexError),
}
