extern crate wasm_bindgen;

use serde_json::json;
use wasm_bindgen::prelude::*;

pub mod error;
pub mod grammar;
pub mod parser;
pub mod tree;

pub use error::{Error, GrammarError, LexError};
pub use grammar::{Grammar, Token};
pub use parser::{
    Highlight, LL1Parser, Parser, RecursiveDescentParser, SLRParser, Snapshot, Status,
};
pub use tree::{NodeId, NodeKind, ParseTree};

fn error_json(e: impl std::fmt::Display) -> String {
    json!({ "error": e.to_string() }).to_string()
}

fn to_json(value: &impl serde::Serialize) -> String {
    serde_json::to_string(value).unwrap_or_else(error_json)
}

#[wasm_bindgen]
pub fn nullable_first_follow_to_json(grammar: &str) -> String {
    match Grammar::parse(grammar) {
        Ok(g) => g.to_non_terminal_output_vec().to_json(),
        Err(e) => error_json(e),
    }
}

#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    RecursiveDescent,
    LL1,
    SLR,
}

impl Strategy {
    pub fn build(self, grammar: Grammar) -> Box<dyn Parser> {
        match self {
            Strategy::RecursiveDescent => Box::new(RecursiveDescentParser::new(grammar)),
            Strategy::LL1 => Box::new(LL1Parser::new(grammar)),
            Strategy::SLR => Box::new(SLRParser::new(grammar)),
        }
    }

    /// Parses the grammar, builds the engine and lexes the source.
    pub fn load(self, description: &str, source: &str) -> Result<Box<dyn Parser>, Error> {
        let mut parser = self.build(Grammar::parse(description)?);
        parser.load_input(source)?;
        Ok(parser)
    }

    /// Conflicts of the table this strategy parses with.
    pub fn conflicts(self, g: &Grammar) -> Vec<String> {
        match self {
            Strategy::RecursiveDescent | Strategy::LL1 => g
                .generate_ll1_parsing_table()
                .conflicts
                .iter()
                .map(|c| c.to_plaintext(g))
                .collect(),
            Strategy::SLR => g
                .generate_slr_parsing_table()
                .conflicts
                .iter()
                .map(|c| c.to_plaintext(g))
                .collect(),
        }
    }
}

/// One engine driven from JavaScript. Every method answers with a JSON string; failures
/// come back as `{"error": "..."}`.
#[wasm_bindgen]
pub struct Session {
    strategy: Strategy,
    engine: Option<Box<dyn Parser>>,
}

#[wasm_bindgen]
impl Session {
    #[wasm_bindgen(constructor)]
    pub fn new(strategy: Strategy) -> Session {
        Session {
            strategy,
            engine: None,
        }
    }

    /// Answers with the numbered production listing and the table conflicts.
    pub fn load_grammar(&mut self, description: &str) -> String {
        let result = match self.engine.as_mut() {
            Some(engine) => engine.load_grammar(description),
            None => Grammar::parse(description).map(|g| {
                self.engine = Some(self.strategy.build(g));
            }),
        };
        if let Err(e) = result {
            return error_json(e);
        }

        match self.engine.as_ref() {
            Some(engine) => {
                let g = engine.grammar();
                json!({
                    "productions": g.to_production_output_vec().lines(),
                    "conflicts": self.strategy.conflicts(g),
                })
                .to_string()
            }
            None => error_json("no grammar loaded"),
        }
    }

    pub fn load_input(&mut self, source: &str) -> String {
        match self.engine.as_mut() {
            Some(engine) => match engine.load_input(source) {
                Ok(()) => to_json(&engine.snapshot()),
                Err(e) => error_json(e),
            },
            None => error_json("no grammar loaded"),
        }
    }

    pub fn step(&mut self) -> String {
        match self.engine.as_mut() {
            Some(engine) => {
                engine.step();
                to_json(&engine.snapshot())
            }
            None => error_json("no grammar loaded"),
        }
    }

    pub fn reset(&mut self) -> String {
        match self.engine.as_mut() {
            Some(engine) => {
                engine.reset();
                to_json(&engine.snapshot())
            }
            None => error_json("no grammar loaded"),
        }
    }

    pub fn snapshot(&self) -> String {
        match self.engine.as_ref() {
            Some(engine) => to_json(&engine.snapshot()),
            None => error_json("no grammar loaded"),
        }
    }
}

#[cfg(test)]
mod parse_tests {
    use crate::error::{GrammarError, SyntaxErrorKind};
    use crate::grammar::Symbol;

    #[test]
    fn simple_parse() {
        let g = crate::Grammar::parse("<S> ::= \"a\"").unwrap();

        let s = g.get_non_terminal_index("S").unwrap();
        let a = g.get_terminal_index("a").unwrap();

        assert_eq!(g.get_symbol_name(Symbol::NonTerminal(s)), "S");
        assert_eq!(g.get_symbol_name(Symbol::Terminal(a)), "a");
        assert_eq!(g.terminals, vec!["a", "<eof>"]);
        assert_eq!(g.non_terminals[s].productions[0], vec![Symbol::Terminal(a)]);
    }

    #[test]
    fn simple_parse_with_space() {
        let g = crate::Grammar::parse("  <S>   ::=  \"a\"   ").unwrap();

        let s = g.get_non_terminal_index("S").unwrap();
        let a = g.get_terminal_index("a").unwrap();

        assert_eq!(g.non_terminals[s].productions[0], vec![Symbol::Terminal(a)]);
    }

    #[test]
    fn simple_parse_with_space_and_newline() {
        let g = crate::Grammar::parse("  <S> ::= \"a\" \n | \"b\" <c>\n<c> ::= \"c\"").unwrap();

        let s = g.get_non_terminal_index("S").unwrap();
        let c = g.get_non_terminal_index("c").unwrap();
        let a = g.get_terminal_index("a").unwrap();
        let b = g.get_terminal_index("b").unwrap();

        assert_eq!(g.start_symbol, s);
        assert_eq!(g.non_terminals[s].productions[0], vec![Symbol::Terminal(a)]);
        assert_eq!(
            g.non_terminals[s].productions[1],
            vec![Symbol::Terminal(b), Symbol::NonTerminal(c)]
        );
    }

    #[test]
    fn comments_epsilon_and_special_terminals() {
        let g = crate::Grammar::parse(
            "; statements\n<list> ::= <stmt> <list> | \"\" ; may be empty\n<stmt> ::= \"read\" <id>\n<list> ::= \";\"",
        )
        .unwrap();

        assert_eq!(g.terminals, vec![";", "read", "<id>", "<eof>"]);
        assert_eq!(g.non_terminals[0].productions.len(), 3);
        assert!(g.non_terminals[0].productions[1].is_empty());
        assert!(g.non_terminals[0].nullable);
    }

    #[test]
    fn empty_parse() {
        assert_eq!(crate::Grammar::parse("  \n  ").unwrap_err(), GrammarError::Empty);
    }

    #[test]
    fn undefined_rule() {
        assert_eq!(
            crate::Grammar::parse("<s> ::= <t>").unwrap_err(),
            GrammarError::UndefinedRule {
                rule: "s".to_string(),
                name: "t".to_string()
            }
        );
    }

    #[test]
    #[should_panic]
    fn missing_separator() {
        let _g = crate::Grammar::parse("<s> := \"a\"").unwrap();
    }

    #[test]
    fn no_left_parse() {
        assert_eq!(
            crate::Grammar::parse("::= \"a\"").unwrap_err(),
            GrammarError::Syntax {
                line: 1,
                column: 1,
                kind: SyntaxErrorKind::RuleStart
            }
        );
    }

    #[test]
    fn no_previous_left_parse() {
        assert_eq!(
            crate::Grammar::parse("| \"a\"\n<S> ::= \"a\"").unwrap_err(),
            GrammarError::Syntax {
                line: 1,
                column: 1,
                kind: SyntaxErrorKind::DanglingAlternative
            }
        );
    }

    #[test]
    fn bad_symbol_char() {
        assert_eq!(
            crate::Grammar::parse("<s> ::= <a b>").unwrap_err(),
            GrammarError::Syntax {
                line: 1,
                column: 11,
                kind: SyntaxErrorKind::SymbolChar
            }
        );
    }

    #[test]
    fn unterminated_literal() {
        assert!(matches!(
            crate::Grammar::parse("<s> ::= \"a\n").unwrap_err(),
            GrammarError::Syntax {
                line: 1,
                kind: SyntaxErrorKind::UnterminatedLiteral,
                ..
            }
        ));
        assert!(matches!(
            crate::Grammar::parse("<s> ::= \"a").unwrap_err(),
            GrammarError::Syntax {
                kind: SyntaxErrorKind::UnterminatedLiteral,
                ..
            }
        ));
    }

    #[test]
    fn incomplete_definition() {
        assert!(matches!(
            crate::Grammar::parse("<s> ::").unwrap_err(),
            GrammarError::Syntax {
                kind: SyntaxErrorKind::Incomplete,
                ..
            }
        ));
    }
}
