pub mod ll1;
pub mod recursive_descent;
pub mod slr;

use std::collections::VecDeque;

use serde::Serialize;

use crate::error::{GrammarError, LexError};
use crate::grammar::{Token, END_MARK};
use crate::tree::{NodeId, NodeView, ParseTree};
use crate::Grammar;

pub use ll1::LL1Parser;
pub use recursive_descent::RecursiveDescentParser;
pub use slr::SLRParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Running,
    Accepted,
    Rejected,
}

impl Status {
    pub fn is_finished(&self) -> bool {
        *self != Status::Running
    }
}

/// What the last step touched. `line` indexes the grammar listing (table engines) or the
/// procedure listing (recursive descent); `cell` is a `(row, column)` of the parsing table.
/// Never read by the engines themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Highlight {
    pub line: Option<usize>,
    pub cell: Option<(usize, usize)>,
}

/// State every engine owns: the grammar, the lexed source, the remaining input and the tree.
#[derive(Debug, Clone)]
pub struct ParserCore {
    pub grammar: Grammar,
    tokens: Vec<Token>,
    pub input: VecDeque<Token>,
    pub tree: ParseTree,
    pub current: Option<NodeId>,
    pub status: Status,
    pub highlight: Highlight,
}

impl ParserCore {
    pub fn new(grammar: Grammar) -> Self {
        Self {
            grammar,
            tokens: Vec::new(),
            input: VecDeque::new(),
            tree: ParseTree::new(),
            current: None,
            status: Status::Running,
            highlight: Highlight::default(),
        }
    }

    pub fn set_tokens(&mut self, tokens: Vec<Token>) {
        self.tokens = tokens;
        self.reset();
    }

    /// Fresh tree, original token stream.
    pub fn reset(&mut self) {
        self.input = self.tokens.iter().cloned().collect();
        self.tree = ParseTree::new();
        self.current = None;
        self.status = Status::Running;
        self.highlight = Highlight::default();
    }

    /// Kind of the next token; exhausted input reads as `<eof>`.
    pub fn lookahead(&self) -> &str {
        self.input.front().map_or(END_MARK, |t| t.kind.as_str())
    }

    pub fn lookahead_terminal(&self) -> Option<usize> {
        self.grammar.get_terminal_index(self.lookahead())
    }

    pub fn advance(&mut self) -> Option<Token> {
        self.input.pop_front()
    }

    /// Nothing but `<eof>` (or nothing at all) left to read.
    pub fn at_end(&self) -> bool {
        self.input.iter().all(|t| t.is_end_mark())
    }

    /// Attaches an `ERROR` node under `parent` and stops the parse.
    pub fn reject(&mut self, parent: NodeId) -> Status {
        let error = self.tree.add_error(parent);
        log::debug!("parse error under {}", self.tree.name(parent));
        self.current = Some(error);
        self.status = Status::Rejected;
        self.status
    }

    pub fn accept(&mut self, node: NodeId) -> Status {
        log::debug!("accepted: {}", self.tree.to_bracketed(node));
        self.current = Some(node);
        self.status = Status::Accepted;
        self.status
    }

    pub fn input_to_string(&self) -> String {
        self.input
            .iter()
            .map(|t| t.image.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Everything a front-end reads after a step.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub status: Status,
    pub tree: Option<NodeView>,
    pub current: Option<NodeId>,
    pub stack: Vec<NodeId>,
    pub stack_line: String,
    pub input_line: String,
    pub highlight: Highlight,
}

pub trait Parser {
    fn core(&self) -> &ParserCore;
    fn core_mut(&mut self) -> &mut ParserCore;

    /// Replaces the grammar and every table derived from it. The token stream is dropped.
    fn set_grammar(&mut self, grammar: Grammar);

    /// One unit of work. Once the parse is finished this returns the final status and
    /// changes nothing until [`Parser::reset`].
    fn step(&mut self) -> Status;

    /// Clears the engine's stack; the core is reset by [`Parser::reset`].
    fn clear_stack(&mut self);

    /// Tree nodes held by the parse stack, bottom first.
    fn stack_nodes(&self) -> Vec<NodeId>;

    fn stack_to_string(&self) -> String;

    /// On error the current grammar and tables stay in place.
    fn load_grammar(&mut self, description: &str) -> Result<(), GrammarError> {
        let grammar = Grammar::parse(description)?;
        self.set_grammar(grammar);
        Ok(())
    }

    /// On error the engine keeps its previous input, tree and stack.
    fn load_input(&mut self, source: &str) -> Result<(), LexError> {
        let tokens = self.core().grammar.tokenize(source)?;
        self.core_mut().set_tokens(tokens);
        self.clear_stack();
        Ok(())
    }

    fn reset(&mut self) {
        self.core_mut().reset();
        self.clear_stack();
    }

    fn grammar(&self) -> &Grammar {
        &self.core().grammar
    }

    fn tree(&self) -> &ParseTree {
        &self.core().tree
    }

    fn current_node(&self) -> Option<NodeId> {
        self.core().current
    }

    fn status(&self) -> Status {
        self.core().status
    }

    fn highlight(&self) -> Highlight {
        self.core().highlight
    }

    fn input_to_string(&self) -> String {
        self.core().input_to_string()
    }

    /// Steps until the parse finishes or `max_steps` steps were taken.
    fn run(&mut self, max_steps: usize) -> Status {
        for _ in 0..max_steps {
            if self.step().is_finished() {
                break;
            }
        }
        self.status()
    }

    fn snapshot(&self) -> Snapshot {
        let tree = self.tree();
        Snapshot {
            status: self.status(),
            tree: tree.root().map(|root| tree.view(root)),
            current: self.current_node(),
            stack: self.stack_nodes(),
            stack_line: self.stack_to_string(),
            input_line: self.input_to_string(),
            highlight: self.highlight(),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::{LL1Parser, Parser, RecursiveDescentParser, SLRParser, Status};
    use crate::tree::{NodeKind, ERROR_NODE};
    use crate::Grammar;

    const EXPRESSIONS: &str = r#"
<expr> ::= <term> <expr_tail>
<expr_tail> ::= "+" <term> <expr_tail> | ""
<term> ::= "<i_lit>" | "<id>" | "(" <expr> ")"
"#;

    fn engine(strategy: &str, grammar: &str) -> Box<dyn Parser> {
        let _ = env_logger::builder().is_test(true).try_init();
        let g = Grammar::parse(grammar).unwrap();
        match strategy {
            "rd" => Box::new(RecursiveDescentParser::new(g)),
            "ll1" => Box::new(LL1Parser::new(g)),
            _ => Box::new(SLRParser::new(g)),
        }
    }

    fn parse(strategy: &str, grammar: &str, source: &str) -> Box<dyn Parser> {
        let mut p = engine(strategy, grammar);
        p.load_input(source).unwrap();
        p.run(10_000);
        p
    }

    fn accepted_tree(p: &dyn Parser) -> String {
        assert_eq!(p.status(), Status::Accepted);
        p.tree().to_bracketed(p.current_node().unwrap())
    }

    #[rstest]
    #[case("rd")]
    #[case("ll1")]
    #[case("slr")]
    fn missing_identifier_is_rejected(#[case] strategy: &str) {
        let p = parse(strategy, r#"<s> ::= "read" "<id>""#, "read");
        let tree = p.tree();

        assert_eq!(p.status(), Status::Rejected);
        assert_eq!(tree.name(p.current_node().unwrap()), ERROR_NODE);
        assert_eq!(tree.kind(p.current_node().unwrap()), NodeKind::Error);
        assert_eq!(tree.yield_of(0), vec!["read"]);
        assert!(p.input_to_string().ends_with("<eof>"));
    }

    #[rstest]
    #[case("rd")]
    #[case("ll1")]
    #[case("slr")]
    fn expression_tree(#[case] strategy: &str) {
        let p = parse(strategy, EXPRESSIONS, "1 + (x)");

        assert_eq!(
            accepted_tree(p.as_ref()),
            "expr[term[1] expr_tail[+ term[( expr[term[x] expr_tail[]] )] expr_tail[]]]"
        );
    }

    #[rstest]
    #[case("rd")]
    #[case("ll1")]
    #[case("slr")]
    fn empty_input_on_nullable_start(#[case] strategy: &str) {
        let p = parse(strategy, r#"<s> ::= "a" <s> | """#, "");
        assert_eq!(accepted_tree(p.as_ref()), "s[]");

        let p = parse(strategy, r#"<s> ::= "a" <s> | """#, "a a");
        assert_eq!(accepted_tree(p.as_ref()), "s[a s[a s[]]]");
    }

    #[rstest]
    #[case("rd")]
    #[case("ll1")]
    #[case("slr")]
    fn trailing_input_is_rejected(#[case] strategy: &str) {
        let p = parse(strategy, EXPRESSIONS, "1 2");
        assert_eq!(p.status(), Status::Rejected);
    }

    #[rstest]
    #[case("rd")]
    #[case("ll1")]
    #[case("slr")]
    fn reset_restores_original_tokens(#[case] strategy: &str) {
        let mut p = engine(strategy, EXPRESSIONS);
        p.load_input("1 + 2").unwrap();
        let before = p.input_to_string();

        for _ in 0..5 {
            p.step();
        }
        assert_ne!(p.input_to_string(), before);

        p.reset();
        assert_eq!(p.input_to_string(), before);
        assert!(p.tree().is_empty());
        assert!(p.stack_nodes().is_empty());
        assert_eq!(p.status(), Status::Running);
    }

    #[rstest]
    #[case("rd")]
    #[case("ll1")]
    #[case("slr")]
    fn finished_engine_ignores_steps(#[case] strategy: &str) {
        let mut p = parse(strategy, r#"<s> ::= "read" "<id>""#, "read");
        let nodes = p.tree().len();

        assert_eq!(p.step(), Status::Rejected);
        assert_eq!(p.tree().len(), nodes);
    }

    #[rstest]
    #[case("rd")]
    #[case("ll1")]
    #[case("slr")]
    fn lex_error_keeps_previous_state(#[case] strategy: &str) {
        let mut p = engine(strategy, EXPRESSIONS);
        p.load_input("1 + 2").unwrap();
        p.step();
        let input = p.input_to_string();
        let nodes = p.tree().len();

        assert!(p.load_input("1 $ 2").is_err());
        assert_eq!(p.input_to_string(), input);
        assert_eq!(p.tree().len(), nodes);
    }

    #[rstest]
    #[case("rd")]
    #[case("ll1")]
    #[case("slr")]
    fn bad_grammar_keeps_previous_grammar(#[case] strategy: &str) {
        let mut p = engine(strategy, EXPRESSIONS);

        assert!(p.load_grammar("<s> ::= <missing>").is_err());
        assert_eq!(p.grammar().start().name, "expr");

        p.load_grammar(r#"<s> ::= "a""#).unwrap();
        p.load_input("a").unwrap();
        assert_eq!(p.run(100), Status::Accepted);
    }

    #[test]
    fn snapshot_serializes() {
        let mut p = engine("ll1", EXPRESSIONS);
        p.load_input("1").unwrap();
        p.step();
        p.step();

        let json = serde_json::to_value(p.snapshot()).unwrap();
        assert_eq!(json["status"], "running");
        assert_eq!(json["tree"]["name"], "expr");
        assert_eq!(json["tree"]["children"][0]["name"], "term");
        assert_eq!(json["highlight"]["cell"][0], 0);
    }

    fn expression() -> impl Strategy<Value = Vec<String>> {
        let leaf = prop_oneof![
            (0u32..1000).prop_map(|n| vec![n.to_string()]),
            "[a-z][a-z0-9_]{0,5}".prop_map(|s| vec![s]),
        ];
        leaf.prop_recursive(4, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 1..4).prop_map(|terms| {
                    let mut tokens = Vec::new();
                    for (i, term) in terms.into_iter().enumerate() {
                        if i > 0 {
                            tokens.push("+".to_string());
                        }
                        tokens.extend(term);
                    }
                    tokens
                }),
                inner.prop_map(|e| {
                    let mut tokens = vec!["(".to_string()];
                    tokens.extend(e);
                    tokens.push(")".to_string());
                    tokens
                }),
            ]
        })
    }

    proptest! {
        #[test]
        fn engines_agree_and_keep_the_yield(tokens in expression()) {
            let source = tokens.join(" ");
            let trees: Vec<String> = ["rd", "ll1", "slr"]
                .iter()
                .map(|strategy| {
                    let p = parse(strategy, EXPRESSIONS, &source);
                    let root = p.current_node().unwrap();
                    assert_eq!(p.tree().yield_of(root), tokens);
                    accepted_tree(p.as_ref())
                })
                .collect();

            prop_assert_eq!(&trees[0], &trees[1]);
            prop_assert_eq!(&trees[1], &trees[2]);
        }
    }
}
