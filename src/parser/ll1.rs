use super::{Parser, ParserCore, Status};
use crate::grammar::{ll1_table::LL1ParsingTable, Symbol};
use crate::tree::{NodeId, NodeKind, ERROR_NODE};
use crate::Grammar;

#[derive(Debug, Clone, Copy)]
enum Frame {
    NonTerminal { rule: usize, node: NodeId },
    Terminal { terminal: usize, node: NodeId },
}

impl Frame {
    fn node(&self) -> NodeId {
        match *self {
            Frame::NonTerminal { node, .. } | Frame::Terminal { node, .. } => node,
        }
    }
}

/// Table-driven LL(1): one stack frame per grammar symbol. Expanding a nonterminal creates
/// its children up front; terminal children are placeholders named after the terminal until
/// they are matched.
#[derive(Debug, Clone)]
pub struct LL1Parser {
    core: ParserCore,
    table: LL1ParsingTable,
    stack: Vec<Frame>,
}

impl LL1Parser {
    pub fn new(grammar: Grammar) -> Self {
        let table = grammar.generate_ll1_parsing_table();
        Self {
            core: ParserCore::new(grammar),
            table,
            stack: Vec::new(),
        }
    }

    pub fn table(&self) -> &LL1ParsingTable {
        &self.table
    }

    fn expand(&mut self, rule: usize, node: NodeId) -> Status {
        let Some(terminal) = self.core.lookahead_terminal() else {
            return self.core.reject(node);
        };
        self.core.highlight.cell = Some((rule, terminal));
        let Some(alternative) = self.table.get(rule, terminal) else {
            return self.core.reject(node);
        };

        let g = &self.core.grammar;
        let production = g.production_index(rule, alternative);
        self.core.highlight.line = Some(production);
        log::debug!("expand {}", g.production_to_plaintext(production));

        let mut frames = Vec::new();
        for &symbol in &g.non_terminals[rule].productions[alternative] {
            let name = g.get_symbol_name(symbol);
            frames.push(match symbol {
                Symbol::NonTerminal(rule) => Frame::NonTerminal {
                    rule,
                    node: self.core.tree.add_child(node, name, NodeKind::NonTerminal),
                },
                Symbol::Terminal(terminal) => Frame::Terminal {
                    terminal,
                    node: self.core.tree.add_child(node, name, NodeKind::Terminal),
                },
            });
        }
        self.stack.extend(frames.into_iter().rev());
        Status::Running
    }
}

impl Parser for LL1Parser {
    fn core(&self) -> &ParserCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ParserCore {
        &mut self.core
    }

    fn set_grammar(&mut self, grammar: Grammar) {
        *self = Self::new(grammar);
    }

    fn step(&mut self) -> Status {
        if self.core.status.is_finished() {
            return self.core.status;
        }
        self.core.highlight = Default::default();

        let Some(root) = self.core.tree.root() else {
            let rule = self.core.grammar.start_symbol;
            let node = self
                .core
                .tree
                .reset_with_root(&self.core.grammar.start().name, NodeKind::NonTerminal);
            self.core.current = Some(node);
            self.stack.push(Frame::NonTerminal { rule, node });
            return Status::Running;
        };

        let Some(frame) = self.stack.pop() else {
            return if self.core.at_end() {
                self.core.accept(root)
            } else {
                self.core.reject(root)
            };
        };

        self.core.current = Some(frame.node());
        match frame {
            Frame::NonTerminal { rule, node } => self.expand(rule, node),
            Frame::Terminal { terminal, node } => {
                if self.core.input.is_empty() || self.core.lookahead_terminal() != Some(terminal)
                {
                    self.core.tree.rename(node, ERROR_NODE, NodeKind::Error);
                    self.core.status = Status::Rejected;
                    return Status::Rejected;
                }
                if let Some(token) = self.core.advance() {
                    log::debug!("match {}", token.image);
                    self.core.tree.rename(node, &token.image, NodeKind::Terminal);
                }
                Status::Running
            }
        }
    }

    fn clear_stack(&mut self) {
        self.stack.clear();
    }

    fn stack_nodes(&self) -> Vec<NodeId> {
        self.stack.iter().map(|f| f.node()).collect()
    }

    fn stack_to_string(&self) -> String {
        self.stack
            .iter()
            .map(|f| self.core.tree.name(f.node()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::LL1Parser;
    use crate::parser::{Parser, Status};
    use crate::tree::ERROR_NODE;
    use crate::Grammar;

    const STATEMENTS: &str = r#"
<stmt_list> ::= <stmt> <stmt_list> | ""
<stmt> ::= "read" "<id>" | "write" "<id>"
"#;

    #[test]
    fn expansion_creates_placeholders() {
        let mut p = LL1Parser::new(Grammar::parse(STATEMENTS).unwrap());
        p.load_input("write y").unwrap();

        p.step();
        p.step();
        assert_eq!(p.stack_to_string(), "stmt_list stmt");
        assert_eq!(p.highlight().cell, Some((0, 2)));
        assert_eq!(p.highlight().line, Some(0));

        p.step();
        assert_eq!(p.stack_to_string(), "stmt_list <id> write");
        assert_eq!(p.highlight().line, Some(3));
        assert_eq!(p.tree().to_bracketed(0), "stmt_list[stmt[write <id>] stmt_list[]]");

        p.step();
        p.step();
        assert_eq!(p.tree().to_bracketed(0), "stmt_list[stmt[write y] stmt_list[]]");
        assert_eq!(p.input_to_string(), "<eof>");
    }

    #[test]
    fn mismatched_placeholder_becomes_error() {
        let mut p = LL1Parser::new(Grammar::parse(STATEMENTS).unwrap());
        p.load_input("read write").unwrap();

        assert_eq!(p.run(100), Status::Rejected);
        let current = p.current_node().unwrap();
        assert_eq!(p.tree().name(current), ERROR_NODE);
        assert_eq!(p.tree().to_bracketed(0), "stmt_list[stmt[read ERROR] stmt_list[]]");
    }

    #[test]
    fn table_miss_attaches_error() {
        let mut p = LL1Parser::new(Grammar::parse(STATEMENTS).unwrap());
        p.load_input("x").unwrap();

        assert_eq!(p.run(100), Status::Rejected);
        assert_eq!(p.tree().to_bracketed(0), "stmt_list[ERROR]");
        assert_eq!(p.highlight().cell, Some((0, 1)));
    }
}
