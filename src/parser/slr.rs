use super::{Parser, ParserCore, Status};
use crate::grammar::{
    slr_table::{LRParsingTable, LRParsingTableAction},
    Symbol,
};
use crate::tree::{NodeId, NodeKind};
use crate::Grammar;

#[derive(Debug, Clone, Copy)]
struct Frame {
    state: usize,
    node: NodeId,
}

/// Shift/reduce simulation over the SLR(1) table. The tree root is a nameless sentinel that
/// collects shifted symbols; a reduction moves the handle under a new node and leaves that
/// node pending, to be shifted on its GOTO entry by the next step.
#[derive(Debug, Clone)]
pub struct SLRParser {
    core: ParserCore,
    table: LRParsingTable,
    stack: Vec<Frame>,
    pending: Option<(usize, NodeId)>,
}

impl SLRParser {
    pub fn new(grammar: Grammar) -> Self {
        let table = grammar.generate_slr_parsing_table();
        Self {
            core: ParserCore::new(grammar),
            table,
            stack: Vec::new(),
            pending: None,
        }
    }

    pub fn table(&self) -> &LRParsingTable {
        &self.table
    }

    fn shifted_node(&mut self, root: NodeId) -> Option<NodeId> {
        if let Some((_, node)) = self.pending.take() {
            return Some(node);
        }
        let token = self.core.advance()?;
        Some(
            self.core
                .tree
                .add_child(root, &token.image, NodeKind::Terminal),
        )
    }

    /// Moves the last `n` children of the sentinel under a new node for `production`.
    fn reduce(&mut self, root: NodeId, production: usize, n: usize) -> Status {
        let (rule, _) = self.core.grammar.production(production);
        let children = self.core.tree.detach_last_children(root, n);
        let node = self.core.tree.add_child(
            root,
            &self.core.grammar.non_terminals[rule].name,
            NodeKind::NonTerminal,
        );
        self.core.tree.adopt(node, children);
        log::debug!(
            "reduce {}",
            self.core.grammar.production_to_plaintext(production)
        );

        self.core.highlight.line = Some(production);
        self.core.current = Some(node);
        self.pending = Some((rule, node));
        Status::Running
    }
}

impl Parser for SLRParser {
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

        let (Some(root), Some(&Frame { state, .. })) = (self.core.tree.root(), self.stack.last())
        else {
            let root = self.core.tree.reset_with_root("", NodeKind::NonTerminal);
            self.stack.push(Frame { state: 0, node: root });
            self.core.current = Some(root);
            return Status::Running;
        };

        let g = &self.core.grammar;
        if let Some((rule, node)) = self.pending {
            if rule == g.start_symbol && state == 0 && self.core.at_end() {
                return self.core.accept(node);
            }
        }

        let symbol = match self.pending {
            Some((rule, _)) => Some(Symbol::NonTerminal(rule)),
            None => self.core.lookahead_terminal().map(Symbol::Terminal),
        };
        let Some(column) = symbol.map(|s| g.symbol_column(s)) else {
            return self.core.reject(root);
        };
        self.core.highlight.cell = Some((state, column));

        match self.table.action(state, column) {
            Some(LRParsingTableAction::Shift(target)) => {
                let Some(node) = self.shifted_node(root) else {
                    return self.core.reject(root);
                };
                log::debug!("shift {} to state {}", self.core.tree.name(node), target);
                self.stack.push(Frame {
                    state: target,
                    node,
                });
                self.core.current = Some(node);
                Status::Running
            }
            Some(LRParsingTableAction::Reduce(production)) => {
                let n = self.core.grammar.production_symbols(production).len();
                self.stack.truncate(self.stack.len().saturating_sub(n));
                self.reduce(root, production, n)
            }
            Some(LRParsingTableAction::ShiftReduce(production)) => {
                if self.shifted_node(root).is_none() {
                    return self.core.reject(root);
                }
                let n = self.core.grammar.production_symbols(production).len();
                self.stack.truncate((self.stack.len() + 1).saturating_sub(n));
                self.reduce(root, production, n)
            }
            None => self.core.reject(root),
        }
    }

    fn clear_stack(&mut self) {
        self.stack.clear();
        self.pending = None;
    }

    fn stack_nodes(&self) -> Vec<NodeId> {
        self.stack.iter().map(|f| f.node).collect()
    }

    fn stack_to_string(&self) -> String {
        self.stack
            .iter()
            .map(|f| match self.core.tree.name(f.node) {
                "" => f.state.to_string(),
                name => format!("{} {}", name, f.state),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// A pending reduced symbol is shown in front of the remaining tokens.
    fn input_to_string(&self) -> String {
        let input = self.core.input_to_string();
        match self.pending {
            Some((rule, _)) => {
                let name = &self.core.grammar.non_terminals[rule].name;
                if input.is_empty() {
                    name.clone()
                } else {
                    format!("{} {}", name, input)
                }
            }
            None => input,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SLRParser;
    use crate::grammar::slr_table::LRParsingTableAction;
    use crate::parser::{Parser, Status};
    use crate::Grammar;

    const SUMS: &str = "<e> ::= <e> \"+\" <t> | <t>\n<t> ::= \"<i_lit>\"";

    #[test]
    fn sums_are_left_associative() {
        let mut p = SLRParser::new(Grammar::parse(SUMS).unwrap());
        p.load_input("1 + 2 + 3").unwrap();

        assert_eq!(p.run(100), Status::Accepted);
        assert_eq!(
            p.tree().to_bracketed(p.current_node().unwrap()),
            "e[e[e[t[1]] + t[2]] + t[3]]"
        );
        assert_eq!(p.tree().children(0), &[p.current_node().unwrap()]);
    }

    #[test]
    fn reduction_is_pending_in_the_input_line() {
        let mut p = SLRParser::new(Grammar::parse(SUMS).unwrap());
        p.load_input("1 + 2").unwrap();

        p.step();
        assert_eq!(p.stack_to_string(), "0");

        p.step();
        assert_eq!(p.input_to_string(), "t + 2 <eof>");
        assert_eq!(p.highlight().line, Some(2));
        assert_eq!(p.stack_to_string(), "0");

        p.step();
        assert_eq!(p.input_to_string(), "e + 2 <eof>");
        assert_eq!(p.highlight().line, Some(1));

        p.step();
        assert_eq!(p.input_to_string(), "+ 2 <eof>");
        assert_eq!(p.stack_to_string(), "0 e 1");

        p.step();
        assert_eq!(p.stack_to_string(), "0 e 1 + 2");
        let plus = p.grammar().get_terminal_index("+").unwrap();
        assert_eq!(p.highlight().cell, Some((1, plus)));
        assert_eq!(
            p.table().action(1, plus),
            Some(LRParsingTableAction::Shift(2))
        );
    }

    #[test]
    fn no_action_rejects_at_the_sentinel() {
        let mut p = SLRParser::new(Grammar::parse(SUMS).unwrap());
        p.load_input("1 + + 2").unwrap();

        assert_eq!(p.run(100), Status::Rejected);
        assert_eq!(p.tree().to_bracketed(0), "[e[t[1]] + ERROR]");
        assert_eq!(p.input_to_string(), "+ 2 <eof>");
    }

    #[test]
    fn epsilon_reduction_adds_an_empty_node() {
        let mut p = SLRParser::new(Grammar::parse(r#"<s> ::= "a" <s> | """#).unwrap());
        p.load_input("a").unwrap();

        assert_eq!(p.run(100), Status::Accepted);
        assert_eq!(p.tree().to_bracketed(0), "[s[a s[]]]");
    }
}
