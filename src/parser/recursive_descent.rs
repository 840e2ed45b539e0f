use std::collections::BTreeSet;

use super::{Parser, ParserCore, Status};
use crate::grammar::Symbol;
use crate::tree::{NodeId, NodeKind};
use crate::Grammar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Descend(usize),
    Match(usize),
    Return,
}

#[derive(Debug, Clone)]
pub struct Alternative {
    pub predict: BTreeSet<usize>,
    /// Always ends with [`Action::Return`].
    pub actions: Vec<Action>,
    /// Listing line of each action.
    lines: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct Procedure {
    pub alternatives: Vec<Alternative>,
    /// Listing line reporting a predict miss.
    error_line: usize,
}

/// One procedure per rule, printed as a plain-text outline. Every action owns one line, and
/// the line numbers are what [`super::Highlight::line`] points at.
#[derive(Debug, Clone)]
pub struct Procedures {
    pub procedures: Vec<Procedure>,
    pub listing: Vec<String>,
}

impl Procedures {
    pub fn new(g: &Grammar) -> Self {
        let mut listing = vec![format!("call {}()", g.start().name)];
        let mut procedures = Vec::with_capacity(g.non_terminals.len());

        for nt in g.non_terminal_iter() {
            listing.push(format!("procedure {}():", nt.name));
            let mut alternatives = Vec::new();
            for (alternative, production) in nt.productions.iter().enumerate() {
                let predict = g.predict_set(nt.index, alternative);
                listing.push(format!(
                    "  on {}:",
                    predict
                        .iter()
                        .map(|&t| g.symbol_to_bnf(Symbol::Terminal(t)))
                        .collect::<Vec<_>>()
                        .join(", ")
                ));

                let mut actions = Vec::with_capacity(production.len() + 1);
                let mut lines = Vec::with_capacity(production.len() + 1);
                for &symbol in production {
                    lines.push(listing.len());
                    match symbol {
                        Symbol::NonTerminal(idx) => {
                            listing.push(format!("    call {}()", g.non_terminals[idx].name));
                            actions.push(Action::Descend(idx));
                        }
                        Symbol::Terminal(idx) => {
                            listing.push(format!(
                                "    match {}",
                                g.symbol_to_bnf(Symbol::Terminal(idx))
                            ));
                            actions.push(Action::Match(idx));
                        }
                    }
                }
                actions.push(Action::Return);
                alternatives.push(Alternative {
                    predict,
                    actions,
                    lines,
                });
            }

            let error_line = listing.len();
            listing.push("  otherwise: error".to_string());
            let return_line = listing.len();
            listing.push("  return".to_string());
            for alternative in &mut alternatives {
                alternative.lines.push(return_line);
            }
            procedures.push(Procedure {
                alternatives,
                error_line,
            });
        }

        Self {
            procedures,
            listing,
        }
    }

    /// First alternative of `rule` whose predict set holds `lookahead`.
    pub fn select(&self, rule: usize, lookahead: Option<usize>) -> Option<usize> {
        let lookahead = lookahead?;
        self.procedures[rule]
            .alternatives
            .iter()
            .position(|a| a.predict.contains(&lookahead))
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    rule: usize,
    alternative: usize,
    action: usize,
    node: NodeId,
}

/// Simulates the call stack of a recursive-descent parser, one action per step.
#[derive(Debug, Clone)]
pub struct RecursiveDescentParser {
    core: ParserCore,
    procedures: Procedures,
    stack: Vec<Frame>,
}

impl RecursiveDescentParser {
    pub fn new(grammar: Grammar) -> Self {
        let procedures = Procedures::new(&grammar);
        Self {
            core: ParserCore::new(grammar),
            procedures,
            stack: Vec::new(),
        }
    }

    pub fn procedures(&self) -> &Procedures {
        &self.procedures
    }

    /// Pushes a frame for `node`, or rejects if no alternative predicts the lookahead.
    fn call(&mut self, rule: usize, node: NodeId) -> Status {
        match self
            .procedures
            .select(rule, self.core.lookahead_terminal())
        {
            Some(alternative) => {
                self.stack.push(Frame {
                    rule,
                    alternative,
                    action: 0,
                    node,
                });
                Status::Running
            }
            None => {
                self.core.highlight.line = Some(self.procedures.procedures[rule].error_line);
                self.core.reject(node)
            }
        }
    }
}

impl Parser for RecursiveDescentParser {
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
            let start = self.core.grammar.start_symbol;
            let root = self
                .core
                .tree
                .reset_with_root(&self.core.grammar.start().name, NodeKind::NonTerminal);
            log::debug!("call {}", self.core.grammar.start().name);
            self.core.current = Some(root);
            self.core.highlight.line = Some(0);
            return self.call(start, root);
        };

        let Some(&frame) = self.stack.last() else {
            return if self.core.at_end() {
                self.core.accept(root)
            } else {
                self.core.reject(root)
            };
        };

        let alternative = &self.procedures.procedures[frame.rule].alternatives[frame.alternative];
        let action = alternative.actions[frame.action];
        self.core.highlight.line = Some(alternative.lines[frame.action]);
        match action {
            Action::Descend(rule) => {
                let name = &self.core.grammar.non_terminals[rule].name;
                log::debug!("call {}", name);
                let node = self
                    .core
                    .tree
                    .add_child(frame.node, name, NodeKind::NonTerminal);
                self.core.current = Some(node);
                self.call(rule, node)
            }
            Action::Match(terminal) => {
                if self.core.input.is_empty() || self.core.lookahead_terminal() != Some(terminal)
                {
                    return self.core.reject(frame.node);
                }
                if let Some(token) = self.core.advance() {
                    log::debug!("match {}", token.image);
                    let leaf = self
                        .core
                        .tree
                        .add_child(frame.node, &token.image, NodeKind::Terminal);
                    self.core.current = Some(leaf);
                }
                if let Some(top) = self.stack.last_mut() {
                    top.action += 1;
                }
                Status::Running
            }
            Action::Return => {
                log::debug!("return from {}", self.core.tree.name(frame.node));
                self.stack.pop();
                self.core.current = Some(frame.node);
                if let Some(parent) = self.stack.last_mut() {
                    parent.action += 1;
                    self.core.current = Some(parent.node);
                }
                Status::Running
            }
        }
    }

    fn clear_stack(&mut self) {
        self.stack.clear();
    }

    fn stack_nodes(&self) -> Vec<NodeId> {
        self.stack.iter().map(|f| f.node).collect()
    }

    fn stack_to_string(&self) -> String {
        self.stack
            .iter()
            .map(|f| self.core.tree.name(f.node))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
