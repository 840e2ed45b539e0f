use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use super::{
    parse::{RawItem, RawRule},
    END_MARK, SPECIAL_TERMINALS,
};
use crate::error::GrammarError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Symbol {
    Terminal(usize),
    NonTerminal(usize),
}

#[derive(Debug, Clone)]
pub struct NonTerminal {
    pub index: usize,
    pub name: String,
    pub first: BTreeSet<usize>,
    pub follow: BTreeSet<usize>,
    pub nullable: bool,
    pub productions: Vec<Vec<Symbol>>,
}

impl NonTerminal {
    pub fn new(index: usize, name: String) -> Self {
        Self {
            index,
            name,
            first: BTreeSet::new(),
            follow: BTreeSet::new(),
            nullable: false,
            productions: Vec::new(),
        }
    }
}

/// A loaded grammar. The first rule is the start symbol, `<eof>` is always the last terminal,
/// and nullable/FIRST/FOLLOW are filled in before the grammar is handed out.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub non_terminals: Vec<NonTerminal>,
    pub terminals: Vec<String>,
    pub start_symbol: usize,
    non_terminal_table: HashMap<String, usize>,
    terminal_table: HashMap<String, usize>,
    productions: Vec<(usize, usize)>,
}

enum RawSymbol<'a> {
    Rule(&'a str),
    Literal(&'a str),
}

impl Grammar {
    pub(super) fn build(raw_rules: Vec<RawRule>) -> Result<Self, GrammarError> {
        if raw_rules.is_empty() {
            return Err(GrammarError::Empty);
        }

        let mut g = Self {
            non_terminals: Vec::new(),
            terminals: Vec::new(),
            start_symbol: 0,
            non_terminal_table: HashMap::new(),
            terminal_table: HashMap::new(),
            productions: Vec::new(),
        };

        for rule in &raw_rules {
            if g.get_non_terminal_index(&rule.name).is_none() {
                g.add_non_terminal(&rule.name);
            }
        }

        // terminals in first-seen order, epsilon excluded, <eof> forced last
        let mut spellings: Vec<String> = Vec::new();
        for rule in &raw_rules {
            for item in rule.alternatives.iter().flatten() {
                if let RawSymbol::Literal(spelling) = g.classify(item) {
                    if !spelling.is_empty()
                        && spelling != END_MARK
                        && !spellings.iter().any(|s| s == spelling)
                    {
                        spellings.push(spelling.to_string());
                    }
                }
            }
        }
        spellings.push(END_MARK.to_string());
        for spelling in spellings {
            g.add_terminal(spelling);
        }

        for rule in &raw_rules {
            let left = g.non_terminal_table[&rule.name];
            for alternative in &rule.alternatives {
                let mut production = Vec::with_capacity(alternative.len());
                for item in alternative {
                    match g.classify(item) {
                        RawSymbol::Literal("") => {}
                        RawSymbol::Literal(spelling) => {
                            production.push(Symbol::Terminal(g.terminal_table[spelling]))
                        }
                        RawSymbol::Rule(name) => match g.get_non_terminal_index(name) {
                            Some(idx) => production.push(Symbol::NonTerminal(idx)),
                            None => {
                                return Err(GrammarError::UndefinedRule {
                                    rule: rule.name.clone(),
                                    name: name.to_string(),
                                })
                            }
                        },
                    }
                }
                g.add_production(left, production);
            }
        }

        g.calculate_nullable_first_follow();

        log::info!(
            "loaded grammar: {} rules, {} productions, {} terminals",
            g.non_terminals.len(),
            g.productions.len(),
            g.terminals.len()
        );

        Ok(g)
    }

    // unquoted <id>, <i_lit> and <eof> fall back to the special terminals
    fn classify<'a>(&self, item: &'a RawItem) -> RawSymbol<'a> {
        match item {
            RawItem::NonTerminal(name) => {
                if self.get_non_terminal_index(name).is_none() {
                    if let Some(special) = SPECIAL_TERMINALS
                        .iter()
                        .copied()
                        .find(|t| &t[1..t.len() - 1] == name.as_str())
                    {
                        return RawSymbol::Literal(special);
                    }
                }
                RawSymbol::Rule(name.as_str())
            }
            RawItem::Terminal(spelling) => RawSymbol::Literal(spelling.as_str()),
        }
    }

    pub fn terminal_iter(&self) -> impl Iterator<Item = &String> {
        self.terminals.iter()
    }

    pub fn non_terminal_iter(&self) -> impl Iterator<Item = &NonTerminal> {
        self.non_terminals.iter()
    }

    pub fn get_terminal_index(&self, name: &str) -> Option<usize> {
        self.terminal_table.get(name).cloned()
    }

    pub fn get_non_terminal_index(&self, name: &str) -> Option<usize> {
        self.non_terminal_table.get(name).cloned()
    }

    pub fn end_mark(&self) -> usize {
        self.terminals.len() - 1
    }

    pub fn start(&self) -> &NonTerminal {
        &self.non_terminals[self.start_symbol]
    }

    fn add_non_terminal(&mut self, name: &str) -> usize {
        let idx = self.non_terminals.len();
        self.non_terminals.push(NonTerminal::new(idx, name.to_string()));
        self.non_terminal_table.insert(name.to_string(), idx);
        idx
    }

    fn add_terminal(&mut self, name: String) -> usize {
        let idx = self.terminals.len();
        self.terminals.push(name.clone());
        self.terminal_table.insert(name, idx);
        idx
    }

    fn add_production(&mut self, left: usize, right: Vec<Symbol>) {
        let nt = &mut self.non_terminals[left];
        self.productions.push((left, nt.productions.len()));
        nt.productions.push(right);
    }

    pub fn get_symbol_name(&self, symbol: Symbol) -> &str {
        match symbol {
            Symbol::Terminal(idx) => self.terminals[idx].as_str(),
            Symbol::NonTerminal(idx) => self.non_terminals[idx].name.as_str(),
        }
    }

    /// Number of productions over all rules. Productions are numbered in rule order, which
    /// is also the order of the grammar listing.
    pub fn production_count(&self) -> usize {
        self.productions.len()
    }

    /// `(rule, alternative)` of a numbered production.
    pub fn production(&self, index: usize) -> (usize, usize) {
        self.productions[index]
    }

    pub fn production_index(&self, rule: usize, alternative: usize) -> usize {
        self.non_terminals[..rule]
            .iter()
            .map(|nt| nt.productions.len())
            .sum::<usize>()
            + alternative
    }

    pub fn production_symbols(&self, index: usize) -> &[Symbol] {
        let (rule, alternative) = self.productions[index];
        &self.non_terminals[rule].productions[alternative]
    }

    /// Symbols in table column order: terminals first, then nonterminals.
    pub fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        (0..self.terminals.len())
            .map(Symbol::Terminal)
            .chain((0..self.non_terminals.len()).map(Symbol::NonTerminal))
    }

    pub fn symbol_column(&self, symbol: Symbol) -> usize {
        match symbol {
            Symbol::Terminal(idx) => idx,
            Symbol::NonTerminal(idx) => self.terminals.len() + idx,
        }
    }
}
