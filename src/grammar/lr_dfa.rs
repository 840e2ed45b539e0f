use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Serialize, Serializer};

use super::{grammar::Symbol, Grammar};

/// LR(0) item: alternative `alternative` of `rule` with the dot before symbol `position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DotProduction {
    pub rule: usize,
    pub alternative: usize,
    pub position: usize,
}

impl DotProduction {
    pub fn new(rule: usize, alternative: usize) -> Self {
        Self {
            rule,
            alternative,
            position: 0,
        }
    }

    pub fn generate_next(&self) -> Self {
        Self {
            position: self.position + 1,
            ..*self
        }
    }

    pub fn next_symbol(&self, g: &Grammar) -> Option<Symbol> {
        g.non_terminals[self.rule].productions[self.alternative]
            .get(self.position)
            .copied()
    }

    pub fn is_complete(&self, g: &Grammar) -> bool {
        self.position >= g.non_terminals[self.rule].productions[self.alternative].len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Transition {
    Shift(usize),
    /// The target would hold a single completed item; shift and reduce by this production.
    ShiftReduce(usize),
}

// JSON object keys must be strings, so edges go out as `[symbol, transition]` pairs
fn serialize_edges<S: Serializer>(
    edges: &BTreeMap<Symbol, Transition>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(edges.iter())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LRItem {
    pub kernel: BTreeSet<DotProduction>,
    pub extend: BTreeSet<DotProduction>,
    #[serde(serialize_with = "serialize_edges")]
    pub edges: BTreeMap<Symbol, Transition>,
}

impl LRItem {
    fn new(g: &Grammar, kernel: BTreeSet<DotProduction>) -> Self {
        let extend = g.closure(&kernel).difference(&kernel).cloned().collect();
        Self {
            kernel,
            extend,
            edges: BTreeMap::new(),
        }
    }

    /// Kernel and closure items together.
    pub fn items(&self) -> impl Iterator<Item = &DotProduction> {
        self.kernel.iter().chain(self.extend.iter())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LRFSM {
    pub states: Vec<LRItem>,
    pub start: usize,
}

impl Grammar {
    pub fn closure(&self, kernel: &BTreeSet<DotProduction>) -> BTreeSet<DotProduction> {
        let mut items = kernel.clone();
        let mut q: VecDeque<DotProduction> = kernel.iter().cloned().collect();

        while let Some(item) = q.pop_front() {
            if let Some(Symbol::NonTerminal(nt)) = item.next_symbol(self) {
                for alternative in 0..self.non_terminals[nt].productions.len() {
                    let added = DotProduction::new(nt, alternative);
                    if items.insert(added) {
                        q.push_back(added);
                    }
                }
            }
        }

        items
    }

    fn goto_kernel<'a>(
        &self,
        items: impl Iterator<Item = &'a DotProduction>,
        symbol: Symbol,
    ) -> BTreeSet<DotProduction> {
        items
            .filter(|item| item.next_symbol(self) == Some(symbol))
            .map(|item| item.generate_next())
            .collect()
    }

    pub fn goto(&self, items: &BTreeSet<DotProduction>, symbol: Symbol) -> BTreeSet<DotProduction> {
        self.closure(&self.goto_kernel(items.iter(), symbol))
    }

    /// Canonical LR(0) automaton. State 0 holds every start alternative with the dot at the
    /// front; targets made of one completed item become [`Transition::ShiftReduce`] edges
    /// instead of states.
    pub fn to_lr0_fsm(&self) -> LRFSM {
        let start_kernel: BTreeSet<DotProduction> = (0..self.start().productions.len())
            .map(|alternative| DotProduction::new(self.start_symbol, alternative))
            .collect();
        let mut states = vec![LRItem::new(self, start_kernel)];
        let mut q: VecDeque<usize> = VecDeque::from([0]);

        while let Some(u) = q.pop_front() {
            let symbols: Vec<Symbol> = self.symbols().collect();
            for symbol in symbols {
                let kernel = self.goto_kernel(states[u].items(), symbol);
                let Some(&first) = kernel.iter().next() else {
                    continue;
                };

                let transition = if kernel.len() == 1 && first.is_complete(self) {
                    Transition::ShiftReduce(self.production_index(first.rule, first.alternative))
                } else if let Some(v) = states.iter().position(|s| s.kernel == kernel) {
                    Transition::Shift(v)
                } else {
                    states.push(LRItem::new(self, kernel));
                    q.push_back(states.len() - 1);
                    Transition::Shift(states.len() - 1)
                };
                states[u].edges.insert(symbol, transition);
            }
        }

        log::debug!("LR(0) automaton has {} states", states.len());
        LRFSM { states, start: 0 }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{DotProduction, Transition};
    use crate::grammar::Symbol;
    use crate::Grammar;

    const SUMS: &str = "<e> ::= <e> \"+\" <t> | <t>\n<t> ::= \"<i_lit>\"";

    #[test]
    fn closure_adds_alternatives_of_next_rule() {
        let g = Grammar::parse(SUMS).unwrap();
        let closure = g.closure(&BTreeSet::from([DotProduction::new(0, 0)]));

        assert_eq!(
            closure,
            BTreeSet::from([
                DotProduction::new(0, 0),
                DotProduction::new(0, 1),
                DotProduction::new(1, 0),
            ])
        );
    }

    #[test]
    fn goto_advances_dot() {
        let g = Grammar::parse(SUMS).unwrap();
        let plus = g.get_terminal_index("+").unwrap();
        let start = g.closure(&BTreeSet::from([DotProduction::new(0, 0)]));
        let after_e = g.goto(&start, Symbol::NonTerminal(0));
        let after_plus = g.goto(&after_e, Symbol::Terminal(plus));

        assert_eq!(
            after_plus,
            BTreeSet::from([
                DotProduction {
                    rule: 0,
                    alternative: 0,
                    position: 2
                },
                DotProduction::new(1, 0),
            ])
        );
    }

    #[test]
    fn single_completed_items_collapse() {
        let g = Grammar::parse(SUMS).unwrap();
        let fsm = g.to_lr0_fsm();
        let lit = Symbol::Terminal(g.get_terminal_index("<i_lit>").unwrap());
        let plus = Symbol::Terminal(g.get_terminal_index("+").unwrap());

        assert_eq!(fsm.states.len(), 3);
        assert_eq!(fsm.states[0].edges[&lit], Transition::ShiftReduce(2));
        assert_eq!(fsm.states[0].edges[&Symbol::NonTerminal(0)], Transition::Shift(1));
        assert_eq!(fsm.states[0].edges[&Symbol::NonTerminal(1)], Transition::ShiftReduce(1));
        assert_eq!(fsm.states[1].edges[&plus], Transition::Shift(2));
        assert_eq!(fsm.states[2].edges[&Symbol::NonTerminal(1)], Transition::ShiftReduce(0));
    }
}
