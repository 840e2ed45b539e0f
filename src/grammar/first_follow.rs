use std::collections::BTreeSet;

use super::{grammar::Symbol, Grammar};

impl Grammar {
    pub(super) fn calculate_nullable_first_follow(&mut self) {
        self.reset_nullable_first_follow();
        let end_mark = self.end_mark();
        self.non_terminals[self.start_symbol].follow.insert(end_mark);
        self.calculate_nullable();
        self.calculate_first();
        self.calculate_follow();
    }

    fn reset_nullable_first_follow(&mut self) {
        for nt in &mut self.non_terminals {
            nt.nullable = false;
            nt.first = BTreeSet::new();
            nt.follow = BTreeSet::new();
        }
    }

    fn calculate_nullable(&mut self) {
        let mut changed = true;
        while changed {
            changed = false;
            for i in 0..self.non_terminals.len() {
                if self.non_terminals[i].nullable {
                    continue;
                }
                let nullable = self.non_terminals[i]
                    .productions
                    .iter()
                    .any(|production| self.is_production_nullable(production));

                if nullable {
                    self.non_terminals[i].nullable = true;
                    changed = true;
                }
            }
        }
    }

    /// True when every symbol of `production` can derive the empty string. The empty
    /// production is nullable.
    pub fn is_production_nullable(&self, production: &[Symbol]) -> bool {
        production.iter().all(|s| match s {
            Symbol::Terminal(_) => false,
            Symbol::NonTerminal(idx) => self.non_terminals[*idx].nullable,
        })
    }

    /// FIRST of a single symbol, epsilon excluded. For a terminal this is the terminal itself.
    pub fn first_of_symbol(&self, symbol: Symbol) -> BTreeSet<usize> {
        match symbol {
            Symbol::Terminal(idx) => BTreeSet::from([idx]),
            Symbol::NonTerminal(idx) => self.non_terminals[idx].first.clone(),
        }
    }

    /// FIRST of a symbol string, epsilon excluded; use [`Grammar::is_production_nullable`]
    /// for the epsilon part.
    pub fn calculate_first_for_production(&self, production: &[Symbol]) -> BTreeSet<usize> {
        let mut first: BTreeSet<usize> = BTreeSet::new();
        for symbol in production {
            match symbol {
                Symbol::Terminal(idx) => {
                    first.insert(*idx);
                    break;
                }
                Symbol::NonTerminal(idx) => {
                    let nt = &self.non_terminals[*idx];
                    first.extend(nt.first.iter().cloned());
                    if !nt.nullable {
                        break;
                    }
                }
            }
        }
        first
    }

    fn calculate_first(&mut self) {
        let mut changed = true;
        let mut rounds = 0;
        while changed {
            changed = false;
            rounds += 1;
            for i in 0..self.non_terminals.len() {
                let first: BTreeSet<usize> = self.non_terminals[i].productions.iter().fold(
                    BTreeSet::new(),
                    |mut first, production| {
                        first.extend(self.calculate_first_for_production(production));
                        first
                    },
                );

                let nt = &mut self.non_terminals[i];
                if nt.first.len() != first.len() {
                    changed = true;
                    nt.first = first;
                }
            }
        }
        log::trace!("FIRST sets settled after {} rounds", rounds);
    }

    fn calculate_follow(&mut self) {
        let mut changed = true;
        let mut rounds = 0;
        while changed {
            changed = false;
            rounds += 1;
            for left in 0..self.non_terminals.len() {
                for alternative in 0..self.non_terminals[left].productions.len() {
                    // walk right to left, `trailer` is what may follow the current symbol
                    let mut trailer = self.non_terminals[left].follow.clone();
                    for i in (0..self.non_terminals[left].productions[alternative].len()).rev() {
                        let symbol = self.non_terminals[left].productions[alternative][i];
                        match symbol {
                            Symbol::Terminal(idx) => {
                                trailer = BTreeSet::from([idx]);
                            }
                            Symbol::NonTerminal(idx) => {
                                let nt = &mut self.non_terminals[idx];
                                let before = nt.follow.len();
                                nt.follow.extend(trailer.iter().cloned());
                                changed |= nt.follow.len() != before;

                                if nt.nullable {
                                    trailer.extend(nt.first.iter().cloned());
                                } else {
                                    trailer = nt.first.clone();
                                }
                            }
                        }
                    }
                }
            }
        }
        log::trace!("FOLLOW sets settled after {} rounds", rounds);
    }

    /// Lookahead terminals that select `alternative` of `rule` in an LL(1) parser:
    /// FIRST of the alternative, plus FOLLOW of the rule when the alternative is nullable.
    pub fn predict_set(&self, rule: usize, alternative: usize) -> BTreeSet<usize> {
        let nt = &self.non_terminals[rule];
        let production = &nt.productions[alternative];
        let mut predict = self.calculate_first_for_production(production);
        if self.is_production_nullable(production) {
            predict.extend(nt.follow.iter().cloned());
        }
        predict
    }
}
