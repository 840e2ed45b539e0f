use serde::Serialize;

use super::{
    grammar::Symbol,
    lr_dfa::{Transition, LRFSM},
    Grammar,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LRParsingTableAction {
    Shift(usize),
    Reduce(usize),
    ShiftReduce(usize),
}

/// A cell that received two different actions. `kept` is the one left in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SLRConflict {
    pub state: usize,
    pub symbol: Symbol,
    pub kept: LRParsingTableAction,
    pub rejected: LRParsingTableAction,
}

impl SLRConflict {
    pub fn is_shift_reduce(&self) -> bool {
        matches!(self.rejected, LRParsingTableAction::Reduce(_))
            != matches!(self.kept, LRParsingTableAction::Reduce(_))
    }
}

/// SLR(1) table. Columns are the terminals (ACTION part) followed by the nonterminals
/// (GOTO part), see [`Grammar::symbol_column`].
#[derive(Debug, Clone, Serialize)]
pub struct LRParsingTable {
    pub terminals: Vec<String>,
    pub non_terminals: Vec<String>,
    pub rows: Vec<Vec<Option<LRParsingTableAction>>>,
    pub conflicts: Vec<SLRConflict>,
}

impl LRParsingTable {
    pub fn action(&self, state: usize, column: usize) -> Option<LRParsingTableAction> {
        self.rows
            .get(state)
            .and_then(|row| row.get(column))
            .copied()
            .flatten()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.terminals.len() + self.non_terminals.len()
    }

    pub fn is_slr1(&self) -> bool {
        self.conflicts.is_empty()
    }
}

impl LRFSM {
    /// Shift entries come from the automaton edges, reduce entries from completed items on
    /// the FOLLOW set of their rule. Edges are installed first, so a shift/reduce conflict
    /// keeps the shift.
    pub fn to_slr_table(&self, g: &Grammar) -> LRParsingTable {
        let width = g.terminals.len() + g.non_terminals.len();
        let mut rows: Vec<Vec<Option<LRParsingTableAction>>> = Vec::new();
        let mut conflicts: Vec<SLRConflict> = Vec::new();

        for (state, item) in self.states.iter().enumerate() {
            let mut row: Vec<Option<LRParsingTableAction>> = vec![None; width];
            let mut install = |symbol: Symbol, action: LRParsingTableAction| {
                let cell = &mut row[g.symbol_column(symbol)];
                match *cell {
                    None => *cell = Some(action),
                    Some(kept) if kept == action => {}
                    Some(kept) => {
                        log::warn!(
                            "SLR conflict in state {} on {}: kept {:?}, rejected {:?}",
                            state,
                            g.get_symbol_name(symbol),
                            kept,
                            action
                        );
                        conflicts.push(SLRConflict {
                            state,
                            symbol,
                            kept,
                            rejected: action,
                        });
                    }
                }
            };

            for (&symbol, &transition) in &item.edges {
                install(
                    symbol,
                    match transition {
                        Transition::Shift(v) => LRParsingTableAction::Shift(v),
                        Transition::ShiftReduce(p) => LRParsingTableAction::ShiftReduce(p),
                    },
                );
            }

            for completed in item.items().filter(|i| i.is_complete(g)) {
                let production = g.production_index(completed.rule, completed.alternative);
                for &terminal in &g.non_terminals[completed.rule].follow {
                    install(
                        Symbol::Terminal(terminal),
                        LRParsingTableAction::Reduce(production),
                    );
                }
            }

            rows.push(row);
        }

        LRParsingTable {
            terminals: g.terminals.clone(),
            non_terminals: g.non_terminals.iter().map(|nt| nt.name.clone()).collect(),
            rows,
            conflicts,
        }
    }
}

impl Grammar {
    pub fn generate_slr_parsing_table(&self) -> LRParsingTable {
        self.to_lr0_fsm().to_slr_table(self)
    }
}
