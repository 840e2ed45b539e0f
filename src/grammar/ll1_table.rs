use serde::Serialize;

use crate::Grammar;

/// Two alternatives of one rule predicted by the same terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LL1Conflict {
    pub rule: usize,
    pub terminal: usize,
    pub kept: usize,
    pub rejected: usize,
}

/// `cells[rule][terminal]` is the alternative to expand, `None` is a parse error.
#[derive(Debug, Clone, Serialize)]
pub struct LL1ParsingTable {
    pub cells: Vec<Vec<Option<usize>>>,
    pub conflicts: Vec<LL1Conflict>,
}

impl LL1ParsingTable {
    pub fn get(&self, rule: usize, terminal: usize) -> Option<usize> {
        self.cells
            .get(rule)
            .and_then(|row| row.get(terminal))
            .copied()
            .flatten()
    }

    pub fn height(&self) -> usize {
        self.cells.len()
    }

    pub fn width(&self) -> usize {
        self.cells.first().map_or(0, |row| row.len())
    }

    pub fn is_ll1(&self) -> bool {
        self.conflicts.is_empty()
    }
}

impl Grammar {
    pub fn generate_ll1_parsing_table(&self) -> LL1ParsingTable {
        let mut cells: Vec<Vec<Option<usize>>> = Vec::new();
        let mut conflicts: Vec<LL1Conflict> = Vec::new();

        for nt in self.non_terminal_iter() {
            let mut row: Vec<Option<usize>> = vec![None; self.terminals.len()];
            for alternative in 0..nt.productions.len() {
                for terminal in self.predict_set(nt.index, alternative) {
                    match row[terminal] {
                        None => row[terminal] = Some(alternative),
                        Some(kept) => {
                            log::warn!(
                                "LL(1) conflict in <{}> on \"{}\": alternatives {} and {}",
                                nt.name,
                                self.terminals[terminal],
                                kept,
                                alternative
                            );
                            conflicts.push(LL1Conflict {
                                rule: nt.index,
                                terminal,
                                kept,
                                rejected: alternative,
                            });
                        }
                    }
                }
            }
            cells.push(row);
        }

        LL1ParsingTable { cells, conflicts }
    }
}

#[cfg(test)]
mod tests {
    use crate::Grammar;

    #[test]
    fn statement_table() {
        let g = Grammar::parse(
            r#"
<stmt_list> ::= <stmt> <stmt_list> | ""
<stmt> ::= "read" "<id>" | "write" "<id>"
"#,
        )
        .unwrap();
        let t = g.generate_ll1_parsing_table();
        let col = |name: &str| g.get_terminal_index(name).unwrap();

        assert!(t.is_ll1());
        assert_eq!((t.height(), t.width()), (2, 4));
        assert_eq!(t.get(0, col("read")), Some(0));
        assert_eq!(t.get(0, col("write")), Some(0));
        assert_eq!(t.get(0, col("<eof>")), Some(1));
        assert_eq!(t.get(1, col("write")), Some(1));
        assert_eq!(t.get(1, col("<id>")), None);
    }

    #[test]
    fn left_recursion_conflicts() {
        let g = Grammar::parse(r#"<e> ::= <e> "+" "<i_lit>" | "<i_lit>""#).unwrap();
        let t = g.generate_ll1_parsing_table();

        assert!(!t.is_ll1());
        assert_eq!(t.conflicts[0].kept, 0);
        assert_eq!(t.conflicts[0].rejected, 1);
        assert_eq!(t.get(0, g.get_terminal_index("<i_lit>").unwrap()), Some(0));
    }
}
