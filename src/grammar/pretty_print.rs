use crowbook_text_processing::escape;
use serde::Serialize;

use super::{
    grammar::Symbol,
    ll1_table::{LL1Conflict, LL1ParsingTable},
    lr_dfa::{DotProduction, LRItem, Transition, LRFSM},
    slr_table::{LRParsingTable, LRParsingTableAction, SLRConflict},
    Grammar, EPSILON,
};

/// Right-aligns every column and joins cells with `" | "`.
fn align_columns(output: &[Vec<String>]) -> String {
    let columns = output.iter().map(|line| line.len()).max().unwrap_or(0);
    let width: Vec<usize> = (0..columns)
        .map(|j| {
            output
                .iter()
                .filter_map(|line| line.get(j))
                .map(|s| s.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    output
        .iter()
        .map(|line| {
            line.iter()
                .enumerate()
                .map(|(i, s)| format!("{:>width$}", s, width = width[i]))
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

impl Grammar {
    /// `<rule>` for nonterminals, `"spelling"` for terminals.
    pub fn symbol_to_bnf(&self, symbol: Symbol) -> String {
        match symbol {
            Symbol::NonTerminal(idx) => format!("<{}>", self.non_terminals[idx].name),
            Symbol::Terminal(idx) => format!("\"{}\"", self.terminals[idx].replace('\n', "\\n")),
        }
    }

    pub fn production_to_plaintext(&self, index: usize) -> String {
        let (rule, _) = self.production(index);
        let right = self.production_symbols(index);
        let right = if right.is_empty() {
            "\"\"".to_string()
        } else {
            right
                .iter()
                .map(|s| self.symbol_to_bnf(*s))
                .collect::<Vec<_>>()
                .join(" ")
        };
        format!("<{}> ::= {}", self.non_terminals[rule].name, right)
    }

    fn production_to_latex(&self, index: usize) -> String {
        let (rule, _) = self.production(index);
        let right = self.production_symbols(index);
        let right = if right.is_empty() {
            "\\epsilon".to_string()
        } else {
            right
                .iter()
                .map(|s| match s {
                    Symbol::Terminal(_) => {
                        format!("\\text{{{}}}", escape::tex(self.get_symbol_name(*s)))
                    }
                    Symbol::NonTerminal(_) => escape::tex(self.get_symbol_name(*s)).to_string(),
                })
                .collect::<Vec<_>>()
                .join(" \\ ")
        };
        format!(
            "{} & \\rightarrow & {}",
            escape::tex(self.non_terminals[rule].name.as_str()),
            right
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductionOutputVec {
    productions: Vec<String>,
    latex: Vec<String>,
}

impl ProductionOutputVec {
    /// One numbered line per production; the line index is the grammar highlight marker.
    pub fn to_plaintext(&self) -> String {
        let digits = self.productions.len().to_string().len();
        self.productions
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{:>width$}: {}", i, p, width = digits))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_latex(&self) -> String {
        std::iter::once("\\[\\begin{array}{cll}".to_string())
            .chain(self.latex.iter().cloned())
            .chain(std::iter::once("\\end{array}\\]".to_string()))
            .collect::<Vec<String>>()
            .join("\\\\\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.productions
    }
}

impl Grammar {
    pub fn to_production_output_vec(&self) -> ProductionOutputVec {
        ProductionOutputVec {
            productions: (0..self.production_count())
                .map(|i| self.production_to_plaintext(i))
                .collect(),
            latex: (0..self.production_count())
                .map(|i| self.production_to_latex(i))
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct NonTerminalOutput<'a> {
    name: &'a str,
    nullable: bool,
    first: Vec<&'a str>,
    follow: Vec<&'a str>,
}

impl NonTerminalOutput<'_> {
    fn to_plaintext(&self) -> String {
        format!(
            "{} | {} | {} | {}",
            self.name,
            self.nullable,
            self.first.join(", "),
            self.follow.join(", ")
        )
    }
    fn to_latex(&self) -> String {
        fn f(a: &[&str]) -> String {
            a.iter()
                .map(|s| escape::tex(*s))
                .collect::<Vec<_>>()
                .join(r"\ ")
                .replace(EPSILON, r"$\epsilon$")
        }

        format!(
            "{} & {} & {} & {}",
            escape::tex(self.name),
            self.nullable,
            f(&self.first),
            f(&self.follow)
        )
    }
}

#[derive(Serialize)]
pub struct NonTerminalOutputVec<'a> {
    data: Vec<NonTerminalOutput<'a>>,
}

impl NonTerminalOutputVec<'_> {
    pub fn to_plaintext(&self) -> String {
        self.data
            .iter()
            .map(|s| s.to_plaintext())
            .collect::<Vec<String>>()
            .join("\n")
    }
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
    }
    pub fn to_latex(&self) -> String {
        let content = self
            .data
            .iter()
            .map(|e| e.to_latex())
            .collect::<Vec<_>>()
            .join("\\\\\n ");

        "\\begin{tabular}{c|c|c|c}\n".to_string()
            + "Symbol & Nullable & First & Follow\\\\\\hline\n"
            + &content
            + "\\\\\n\\end{tabular}"
    }
}

impl Grammar {
    pub fn to_non_terminal_output_vec(&self) -> NonTerminalOutputVec {
        let mut data = Vec::new();
        for non_terminal in self.non_terminal_iter() {
            let mut t = NonTerminalOutput {
                name: non_terminal.name.as_str(),
                nullable: non_terminal.nullable,
                first: non_terminal
                    .first
                    .iter()
                    .map(|idx| self.terminals[*idx].as_str())
                    .collect(),
                follow: non_terminal
                    .follow
                    .iter()
                    .map(|idx| self.terminals[*idx].as_str())
                    .collect(),
            };

            if non_terminal.nullable {
                t.first.push(EPSILON);
            }
            data.push(t);
        }
        NonTerminalOutputVec { data }
    }
}

impl LL1Conflict {
    pub fn to_plaintext(&self, g: &Grammar) -> String {
        let index = |alternative| g.production_index(self.rule, alternative);
        format!(
            "LL(1) conflict on {}: {} / {}",
            g.symbol_to_bnf(Symbol::Terminal(self.terminal)),
            g.production_to_plaintext(index(self.kept)),
            g.production_to_plaintext(index(self.rejected))
        )
    }
}

impl LL1ParsingTable {
    fn output(&self, g: &Grammar, escape_cell: impl Fn(&str) -> String) -> Vec<Vec<String>> {
        let mut header: Vec<String> = vec![String::new()];
        header.extend(g.terminal_iter().map(|t| escape_cell(t)));
        let mut output: Vec<Vec<String>> = vec![header];
        for (rule, row) in self.cells.iter().enumerate() {
            let mut line: Vec<String> = vec![escape_cell(&g.non_terminals[rule].name)];
            line.extend(row.iter().map(|cell| match cell {
                Some(alternative) => g.production_index(rule, *alternative).to_string(),
                None => String::new(),
            }));
            output.push(line);
        }
        output
    }

    /// Cells hold production numbers, as in [`ProductionOutputVec::to_plaintext`].
    pub fn to_plaintext(&self, g: &Grammar) -> String {
        align_columns(&self.output(g, |s| s.replace('\n', "\\n")))
    }

    pub fn to_latex(&self, g: &Grammar) -> String {
        let output = self.output(g, |s| escape::tex(s).to_string());
        let header = format!(
            "\\begin{{tabular}}{{c{}}}\n{}\\\\\\hline\n",
            "|l".repeat(self.width()),
            output[0].join(" & ")
        );
        let content = output[1..]
            .iter()
            .map(|line| line.join(" & "))
            .collect::<Vec<_>>()
            .join("\\\\\n");
        header + &content + "\n\\end{tabular}"
    }
}

impl DotProduction {
    pub fn to_plaintext(&self, g: &Grammar) -> String {
        let production = &g.non_terminals[self.rule].productions[self.alternative];
        let mut output = format!("<{}> ::=", g.non_terminals[self.rule].name);
        for (i, s) in production.iter().enumerate() {
            if i == self.position {
                output.push_str(" .");
            }
            output.push(' ');
            output.push_str(&g.symbol_to_bnf(*s));
        }
        if self.position == production.len() {
            output.push_str(" .");
        }
        output
    }

    pub fn to_latex(&self, g: &Grammar) -> String {
        let production = &g.non_terminals[self.rule].productions[self.alternative];
        let mut right: Vec<String> = Vec::new();
        for (i, s) in production.iter().enumerate() {
            if i == self.position {
                right.push(".".to_string());
            }
            right.push(escape::tex(g.get_symbol_name(*s)).to_string());
        }
        if self.position == production.len() {
            right.push(".".to_string());
        }
        format!(
            "${} \\rightarrow {}$",
            escape::tex(g.non_terminals[self.rule].name.as_str()),
            right.join(" ")
        )
    }
}

impl Transition {
    pub fn to_plaintext(&self) -> String {
        match self {
            Transition::Shift(v) => format!("I{}", v),
            Transition::ShiftReduce(p) => format!("reduce {}", p),
        }
    }
}

impl LRItem {
    pub fn to_plaintext(&self, g: &Grammar) -> String {
        let kernel = self
            .kernel
            .iter()
            .map(|c| c.to_plaintext(g))
            .collect::<Vec<_>>()
            .join("\n");

        let extend = if !self.extend.is_empty() {
            format!(
                "\n---\n{}",
                self.extend
                    .iter()
                    .map(|c| c.to_plaintext(g))
                    .collect::<Vec<_>>()
                    .join("\n")
            )
        } else {
            String::new()
        };

        let edges = if !self.edges.is_empty() {
            format!(
                "\n===\n{}",
                self.edges
                    .iter()
                    .map(|(k, v)| format!("- {} -> {}", g.symbol_to_bnf(*k), v.to_plaintext()))
                    .collect::<Vec<_>>()
                    .join("\n")
            )
        } else {
            String::new()
        };

        format!("{}{}{}", kernel, extend, edges)
    }

    pub fn node_to_latex(&self, g: &Grammar, id: usize) -> String {
        let content = self
            .items()
            .map(|e| e.to_latex(g))
            .collect::<Vec<_>>()
            .join(" \\\\ \n");
        format!(
            "\\node [block] (I_{}){}\n{{\n$I_{}$\\\\\n{}\n}};",
            id,
            if id > 0 {
                if id % 2 == 0 {
                    format!(" [below of = I_{}] ", id - 2)
                } else {
                    format!(" [right of = I_{}] ", id - 1)
                }
            } else {
                String::new()
            },
            id,
            content
        )
    }

    pub fn edge_to_latex(&self, g: &Grammar, id: usize) -> String {
        self.edges
            .iter()
            .filter_map(|(e, v)| match v {
                Transition::Shift(v) => Some(format!(
                    "\\path [->] (I_{}) edge {} node [above]{{{}}} (I_{});",
                    id,
                    if id == *v { "[loop left]" } else { "[right]" },
                    escape::tex(g.get_symbol_name(*e)),
                    v
                )),
                Transition::ShiftReduce(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl LRFSM {
    pub fn to_plaintext(&self, g: &Grammar) -> String {
        let states = self
            .states
            .iter()
            .enumerate()
            .map(|(i, s)| format!("I{}\n{}", i, s.to_plaintext(g)))
            .collect::<Vec<_>>()
            .join("\n\n");

        format!("{}\n\nstart: {}", states, self.start)
    }

    pub fn to_latex(&self, g: &Grammar) -> String {
        format!(
            "\\begin{{tikzpicture}}[node distance=5cm,block/.style={{state, rectangle, text width=6em}}]\n{}\n\\end{{tikzpicture}}",
            self.states
                .iter()
                .enumerate()
                .map(|(i, s)| s.node_to_latex(g, i))
                .chain(self.states.iter().enumerate().map(|(i, s)| s.edge_to_latex(g, i)))
                .collect::<Vec<_>>()
                .join("\n")
        )
    }
}

impl LRParsingTableAction {
    pub fn to_plaintext(&self) -> String {
        match self {
            LRParsingTableAction::Shift(s) => format!("s{}", s),
            LRParsingTableAction::Reduce(r) => format!("r{}", r),
            LRParsingTableAction::ShiftReduce(r) => format!("sr{}", r),
        }
    }

    pub fn to_latex(&self) -> String {
        match self {
            LRParsingTableAction::Shift(s) => format!("shift {}", s),
            LRParsingTableAction::Reduce(r) => format!("reduce {}", r),
            LRParsingTableAction::ShiftReduce(r) => format!("shift, reduce {}", r),
        }
    }
}

impl SLRConflict {
    pub fn to_plaintext(&self, g: &Grammar) -> String {
        format!(
            "SLR conflict in state {} on {}: kept {}, rejected {}",
            self.state,
            g.symbol_to_bnf(self.symbol),
            self.kept.to_plaintext(),
            self.rejected.to_plaintext()
        )
    }
}

impl LRParsingTable {
    fn rejected_in(&self, state: usize, column: usize, g: &Grammar) -> Vec<LRParsingTableAction> {
        self.conflicts
            .iter()
            .filter(|c| c.state == state && g.symbol_column(c.symbol) == column)
            .map(|c| c.rejected)
            .collect()
    }

    /// Conflicting cells list the kept action first, then the rejected ones.
    pub fn to_plaintext(&self, g: &Grammar) -> String {
        let mut output: Vec<Vec<String>> = Vec::new();

        output.push(vec![String::new()]);
        for s in self.terminals.iter().chain(self.non_terminals.iter()) {
            output[0].push(s.replace('\n', "\\n"));
        }

        for (i, row) in self.rows.iter().enumerate() {
            let line: Vec<String> = std::iter::once(i.to_string())
                .chain(row.iter().enumerate().map(|(j, cell)| {
                    cell.iter()
                        .chain(self.rejected_in(i, j, g).iter())
                        .map(|action| action.to_plaintext())
                        .collect::<Vec<_>>()
                        .join("/")
                }))
                .collect();
            output.push(line);
        }

        align_columns(&output)
    }

    pub fn to_latex(&self, g: &Grammar) -> String {
        let header: String = format!(
            "\\begin{{tabular}}{{c{}}}\n & \\multicolumn{{{}}}{{c}}{{action}} & \\multicolumn{{{}}}{{|c}}{{goto}}\\\\",
            "|l".repeat(self.width()),
            self.terminals.len(),
            self.non_terminals.len(),
        );

        let mut first_row: Vec<String> = vec![String::new()];
        for s in self.terminals.iter().chain(self.non_terminals.iter()) {
            first_row.push(escape::tex(s.as_str()).to_string());
        }
        let first_row = first_row.join(" & ");

        let content = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                std::iter::once(i.to_string())
                    .chain(row.iter().enumerate().map(|(j, cell)| {
                        let rejected = self.rejected_in(i, j, g);
                        let r = cell
                            .iter()
                            .chain(rejected.iter())
                            .map(|action| action.to_latex())
                            .collect::<Vec<_>>()
                            .join("; ");
                        if rejected.is_empty() {
                            r
                        } else {
                            format!("{{\\color{{red}}{}}}", r)
                        }
                    }))
                    .collect::<Vec<_>>()
                    .join(" & ")
            })
            .collect::<Vec<_>>()
            .join(" \\\\\n");

        format!(
            "{}\n{} \\\\\\hline\n{}\n\\end{{tabular}}",
            header, first_row, content
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::Grammar;

    #[test]
    fn production_listing() {
        let g = Grammar::parse("<s> ::= \"a\" <s> | \"\"\n<t> ::= \"\\n\"").unwrap();
        let listing = g.to_production_output_vec();

        assert_eq!(
            listing.lines(),
            &[
                "<s> ::= \"a\" <s>".to_string(),
                "<s> ::= \"\"".to_string(),
                "<t> ::= \"\\n\"".to_string(),
            ]
        );
        assert!(listing.to_plaintext().starts_with("0: <s> ::="));
    }

    #[test]
    fn first_follow_listing() {
        let g = Grammar::parse("<s> ::= \"a\" <s> | \"\"").unwrap();

        assert_eq!(
            g.to_non_terminal_output_vec().to_plaintext(),
            "s | true | a, ε | <eof>"
        );
        assert_eq!(
            g.to_non_terminal_output_vec().to_json(),
            r#"{"data":[{"name":"s","nullable":true,"first":["a","ε"],"follow":["<eof>"]}]}"#
        );
    }

    #[test]
    fn ll1_table_plaintext() {
        let g = Grammar::parse("<s> ::= \"a\" <s> | \"\"").unwrap();
        let t = g.generate_ll1_parsing_table();

        assert_eq!(t.to_plaintext(&g), "  | a | <eof>\ns | 0 |     1");
    }

    #[test]
    fn slr_table_marks_conflicts() {
        let g = Grammar::parse(r#"<s> ::= "if" <s> | "if" <s> "else" <s> | "x""#).unwrap();
        let t = g.generate_slr_parsing_table();

        assert!(t.to_plaintext(&g).contains("/r0"));
        assert!(t.to_latex(&g).contains("\\color{red}"));
        assert!(t.conflicts[0].to_plaintext(&g).starts_with("SLR conflict in state"));
    }
}
