use crate::error::{GrammarError, SyntaxErrorKind};
use crate::Grammar;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawItem {
    NonTerminal(String),
    Terminal(String),
}

/// A rule as written, before names are resolved. Repeated rule names are merged.
#[derive(Debug, Clone)]
pub struct RawRule {
    pub name: String,
    pub alternatives: Vec<Vec<RawItem>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    LineStart,
    RuleNameStart,
    RuleName,
    AfterRuleName,
    Colon,
    DoubleColon,
    ItemStart,
    ItemNameStart,
    ItemName,
    AfterItem,
    Literal,
    Escape,
    Comment,
}

fn is_symbol_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn rule_entry(rules: &mut Vec<RawRule>, name: &str) -> usize {
    if let Some(idx) = rules.iter().position(|r| r.name == name) {
        return idx;
    }
    rules.push(RawRule {
        name: name.to_string(),
        alternatives: Vec::new(),
    });
    rules.len() - 1
}

fn push_item(rules: &mut [RawRule], current: Option<usize>, item: RawItem) {
    if let Some(alternative) = current.and_then(|idx| rules[idx].alternatives.last_mut()) {
        alternative.push(item);
    }
}

fn new_alternative(rules: &mut [RawRule], current: Option<usize>) {
    if let Some(idx) = current {
        rules[idx].alternatives.push(Vec::new());
    }
}

impl Grammar {
    /// Parses `<name> ::= alt1 | alt2 ;comment` lines. Items are `<rule>` or `"terminal"`
    /// (`\n` escapes a newline), `""` is epsilon, and a line starting with `|` continues
    /// the previous rule.
    pub fn parse(grammar: &str) -> Result<Self, GrammarError> {
        use SyntaxErrorKind::*;

        let mut rules: Vec<RawRule> = Vec::new();
        let mut current: Option<usize> = None;
        let mut name = String::new();
        let mut state = State::LineStart;
        let (mut line, mut column) = (1, 0);

        for c in grammar.chars() {
            column += 1;
            let error = |kind: SyntaxErrorKind| GrammarError::Syntax { line, column, kind };

            state = match state {
                State::LineStart => match c {
                    '<' => {
                        name.clear();
                        State::RuleNameStart
                    }
                    '|' if current.is_some() => {
                        new_alternative(&mut rules, current);
                        State::ItemStart
                    }
                    '|' => return Err(error(DanglingAlternative)),
                    ';' => State::Comment,
                    c if c.is_whitespace() => State::LineStart,
                    _ => return Err(error(RuleStart)),
                },
                State::RuleNameStart | State::RuleName => match c {
                    c if is_symbol_char(c) => {
                        name.push(c);
                        State::RuleName
                    }
                    '>' if state == State::RuleNameStart => return Err(error(EmptyName)),
                    '>' => {
                        let idx = rule_entry(&mut rules, &name);
                        current = Some(idx);
                        new_alternative(&mut rules, current);
                        State::AfterRuleName
                    }
                    _ => return Err(error(SymbolChar)),
                },
                State::AfterRuleName => match c {
                    ':' => State::Colon,
                    c if c.is_whitespace() && c != '\n' => State::AfterRuleName,
                    _ => return Err(error(Separator)),
                },
                State::Colon => match c {
                    ':' => State::DoubleColon,
                    _ => return Err(error(Separator)),
                },
                State::DoubleColon => match c {
                    '=' => State::ItemStart,
                    _ => return Err(error(Separator)),
                },
                State::ItemStart | State::AfterItem => match c {
                    '<' => {
                        name.clear();
                        State::ItemNameStart
                    }
                    '"' => {
                        name.clear();
                        State::Literal
                    }
                    c if c.is_whitespace() && c != '\n' => state,
                    '|' if state == State::AfterItem => {
                        new_alternative(&mut rules, current);
                        State::ItemStart
                    }
                    '\n' if state == State::AfterItem => State::LineStart,
                    ';' if state == State::AfterItem => State::Comment,
                    _ => return Err(error(ItemStart)),
                },
                State::ItemNameStart | State::ItemName => match c {
                    c if is_symbol_char(c) => {
                        name.push(c);
                        State::ItemName
                    }
                    '>' if state == State::ItemNameStart => return Err(error(EmptyName)),
                    '>' => {
                        push_item(&mut rules, current, RawItem::NonTerminal(name.clone()));
                        State::AfterItem
                    }
                    _ => return Err(error(SymbolChar)),
                },
                State::Literal => match c {
                    '\n' => return Err(error(UnterminatedLiteral)),
                    '\\' => State::Escape,
                    '"' => {
                        push_item(&mut rules, current, RawItem::Terminal(name.clone()));
                        State::AfterItem
                    }
                    c => {
                        name.push(c);
                        State::Literal
                    }
                },
                State::Escape => {
                    name.push(if c == 'n' { '\n' } else { c });
                    State::Literal
                }
                State::Comment => match c {
                    '\n' => State::LineStart,
                    _ => State::Comment,
                },
            };

            if c == '\n' {
                line += 1;
                column = 0;
            }
        }

        match state {
            State::LineStart | State::AfterItem | State::Comment => Grammar::build(rules),
            State::Literal | State::Escape => Err(GrammarError::Syntax {
                line,
                column,
                kind: UnterminatedLiteral,
            }),
            _ => Err(GrammarError::Syntax {
                line,
                column,
                kind: Incomplete,
            }),
        }
    }
}
