pub mod first_follow;
pub mod grammar;
pub mod lexer;
pub mod ll1_table;
pub mod lr_dfa;
pub mod parse;
pub mod pretty_print;
pub mod slr_table;

pub use grammar::{Grammar, NonTerminal, Symbol};
pub use lexer::Token;

/// Display spelling of the empty production.
pub const EPSILON: &str = "ε";
/// Terminal appended to every token stream; also the end-of-input marker in FOLLOW sets.
pub const END_MARK: &str = "<eof>";
pub const IDENTIFIER: &str = "<id>";
pub const INTEGER_LITERAL: &str = "<i_lit>";

/// Terminals the lexer produces by pattern rather than by spelling.
pub const SPECIAL_TERMINALS: [&str; 3] = [END_MARK, IDENTIFIER, INTEGER_LITERAL];
