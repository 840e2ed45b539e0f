use std::{fs, io::Read, path::PathBuf};

use clap::{Parser as _, ValueEnum};
use parse_tree_stepper::{
    parser::recursive_descent::Procedures, Grammar, Parser, Status, Strategy,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Output {
    /// Productions
    #[value(name = "prod")]
    Productions,
    /// Nullable first and follow
    #[value(name = "nff")]
    NullableFirstFollow,
    /// LL(1) parsing table
    #[value(name = "ll1")]
    LL1Table,
    /// LR(0) automaton
    #[value(name = "lr0fsm")]
    LR0Automaton,
    /// SLR(1) parsing table
    #[value(name = "slr")]
    SLRTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Engine {
    /// LL(1) recursive descent
    Rd,
    /// LL(1) table-driven
    Ll1,
    /// SLR(1) table-driven
    Slr,
}

impl From<Engine> for Strategy {
    fn from(engine: Engine) -> Self {
        match engine {
            Engine::Rd => Strategy::RecursiveDescent,
            Engine::Ll1 => Strategy::LL1,
            Engine::Slr => Strategy::SLR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Plain,
    Latex,
    Json,
}

/// Analyse a BNF grammar and step a parser through a source file.
#[derive(Debug, clap::Parser)]
#[command(version, about)]
struct Args {
    /// Grammar file, read from stdin when omitted
    grammar: Option<PathBuf>,

    /// Analysis outputs to print
    #[arg(short, long, value_enum, value_delimiter = ',')]
    print: Vec<Output>,

    /// Engine to step through the source file
    #[arg(short, long, value_enum, requires = "source")]
    engine: Option<Engine>,

    /// Source file to parse
    #[arg(short, long)]
    source: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Plain)]
    format: OutputFormat,

    /// Give up after this many steps
    #[arg(long, default_value_t = 10_000)]
    max_steps: usize,
}

fn print_outputs(g: &Grammar, outputs: &[Output], format: OutputFormat) -> serde_json::Result<()> {
    for output in outputs {
        let text = match output {
            Output::Productions => {
                let t = g.to_production_output_vec();
                match format {
                    OutputFormat::Plain => t.to_plaintext(),
                    OutputFormat::Latex => t.to_latex(),
                    OutputFormat::Json => serde_json::to_string(&t)?,
                }
            }
            Output::NullableFirstFollow => {
                let t = g.to_non_terminal_output_vec();
                match format {
                    OutputFormat::Plain => t.to_plaintext(),
                    OutputFormat::Latex => t.to_latex(),
                    OutputFormat::Json => t.to_json(),
                }
            }
            Output::LL1Table => {
                let t = g.generate_ll1_parsing_table();
                match format {
                    OutputFormat::Plain => t.to_plaintext(g),
                    OutputFormat::Latex => t.to_latex(g),
                    OutputFormat::Json => serde_json::to_string(&t)?,
                }
            }
            Output::LR0Automaton => {
                let t = g.to_lr0_fsm();
                match format {
                    OutputFormat::Plain => t.to_plaintext(g),
                    OutputFormat::Latex => t.to_latex(g),
                    OutputFormat::Json => serde_json::to_string(&t)?,
                }
            }
            Output::SLRTable => {
                let t = g.generate_slr_parsing_table();
                match format {
                    OutputFormat::Plain => t.to_plaintext(g),
                    OutputFormat::Latex => t.to_latex(g),
                    OutputFormat::Json => serde_json::to_string(&t)?,
                }
            }
        };
        println!("{}", text);
    }
    Ok(())
}

fn print_step(parser: &dyn Parser, step: usize, listing: Option<&Procedures>) {
    let g = parser.grammar();
    let highlight = parser.highlight();

    println!("step {}: {:?}", step, parser.status());
    println!("  stack: {}", parser.stack_to_string());
    println!("  input: {}", parser.input_to_string());
    if let Some(line) = highlight.line {
        let text = match listing {
            Some(listing) => listing.listing[line].trim().to_string(),
            None => g.production_to_plaintext(line),
        };
        println!("  line {}: {}", line, text);
    }
    if let Some((row, column)) = highlight.cell {
        println!("  cell: ({}, {})", row, column);
    }
    if let Some(root) = parser.tree().root() {
        println!("  tree: {}", parser.tree().to_bracketed(root));
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let description = match &args.grammar {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let g = Grammar::parse(&description)?;
    print_outputs(&g, &args.print, args.format)?;

    let (Some(engine), Some(source)) = (args.engine, &args.source) else {
        return Ok(());
    };

    let strategy = Strategy::from(engine);
    for conflict in strategy.conflicts(&g) {
        eprintln!("warning: {}", conflict);
    }
    let listing = (engine == Engine::Rd).then(|| Procedures::new(&g));
    if let (Some(listing), OutputFormat::Plain) = (&listing, args.format) {
        println!("{}\n", listing.listing.join("\n"));
    }

    let mut parser = strategy.load(&description, &fs::read_to_string(source)?)?;
    let mut steps = 0;
    while steps < args.max_steps && !parser.status().is_finished() {
        parser.step();
        steps += 1;
        match args.format {
            OutputFormat::Json => println!("{}", serde_json::to_string(&parser.snapshot())?),
            _ => print_step(parser.as_ref(), steps, listing.as_ref()),
        }
    }

    if parser.status() == Status::Running {
        eprintln!("stopped after {} steps", steps);
    }
    Ok(())
}
