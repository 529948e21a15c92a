use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use jaslang_core::scripts::{load_scripts, read_script};
use jaslang_core::{Evaluator, Lexer, Root, parse_source};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// Execute the script
    Run,
    /// Print the parsed syntax tree
    Ast,
    /// Print the lexeme stream
    Tokens,
}

/// Runs jaslang scripts.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Script file or directory of `.jas` scripts; reads stdin when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "run")]
    emit: Emit,

    #[arg(short, long, help = "Print progress notes to stderr")]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    execute(cli)
}

fn execute(cli: Cli) -> Result<()> {
    let sources: Vec<(PathBuf, String)> = match &cli.input {
        Some(path) if path.is_dir() => load_scripts(path)
            .with_context(|| format!("failed to read scripts under {}", path.display()))?
            .into_iter()
            .map(|script| (path.join(script.path), script.contents))
            .collect(),
        Some(path) => {
            let contents = read_script(path)
                .with_context(|| format!("failed to read input file {}", path.display()))?;
            vec![(path.clone(), contents)]
        }
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            vec![(PathBuf::from("<stdin>"), buffer)]
        }
    };

    for (path, source) in &sources {
        process(&cli, path, source)?;
    }

    Ok(())
}

fn process(cli: &Cli, path: &Path, source: &str) -> Result<()> {
    if cli.verbose {
        eprintln!("{}: {:?}", path.display(), cli.emit);
    }

    match cli.emit {
        Emit::Tokens => {
            for lexeme in Lexer::new(source) {
                println!("{:>5} {:<10} {:?}", lexeme.start, lexeme.kind, lexeme.text);
            }
        }
        Emit::Ast => println!("{:#?}", parse(cli, path, source)?),
        Emit::Run => {
            let root = parse(cli, path, source)?;
            // Every script gets its own symbol table.
            let mut evaluator = Evaluator::new(io::stdin(), io::stdout(), io::stderr());
            evaluator
                .evaluate(&root)
                .with_context(|| format!("failed to run {}", path.display()))?;
        }
    }

    Ok(())
}

fn parse(cli: &Cli, path: &Path, source: &str) -> Result<Root> {
    let root = parse_source(source).with_context(|| format!("failed to parse {}", path.display()))?;
    if cli.verbose {
        eprintln!("{}: parsed {} statement(s)", path.display(), root.statements.len());
    }
    Ok(root)
}
