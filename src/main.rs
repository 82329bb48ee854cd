use std::fs;
use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use miette::IntoDiagnostic;
use miette::WrapErr;
use plank::Lexer;

#[derive(Parser, Debug)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print one token per line.
    Tokenize { filename: PathBuf },
    /// Print the parsed figures.
    Parse { filename: PathBuf },
}

fn fail(report: plank::Report, e: impl miette::Diagnostic + Send + Sync + 'static) -> ! {
    eprint!("{report}");
    eprintln!("{:?}", miette::Report::new(e));
    std::process::exit(65);
}

fn main() -> miette::Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Commands::Tokenize { filename } => {
            let file_contents = fs::read_to_string(&filename)
                .into_diagnostic()
                .wrap_err_with(|| format!("reading `{}` failed", filename.display()))?;

            let tokens = match Lexer::new(filename.to_str(), &file_contents).tokenize() {
                Ok(tokens) => tokens,
                Err(e) => fail(e.report().clone(), e),
            };
            for token in tokens {
                println!("{token}");
            }
        }
        Commands::Parse { filename } => {
            let file_contents = fs::read_to_string(&filename)
                .into_diagnostic()
                .wrap_err_with(|| format!("reading `{}` failed", filename.display()))?;

            match plank::parse(filename.to_str(), &file_contents) {
                Ok(ast) => print!("{ast}"),
                Err(e) => fail(e.report().clone(), e),
            }
        }
    }
    Ok(())
}
