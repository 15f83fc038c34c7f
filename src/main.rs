use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor};
use simplescript::config::{VERSION, WELCOME_FOOTER, WELCOME_MESSAGE, WELCOME_SUBTITLE};
use simplescript::error::Diagnostic;
use simplescript::{context, eval, fresh_top_level, lexer, parser};
use std::path::PathBuf;
use std::rc::Rc;

/// A small dynamically-typed scripting language with a tree-walking evaluator
#[derive(Parser, Debug)]
#[command(name = "simplescript")]
#[command(version = VERSION)]
#[command(about = "SimpleScript interpreter")]
struct CliArgs {
    /// Script file to execute (optional - if not provided, starts the REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    if let Some(script_path) = args.script {
        run_script(&script_path)?;
        return Ok(());
    }

    run_repl()
}

/// Reads `path`, lexes, parses, and evaluates it once. Scripts don't print
/// their result value; a formatted diagnostic is printed and the process
/// exits non-zero on failure.
fn run_script(path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read script file {}: {}", path.display(), e))?;
    let file_name: Rc<str> = Rc::from(path.display().to_string());
    let context = fresh_top_level();

    if let Err(report) = lex_parse_eval(file_name, Rc::from(source.as_str()), &context) {
        eprintln!("{report}");
        std::process::exit(1);
    }

    Ok(())
}

fn lex_parse_eval(
    file_name: Rc<str>,
    source: Rc<str>,
    context: &Rc<context::Context>,
) -> Result<simplescript::value::Value, String> {
    let tokens = lexer::tokenize(file_name, source).map_err(|e| e.report())?;
    let ast = parser::parse(tokens).map_err(|e| e.report())?;
    eval::run(&ast, context).map_err(|e| e.report())
}

fn run_repl() -> Result<(), Box<dyn std::error::Error>> {
    let context = fresh_top_level();

    let config = Config::builder().auto_add_history(true).build();
    let mut rl = DefaultEditor::with_config(config)
        .map_err(|e| format!("Failed to initialize REPL: {e}"))?;

    let history_file = ".simplescript_history";
    let _ = rl.load_history(history_file);

    println!("{WELCOME_MESSAGE}");
    println!("{WELCOME_SUBTITLE}");
    println!("{WELCOME_FOOTER}");

    let mut line_no = 0usize;
    loop {
        let readline = rl.readline("simplescript> ");

        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }

                line_no += 1;
                let file_name: Rc<str> = Rc::from(format!("<repl:{line_no}>"));
                match lex_parse_eval(file_name, Rc::from(line.as_str()), &context) {
                    Ok(value) => println!("=> {value}"),
                    Err(report) => eprintln!("{report}"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
    Ok(())
}
