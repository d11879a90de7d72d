use std::env;
use std::fs;
use std::process;

use rill::errors::SourceFile;
use rill::lexer::Lexer;
use rill::parser::Parser;

fn print_usage() {
    eprintln!("rill v0.1.0");
    eprintln!("Usage: rill <source.rl> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --tokens     Dump the token stream instead of parsing");
    eprintln!("  --compact    Print the AST as single-line JSON");
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut source_path: Option<String> = None;
    let mut dump_tokens = false;
    let mut compact = false;

    for arg in &args {
        match arg.as_str() {
            "--tokens" => dump_tokens = true,
            "--compact" => compact = true,
            "-h" | "--help" => {
                print_usage();
                return;
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown option: {}", other);
                print_usage();
                process::exit(2);
            }
            other => source_path = Some(other.to_string()),
        }
    }

    let source_path = match source_path {
        Some(p) => p,
        None => {
            print_usage();
            process::exit(2);
        }
    };

    let source = match fs::read_to_string(&source_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", source_path, e);
            process::exit(1);
        }
    };
    let source_file = SourceFile::new(&source_path, &source);

    let tokens = match Lexer::new(&source).tokenize() {
        Ok(tokens) => tokens,
        Err(e) => {
            eprint!("{}", source_file.render(&e));
            process::exit(1);
        }
    };

    if dump_tokens {
        for token in &tokens {
            println!("{} {:?} {:?}", token.loc, token.kind, token.text);
        }
        return;
    }

    let program = match Parser::new(tokens).parse_program() {
        Ok(program) => program,
        Err(e) => {
            eprint!("{}", source_file.render(&e));
            process::exit(1);
        }
    };

    let json = if compact {
        serde_json::to_string(&program)
    } else {
        serde_json::to_string_pretty(&program)
    };
    match json {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("Error serializing AST: {}", e);
            process::exit(1);
        }
    }
}
