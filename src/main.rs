use gram_gen::{Code, Generator, Verbosity};
use std::env;
use std::fs;
use std::process;
use std::str::FromStr;

fn main() {
    let args: Vec<String> = env::args().collect();
    let mut grammar_path: Option<String> = None;
    let mut out_path: Option<String> = None;
    let mut verbosity = Verbosity::Warning;

    let mut index = 1;
    while index < args.len() {
        match args[index].as_str() {
            "--out" => {
                index += 1;
                out_path = args.get(index).cloned();
            }
            "--verbose" => {
                index += 1;
                verbosity = match args.get(index).map(|label| Verbosity::from_str(label)) {
                    Some(Ok(level)) => level,
                    _ => {
                        eprintln!("--verbose expects one of: error, warning, success, debug1, info, debug2, debug3, all");
                        process::exit(2);
                    }
                };
            }
            other if grammar_path.is_none() => grammar_path = Some(other.to_string()),
            other => {
                eprintln!("Unexpected argument '{}'.", other);
                process::exit(2);
            }
        }
        index += 1;
    }

    let (grammar_path, out_path) = match (grammar_path, out_path) {
        (Some(grammar_path), Some(out_path)) => (grammar_path, out_path),
        _ => {
            eprintln!("Usage: gram-gen <grammar_path> --out <output_path> [--verbose <level>]");
            process::exit(2);
        }
    };

    let text = match fs::read(&grammar_path) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("Cannot read {}: {}", grammar_path, err);
            process::exit(1);
        }
    };

    let generator = Generator::new(verbosity);
    match generator.compile(&Code::new(&text)) {
        Ok(source) => {
            if let Err(err) = fs::write(&out_path, source) {
                eprintln!("Cannot write {}: {}", out_path, err);
                process::exit(1);
            }
        }
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    }
}
