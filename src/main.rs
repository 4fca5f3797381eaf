use std::io::Write;
use std::{env, fs, io, process};

use rusty_monkey::interpreter::{evaluate, new_context};

fn main() {
    let args: Vec<String> = env::args().collect();

    match args.len() {
        1 => run_prompt(),
        2 => run_file(&args[1]),
        _ => {
            eprintln!("Usage: monkey [script]");
            process::exit(64);
        }
    }
}

fn run_prompt() {
    println!("This is a monkey evaluator");
    let context = new_context();

    loop {
        print!(">> ");
        io::stdout().flush().expect("Failed to flush stdout.");

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("Failed to read line: {}", e);
                break;
            }
        }

        match evaluate(&line, &context, "repl") {
            Ok(value) => println!("{}", value),
            Err(e) => eprintln!("ERROR: {}", e),
        }
    }

    println!("Bye!");
}

fn run_file(filename: &str) {
    let contents = match fs::read_to_string(filename) {
        Ok(contents) => contents,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    let context = new_context();
    if let Err(e) = evaluate(&contents, &context, filename) {
        eprintln!("ERROR: {}", e);
        process::exit(1);
    }
}
