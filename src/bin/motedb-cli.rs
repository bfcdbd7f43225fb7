//! Interactive SQL shell for the engine. Reads statements from stdin,
//! accumulating lines until a `;`-terminated statement is complete, and
//! prints either the resulting rows or the status message.

use relstore::{Engine, EngineConfig};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> relstore::Result<()> {
    let args: Vec<String> = env::args().collect();
    let path = match args.len() {
        1 => PathBuf::from("./data"),
        2 if args[1] == "--version" || args[1] == "-v" => {
            println!("relstore v{}", VERSION);
            return Ok(());
        }
        2 if args[1] == "--help" || args[1] == "-h" => {
            print_help();
            return Ok(());
        }
        2 => PathBuf::from(&args[1]),
        _ => {
            print_help();
            std::process::exit(1);
        }
    };

    println!("relstore v{} -- database: {}", VERSION, path.display());
    println!("type SQL statements terminated by ';'; '.exit' to quit\n");

    let mut engine = Engine::new(EngineConfig::new(path))?;
    let stdin = io::stdin();
    let mut line = String::new();
    let mut pending = String::new();

    loop {
        print!("{}", if pending.is_empty() { "sql> " } else { "  -> " });
        io::stdout().flush().ok();

        line.clear();
        if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let trimmed = line.trim();

        if pending.is_empty() && (trimmed == ".exit" || trimmed == ".quit") {
            break;
        }
        if trimmed.is_empty() {
            continue;
        }

        pending.push_str(&line);
        if !trimmed.ends_with(';') {
            continue;
        }

        match engine.execute_sql(&pending) {
            Ok((Some(result), _)) => print_result(&result),
            Ok((None, message)) => println!("{}", message),
            Err(e) => eprintln!("error: {}", e),
        }
        pending.clear();
    }

    Ok(())
}

fn print_result(result: &relstore::QueryResult) {
    println!("{}", result.columns.join(" | "));
    for row in &result.records {
        let cells: Vec<String> = row.iter().map(|v| format!("{:?}", v)).collect();
        println!("{}", cells.join(" | "));
    }
    println!("({} row(s))", result.records.len());
}

fn print_help() {
    println!(
        "relstore v{}\n\n\
         usage:\n  \
         relstore                open ./data (or create it) and start the shell\n  \
         relstore <db_path>      open a specific database directory\n  \
         relstore --version      print the version\n  \
         relstore --help         print this message\n",
        VERSION
    );
}
