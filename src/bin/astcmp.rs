//! Reads an [`pegrat::ast::Ast`] from each of two files named on the
//! command line and exits `0` if they are structurally equal, `1`
//! otherwise. A read failure on either file is reported as
//! `ERROR: <message>` and the process exits `1`.

use std::fs;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let (Some(path1), Some(path2)) = (args.next(), args.next()) else {
        eprintln!("usage: astcmp <file1> <file2>");
        return ExitCode::from(1);
    };

    let ast1 = match read_ast(&path1) {
        Ok(ast) => ast,
        Err(msg) => {
            println!("ERROR: {}", msg);
            return ExitCode::from(1);
        }
    };
    let ast2 = match read_ast(&path2) {
        Ok(ast) => ast,
        Err(msg) => {
            println!("ERROR: {}", msg);
            return ExitCode::from(1);
        }
    };

    if ast1 == ast2 {
        ExitCode::from(0)
    } else {
        ExitCode::from(1)
    }
}

fn read_ast(path: &str) -> Result<pegrat::ast::Ast, String> {
    let text = fs::read_to_string(path).map_err(|e| e.to_string())?;
    pegrat::io::read(text.trim()).map_err(|e| e.to_string())
}
