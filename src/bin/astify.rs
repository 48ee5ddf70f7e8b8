//! Reads an [`pegrat::ast::Ast`] from stdin (write-format) and writes it
//! back out. A malformed read is reported as `ERROR: <message>` on stdout;
//! the process still exits successfully, matching the original tool this
//! is modeled on.

use std::io::{self, Read};

fn main() {
    env_logger::init();

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .expect("failed to read stdin");

    match pegrat::io::read(input.trim()) {
        Ok(ast) => println!("{}", pegrat::io::write(&ast)),
        Err(err) => println!("ERROR: {}", err),
    }
}
