#[macro_use]
extern crate clap;

use clap::Arg;
use std::fs;
use std::path::PathBuf;
use std::process;

fn main() {
    env_logger::init();

    let matches = app_from_crate!()
        .arg(
            Arg::with_name("SOURCE")
                .help("Source file to assemble")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("OBJECT")
                .help("Object file to write")
                .required(true)
                .index(2),
        )
        .get_matches();

    let source_path = matches.value_of("SOURCE").unwrap();
    let object_path = PathBuf::from(matches.value_of("OBJECT").unwrap());

    if let Err(err) = run(source_path, &object_path) {
        eprintln!("{}", err);
        process::exit(1);
    }
}

#[derive(Debug)]
enum Error {
    ReadSource(std::io::Error),
    Assemble(vasm::Error),
    WriteObject(vexfile::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ReadSource(err) => write!(f, "reading source file failed: {}", err),
            Error::Assemble(err) => write!(f, "assembling source failed: {}", err),
            Error::WriteObject(err) => write!(f, "writing object file failed: {}", err),
        }
    }
}

fn run(source_path: &str, object_path: &PathBuf) -> Result<(), Error> {
    let source = fs::read_to_string(source_path).map_err(Error::ReadSource)?;
    log::info!("assembling {}", source_path);

    let object = vasm::assemble(&source).map_err(Error::Assemble)?;
    log::info!(
        "assembled {} instruction(s), {} memory entr(ies)",
        object.instructions.len(),
        object.memory.len()
    );

    vexfile::write_file(object_path, &object).map_err(Error::WriteObject)?;
    log::info!("wrote object file to {}", object_path.display());

    Ok(())
}
