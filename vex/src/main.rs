#[macro_use]
extern crate clap;

use clap::Arg;
use std::path::Path;
use std::process;

fn main() {
    env_logger::init();

    let matches = app_from_crate!()
        .arg(
            Arg::with_name("OBJECT")
                .help("Object file to run")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("INPUT")
                .help("Input file fed to INPUT")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::with_name("OUTPUT")
                .help("Output file written from OUTPUT")
                .required(true)
                .index(3),
        )
        .get_matches();

    let object_path = Path::new(matches.value_of("OBJECT").unwrap());
    let input_path = Path::new(matches.value_of("INPUT").unwrap());
    let output_path = Path::new(matches.value_of("OUTPUT").unwrap());

    if let Err(err) = vex::run(object_path, input_path, output_path) {
        eprintln!("{}", err);
        process::exit(1);
    }
}
