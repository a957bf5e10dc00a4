use lc3vm::{Config, VmError};
use std::process;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    let config = match Config::from_args(&args) {
        Ok(config) => config,
        Err(err) => {
            println!("{}", err);
            process::exit(2);
        }
    };

    if let Err(err) = lc3vm::run(config) {
        println!("{}", err);
        process::exit(exit_code(&err));
    }
}

fn exit_code(err: &VmError) -> i32 {
    match err {
        VmError::UsageError(_) => 2,
        VmError::LoadError { .. } => 1,
        VmError::Io(_) => 1,
    }
}
