use crate::error::VmError;
use clap::{App, Arg};
use std::path::PathBuf;

/// Parsed command-line configuration: one or more image paths, loaded in
/// order so a later image overwrites an earlier one wherever they overlap
/// (see `loader::load_image`).
#[derive(Debug, PartialEq)]
pub struct Config {
    pub images: Vec<PathBuf>,
}

impl Config {
    /// Parses `args` (as `std::env::args().collect()` would produce, i.e.
    /// `args[0]` is the program name) independently of clap's own exit/print
    /// behavior, so the "at least one image" policy is unit-testable.
    pub fn from_args(args: &[String]) -> Result<Self, VmError> {
        let matches = App::new("lc3vm")
            .about("An interpreter for the LC-3 instruction set")
            .arg(
                Arg::with_name("IMAGE")
                    .help("Object file(s) to load, in order")
                    .required(true)
                    .multiple(true)
                    .index(1),
            )
            .get_matches_from_safe(args)
            .map_err(|err| VmError::UsageError(err.message))?;

        let images = matches
            .values_of("IMAGE")
            .expect("IMAGE is required")
            .map(PathBuf::from)
            .collect();

        Ok(Config { images })
    }
}
