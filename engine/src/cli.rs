//! Utility module for command line interfaces

use std::{error::Error, fmt, fmt::Display};

/// An error struct to wrap simple static error messages
#[derive(Debug)]
pub struct CliErr(pub &'static str);

impl Display for CliErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Error for CliErr {}

/// Parse the core factor argument of the contraction tools.
/// Missing argument means full contraction.
pub fn parse_core_factor(arg: Option<String>) -> Result<f64, Box<dyn Error>> {
    let core_factor = match arg {
        Some(arg) => arg.parse::<f64>()?,
        None => 1.0,
    };
    if !(0.0..=1.0).contains(&core_factor) {
        return Err(Box::new(CliErr("core factor has to be in [0, 1]")));
    }
    Ok(core_factor)
}
