use std::io::Write;

use serde::Serialize;

use crate::error::CliError;

pub fn render<T: Serialize>(value: &T, pretty: bool) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    if pretty {
        serde_json::to_writer_pretty(&mut stdout, value)?;
    } else {
        serde_json::to_writer(&mut stdout, value)?;
    }
    writeln!(stdout)?;
    Ok(())
}
