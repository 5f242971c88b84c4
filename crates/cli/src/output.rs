use anyhow::Result;
use huename_color::NamedColor;
use std::io::{self, Write};

pub const EMPTY_MESSAGE: &str = "No colors for this saturation and lightness.";

/// Write one line to stdout. Returns `false` once the reader has gone away
/// (broken pipe), so callers can stop producing output.
pub fn print_stdout(text: &str) -> Result<bool> {
    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(false);
        }
        return Err(err.into());
    }
    Ok(true)
}

/// `#hex  name  hsl(h, s%, l%)`
pub fn format_text(color: &NamedColor) -> String {
    format!("{}  {}  {}", color.hex, color.name, color.hsl)
}

pub fn format_line(color: &NamedColor, json: bool) -> Result<String> {
    if json {
        Ok(serde_json::to_string(color)?)
    } else {
        Ok(format_text(color))
    }
}
