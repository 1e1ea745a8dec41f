//! Helpers shared by the line-oriented inputs

/// Strip a trailing `\n` or `\r\n`
pub(crate) fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
