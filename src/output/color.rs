use std::io::{self, Write};
use termcolor::{Buffer, Color, ColorSpec, WriteColor};

/// Buffers human-readable output, colored unless disabled by flag or `NO_COLOR`.
pub struct ColorWriter {
    buffer: Buffer,
    no_color: bool,
}

impl ColorWriter {
    pub fn new(no_color: bool) -> Self {
        let colors_enabled = !no_color && std::env::var("NO_COLOR").is_err();

        Self {
            buffer: if colors_enabled {
                Buffer::ansi()
            } else {
                Buffer::no_color()
            },
            no_color: !colors_enabled,
        }
    }

    pub fn into_string(self) -> io::Result<String> {
        String::from_utf8(self.buffer.into_inner())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn styled(&mut self, text: &str, spec: &ColorSpec) -> io::Result<()> {
        if !self.no_color {
            self.buffer.set_color(spec)?;
        }
        write!(self.buffer, "{}", text)?;
        if !self.no_color {
            self.buffer.reset()?;
        }
        Ok(())
    }

    pub fn print_colored(&mut self, text: &str, color: Color) -> io::Result<()> {
        self.styled(text, ColorSpec::new().set_fg(Some(color)))
    }

    pub fn print_bold(&mut self, text: &str) -> io::Result<()> {
        self.styled(text, ColorSpec::new().set_bold(true))
    }

    /// Bold cyan line followed by a rule of the same width.
    pub fn print_header(&mut self, text: &str) -> io::Result<()> {
        self.styled(text, ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
        writeln!(self.buffer)?;
        self.print_colored(&"─".repeat(text.chars().count()), Color::White)?;
        writeln!(self.buffer)
    }

    pub fn print_field(&mut self, label: &str, value: &str) -> io::Result<()> {
        self.print_colored(label, Color::Blue)?;
        writeln!(self.buffer, ": {}", value)
    }

    pub fn print_dim(&mut self, text: &str) -> io::Result<()> {
        self.styled(text, ColorSpec::new().set_dimmed(true))
    }

    pub fn write(&mut self, text: &str) -> io::Result<()> {
        write!(self.buffer, "{}", text)
    }

    pub fn writeln(&mut self) -> io::Result<()> {
        writeln!(self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_color_output_is_plain() {
        let mut writer = ColorWriter::new(true);
        writer.print_header("Users (2)").unwrap();
        writer.print_field("Grade", "3").unwrap();

        let out = writer.into_string().unwrap();
        assert_eq!(out, "Users (2)\n─────────\nGrade: 3\n");
    }
}
