pub mod color;
pub mod formatter;
pub mod roster_formatter;
