use std::io::{self, Write};

use crate::tally::CountTable;

/// Separator between address and count, as in "10.0.0.1: 3".
const SEPARATOR: &[u8] = b": ";

pub struct Report<'a> {
    table: &'a CountTable,
}

impl<'a> Report<'a> {
    pub fn new(table: &'a CountTable) -> Self {
        Self { table }
    }

    /// One line per distinct address, in first-seen order. No header.
    pub fn print_counts(&self, writer: &mut dyn Write) -> io::Result<()> {
        for (address, count) in self.table.iter() {
            self.write_address(writer, address)?;
            self.write(writer, SEPARATOR)?;
            self.write_count(writer, count)?;
        }
        Ok(())
    }

    #[inline]
    fn write(&self, writer: &mut dyn Write, value: &[u8]) -> io::Result<()> {
        writer.write_all(value)
    }

    #[inline]
    fn write_address(
        &self,
        writer: &mut dyn Write,
        address: &str,
    ) -> io::Result<()> {
        writer.write_all(address.as_bytes())
    }

    #[inline]
    fn write_count(
        &self,
        writer: &mut dyn Write,
        count: u64,
    ) -> io::Result<()> {
        writer.write_all(format!("{count}\n").as_bytes())
    }
}
