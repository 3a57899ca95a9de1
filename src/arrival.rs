use std::{
    fs::OpenOptions,
    io::{self, Write},
    path::Path,
};

use crate::{constants::EOT_MARKER, seq::SeqNum};

/// Line-per-packet record of arrivals in processing order. Diagnostic only.
pub struct ArrivalLog {
    out: Box<dyn Write + Send>,
}

impl std::fmt::Debug for ArrivalLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArrivalLog").finish_non_exhaustive()
    }
}

impl ArrivalLog {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self { out: Box::new(out) }
    }

    /// Creates a fresh log file at `path`.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::new(file))
    }

    /// Discards all records.
    pub fn disabled() -> Self {
        Self::new(io::sink())
    }

    pub fn record(&mut self, seq: SeqNum) -> io::Result<()> {
        writeln!(self.out, "{seq}")?;
        self.out.flush()
    }

    pub fn record_eot(&mut self) -> io::Result<()> {
        writeln!(self.out, "{EOT_MARKER}")?;
        self.out.flush()
    }
}
