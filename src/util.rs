use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use time::{OffsetDateTime, UtcOffset};

/// Creates `p` and any missing parents. Returns `true` when something was created.
pub fn ensure_dir(p: &Path) -> io::Result<bool> {
    if p.is_dir() {
        return Ok(false);
    }
    std::fs::create_dir_all(p)?;
    Ok(true)
}

/// Single create-write-close; no temp file, no rename.
pub fn write_json_indented<T: Serialize>(path: &Path, value: &T, indent: usize) -> io::Result<()> {
    let indent = " ".repeat(indent);
    let mut buf = Vec::new();
    let fmt = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
    value.serialize(&mut ser).map_err(io::Error::from)?;

    let mut f = File::create(path)?;
    f.write_all(&buf)?;
    f.flush()
}

pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock in the local zone.
///
/// The offset is resolved once, up front: `time` refuses to read it once
/// other threads exist (the log appender spawns one).
#[derive(Debug, Clone, Copy)]
pub struct LocalClock {
    offset: UtcOffset,
}

impl LocalClock {
    pub fn detect() -> Self {
        let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
        Self { offset }
    }

    pub fn offset(&self) -> UtcOffset {
        self.offset
    }
}

impl Clock for LocalClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}
