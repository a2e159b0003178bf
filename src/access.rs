use std::fmt;

/// What a caller intends to do while holding a lock.
///
/// Only the reader-writer lock lets `Read` acquisitions overlap; every other
/// variant grants the same exclusive access for both kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Access {
    Read,
    Write,
}

impl Access {
    pub fn is_write(self) -> bool { self == Access::Write }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Read => f.write_str("read"),
            Access::Write => f.write_str("write"),
        }
    }
}
