use std::fmt::{Display, Formatter};
use std::str::FromStr;

use super::Verbosity;

impl Verbosity {
    /// Position of the level on the admission ladder.
    /// `error < warning < success < debug1 < info < debug2 < debug3 < all`.
    pub fn order(&self) -> u8 {
        match self {
            Verbosity::Error => 0,
            Verbosity::Warning => 1,
            Verbosity::Success => 2,
            Verbosity::Debug1 => 3,
            Verbosity::Info => 4,
            Verbosity::Debug2 => 5,
            Verbosity::Debug3 => 6,
            Verbosity::All => 7,
        }
    }

    /// Whether a sink set to self should report a message of the given level.
    pub fn admits(&self, level: Verbosity) -> bool {
        self.order() >= level.order()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verbosity::Error => "error",
            Verbosity::Warning => "warning",
            Verbosity::Success => "success",
            Verbosity::Debug1 => "debug1",
            Verbosity::Info => "info",
            Verbosity::Debug2 => "debug2",
            Verbosity::Debug3 => "debug3",
            Verbosity::All => "all",
        }
    }
}

impl Display for Verbosity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(Verbosity::Error),
            "warning" => Ok(Verbosity::Warning),
            "success" => Ok(Verbosity::Success),
            "debug1" => Ok(Verbosity::Debug1),
            "info" => Ok(Verbosity::Info),
            "debug2" => Ok(Verbosity::Debug2),
            "debug3" => Ok(Verbosity::Debug3),
            "all" => Ok(Verbosity::All),
            other => Err(format!("'{}' is not a verbosity level.", other)),
        }
    }
}
