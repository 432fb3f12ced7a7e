//! The four-valued fault-handling verdict and its join-semilattice.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fault-handling classification of a file or repository.
///
/// `None` is bottom, `Basic ⊔ Advanced = Both`, `Both` absorbs everything.
/// Aggregation must always go through [`Verdict::join`] (or `|`), never
/// plain assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[default]
    None,
    Basic,
    Advanced,
    Both,
}

impl Verdict {
    pub const ALL: [Verdict; 4] = [Verdict::None, Verdict::Basic, Verdict::Advanced, Verdict::Both];

    /// Build a verdict from the two detection flags every capability reports.
    pub fn from_flags(has_basic: bool, has_advanced: bool) -> Self {
        match (has_basic, has_advanced) {
            (true, true) => Verdict::Both,
            (true, false) => Verdict::Basic,
            (false, true) => Verdict::Advanced,
            (false, false) => Verdict::None,
        }
    }

    /// Least upper bound of two verdicts.
    pub fn join(self, other: Verdict) -> Verdict {
        Verdict::from_flags(
            self.has_basic() || other.has_basic(),
            self.has_advanced() || other.has_advanced(),
        )
    }

    pub fn has_basic(self) -> bool {
        matches!(self, Verdict::Basic | Verdict::Both)
    }

    pub fn has_advanced(self) -> bool {
        matches!(self, Verdict::Advanced | Verdict::Both)
    }

    /// True for anything above bottom.
    pub fn is_signal(self) -> bool {
        self != Verdict::None
    }

    /// Name used in the output table's `Exception Type` column.
    pub fn name(&self) -> &'static str {
        match self {
            Verdict::None => "None",
            Verdict::Basic => "Basic",
            Verdict::Advanced => "Advanced",
            Verdict::Both => "Both",
        }
    }

    /// Recommendation text, derived 1:1 from the verdict.
    pub fn recommendation(&self) -> &'static str {
        match self {
            Verdict::Both => "The codebase has basic and advanced exception handling.",
            Verdict::Advanced => "The codebase has advanced exception handling.",
            Verdict::Basic => "Basic exception handling detected. Consider enhancements.",
            Verdict::None => {
                "No exception handling detected. Consider adding exception handling."
            }
        }
    }
}

impl BitOr for Verdict {
    type Output = Verdict;

    fn bitor(self, rhs: Verdict) -> Verdict {
        self.join(rhs)
    }
}

impl BitOrAssign for Verdict {
    fn bitor_assign(&mut self, rhs: Verdict) {
        *self = self.join(rhs);
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string is not one of the four verdict names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown verdict: {0}")]
pub struct UnknownVerdict(pub String);

impl FromStr for Verdict {
    type Err = UnknownVerdict;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verdict::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVerdict(s.to_string()))
    }
}
