//! Code generation targets.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::AfError;

/// Target syntax for generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Dialect {
    /// ANSI C expressions and statements.
    #[default]
    C,
    /// Fixed-form Fortran.
    Fortran,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::C => f.write_str("c"),
            Dialect::Fortran => f.write_str("fortran"),
        }
    }
}

impl FromStr for Dialect {
    type Err = AfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" | "ansi-c" | "ansic" => Ok(Dialect::C),
            "fortran" | "f77" | "ftn" => Ok(Dialect::Fortran),
            _ => Err(AfError::InvalidArg {
                what: "unknown code dialect",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialect_names() {
        assert_eq!("C".parse::<Dialect>().unwrap(), Dialect::C);
        assert_eq!("Fortran".parse::<Dialect>().unwrap(), Dialect::Fortran);
        assert!("cobol".parse::<Dialect>().is_err());
        assert_eq!(Dialect::Fortran.to_string(), "fortran");
    }
}
