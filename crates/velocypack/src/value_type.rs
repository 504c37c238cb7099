use core::fmt;

/// The logical type of an encoded value, as determined by its head byte.
///
/// The set is closed: every head byte maps to exactly one variant (reserved
/// bytes map to [`ValueType::None`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueType {
    /// Absent value; also used for reserved head bytes.
    None,
    Null,
    Illegal,
    Bool,
    Double,
    /// Milliseconds since the Unix epoch.
    UtcDate,
    External,
    MinKey,
    MaxKey,
    Int,
    UInt,
    SmallInt,
    String,
    Array,
    Object,
    Binary,
    Bcd,
    Custom,
    Tagged,
}

impl ValueType {
    /// Stable lower-case name, used in error messages and schema dumps.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Null => "null",
            Self::Illegal => "illegal",
            Self::Bool => "bool",
            Self::Double => "double",
            Self::UtcDate => "utc-date",
            Self::External => "external",
            Self::MinKey => "min-key",
            Self::MaxKey => "max-key",
            Self::Int => "int",
            Self::UInt => "uint",
            Self::SmallInt => "smallint",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
            Self::Binary => "binary",
            Self::Bcd => "bcd",
            Self::Custom => "custom",
            Self::Tagged => "tagged",
        }
    }

    /// `true` for [`Int`](Self::Int), [`UInt`](Self::UInt) and
    /// [`SmallInt`](Self::SmallInt).
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Int | Self::UInt | Self::SmallInt)
    }

    /// `true` for arrays and objects.
    #[must_use]
    pub const fn is_compound(self) -> bool {
        matches!(self, Self::Array | Self::Object)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Formats an accepted-type set as `a, b or c`.
pub(crate) struct TypeList<'a>(pub(crate) &'a [ValueType]);

impl fmt::Display for TypeList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.0.len();
        for (i, ty) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(if i + 1 == n { " or " } else { ", " })?;
            }
            f.write_str(ty.name())?;
        }
        Ok(())
    }
}
