//! Macro for implementing Display and FromStr for status enums
//!
//! Eliminates boilerplate for the string conversions the database layer
//! needs, with case-insensitive parsing and a consistent stored
//! representation.
//!
//! # Example
//!
//! ```rust
//! use cadence_domain::impl_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum PlanStatus {
//!     ClosingPending,
//!     Closed,
//!     Rejected,
//! }
//!
//! impl_status_conversions!(PlanStatus {
//!     ClosingPending => "closing_pending",
//!     Closed => "closed",
//!     Rejected => "rejected",
//! });
//! ```

/// Implements Display and FromStr traits for status enums
///
/// Generated Display writes the canonical lowercase string; FromStr parses
/// case-insensitively and reports the enum name on failure.
#[macro_export]
macro_rules! impl_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => ::std::result::Result::Ok(Self::$variant),)+
                    _ => ::std::result::Result::Err(format!("invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum SampleStatus {
        Open,
        Closed,
    }

    impl_status_conversions!(SampleStatus {
        Open => "open",
        Closed => "closed",
    });

    #[test]
    fn display_writes_canonical_string() {
        assert_eq!(SampleStatus::Open.to_string(), "open");
        assert_eq!(SampleStatus::Closed.to_string(), "closed");
    }

    #[test]
    fn parsing_is_case_insensitive() {
        assert_eq!(SampleStatus::from_str("OPEN").unwrap(), SampleStatus::Open);
        assert_eq!(SampleStatus::from_str("Closed").unwrap(), SampleStatus::Closed);
    }

    #[test]
    fn invalid_input_names_the_enum() {
        let err = SampleStatus::from_str("unknown").unwrap_err();
        assert!(err.contains("SampleStatus"));
    }

    #[test]
    fn round_trip_is_stable() {
        for status in [SampleStatus::Open, SampleStatus::Closed] {
            assert_eq!(SampleStatus::from_str(&status.to_string()).unwrap(), status);
        }
    }
}
