//! Canonical string tables for domain enums.
//!
//! Every enum that crosses a boundary (persistence, JSON, display) gets exactly
//! one table: variant, persisted code, human label. Serde, `Display` and
//! `FromStr` are all derived from that table.

macro_rules! canonical_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => ($code:literal, $label:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(try_from = "String", into = "&'static str")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            /// Persisted / wire code.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $code ),+
                }
            }

            /// Human-readable label.
            pub fn label(self) -> &'static str {
                match self {
                    $( $name::$variant => $label ),+
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl core::str::FromStr for $name {
            type Err = fleetstock_core::DomainError;

            /// Accepts the persisted code or the label, case-insensitively.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(needle) || v.label().eq_ignore_ascii_case(needle))
                    .ok_or_else(|| {
                        fleetstock_core::DomainError::validation(format!(
                            "unknown {} '{}'",
                            stringify!($name),
                            needle
                        ))
                    })
            }
        }

        impl TryFrom<String> for $name {
            type Error = fleetstock_core::DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for &'static str {
            fn from(value: $name) -> Self {
                value.as_str()
            }
        }
    };
}

pub(crate) use canonical_enum;
