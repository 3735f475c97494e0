//! Helper macro for closed string enums stored and sent as snake_case names.

/// Error returned when parsing a name outside an enum's closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what}: {value}")]
pub struct UnknownVariant {
    what: &'static str,
    value: String,
}

impl UnknownVariant {
    pub(crate) fn new(what: &'static str, value: &str) -> Self {
        Self {
            what,
            value: value.to_owned(),
        }
    }
}

macro_rules! wire_enum {
    (
        $(#[$outer:meta])*
        pub enum $name:ident ($what:literal) {
            $( $(#[$meta:meta])* $variant:ident => $wire:literal ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        pub enum $name {
            $( $(#[$meta])* #[serde(rename = $wire)] $variant ),*
        }

        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            /// Wire name.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),*
                }
            }

            /// Wire names of every variant, for enum schema rules.
            pub fn wire_names() -> impl Iterator<Item = &'static str> {
                Self::ALL.iter().map(|variant| variant.as_str())
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::domain::UnknownVariant;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|variant| variant.as_str() == value)
                    .ok_or_else(|| $crate::domain::UnknownVariant::new($what, value))
            }
        }
    };
}

pub(crate) use wire_enum;

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    wire_enum! {
        pub enum Shade ("shade") {
            Light => "light",
            DarkGrey => "dark_grey",
        }
    }

    #[rstest]
    #[case("light", Ok(Shade::Light))]
    #[case("dark_grey", Ok(Shade::DarkGrey))]
    fn parses_wire_names(#[case] raw: &str, #[case] expected: Result<Shade, ()>) {
        assert_eq!(raw.parse::<Shade>().map_err(|_| ()), expected);
    }

    #[rstest]
    fn rejects_unknown_names_with_context() {
        let err = "DarkGrey".parse::<Shade>().expect_err("case sensitive");
        assert_eq!(err.to_string(), "unknown shade: DarkGrey");
    }

    #[rstest]
    fn serde_uses_wire_names() {
        let value = serde_json::to_value(Shade::DarkGrey).expect("serialise");
        assert_eq!(value, serde_json::json!("dark_grey"));
        assert_eq!(Shade::wire_names().collect::<Vec<_>>(), ["light", "dark_grey"]);
    }
}
