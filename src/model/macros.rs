/// String conversions for the crate's snake_case enums.
///
/// Two forms:
///
/// - `string_enum!(Name { Variant => "text", .. })` for a closed enum. Adds
///   `ALL`, `as_str`, `Display`, `FromStr`, `From<Name> for String` and
///   `TryFrom<String>`; unknown strings are an error.
/// - `string_enum!(open Name, "label", { Variant => "text", .. })` for an enum
///   with a trailing `Custom(String)` variant. Unknown strings become
///   `Custom(s)`; only the empty string is rejected.
///
/// Pair either form with `#[serde(into = "String", try_from = "String")]` on the
/// enum to get Serialize/Deserialize through these impls.
macro_rules! string_enum {
    ($name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $str,)+
                }
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($str => Ok($name::$variant),)+
                    other => Err(format!("unknown {}: {other}", stringify!($name))),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        string_enum!(@common $name);
    };

    (open $name:ident, $label:expr, { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $str,)+
                    $name::Custom(s) => s,
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                match s.as_str() {
                    $($str => Ok($name::$variant),)+
                    "" => Err(format!("{} cannot be empty", $label)),
                    _ => Ok($name::Custom(s)),
                }
            }
        }

        string_enum!(@common $name);
    };

    (@common $name:ident) => {
        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<$name> for String {
            fn from(v: $name) -> Self {
                v.as_str().to_string()
            }
        }
    };
}
