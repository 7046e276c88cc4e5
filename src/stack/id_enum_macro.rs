/// Defines a closed identifier enum with a stable serde key, a display name and
/// lookup aliases.
///
/// ```ignore
/// define_id_enum! {
///     LanguageId {
///         Python => "python" : "Python" | "py",
///     }
/// }
/// ```
#[macro_export]
macro_rules! define_id_enum {
    (
        $(#[$enum_meta:meta])*
        $enum_name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $serde_name:literal : $display_name:literal
                $( | $alias:literal )*
            ),* $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $enum_name {
            $(
                $(#[$variant_meta])*
                #[serde(rename = $serde_name)]
                $variant,
            )*
        }

        impl $enum_name {
            /// Stable lowercase key used in serialized output and on the command line
            pub fn key(&self) -> &'static str {
                match self {
                    $(
                        Self::$variant => $serde_name,
                    )*
                }
            }

            pub fn name(&self) -> &'static str {
                match self {
                    $(
                        Self::$variant => $display_name,
                    )*
                }
            }

            /// Case-insensitive lookup by key or alias
            pub fn from_name(name: &str) -> Option<Self> {
                match name.trim().to_ascii_lowercase().as_str() {
                    $(
                        $serde_name $(| $alias)* => Some(Self::$variant),
                    )*
                    _ => None,
                }
            }

            /// Every key and alias that `from_name` accepts
            pub fn accepted_names() -> &'static [&'static str] {
                &[
                    $(
                        $serde_name, $( $alias, )*
                    )*
                ]
            }

            pub fn all_variants() -> &'static [Self] {
                &[
                    $(
                        Self::$variant,
                    )*
                ]
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.name())
            }
        }
    };
}
