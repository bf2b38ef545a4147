/// Define a wire enum over `$uint`.
///
/// Every value decodes: ordinals without a named variant become
/// `Unknown(x)` and encode back unchanged.
macro_rules! enum_builder {
    (
        $(#[doc = $comment:literal])*
        #[repr($uint:ty)]
        $enum_vis:vis enum $enum_name:ident
        {
          $( $enum_var:ident => $enum_val:literal),* $(,)?
        }
    ) => {
        $(#[doc = $comment])*
        #[non_exhaustive]
        #[derive(PartialEq, Eq, Clone, Copy)]
        $enum_vis enum $enum_name {
            $( $enum_var, )*
            Unknown($uint),
        }

        impl $enum_name {
            /// The variant name, or `None` for an unknown ordinal.
            #[allow(dead_code)]
            $enum_vis fn as_str(&self) -> Option<&'static str> {
                match self {
                    $( Self::$enum_var => Some(stringify!($enum_var)), )*
                    Self::Unknown(_) => None,
                }
            }
        }

        impl From<$uint> for $enum_name {
            fn from(x: $uint) -> Self {
                match x {
                    $( $enum_val => Self::$enum_var, )*
                    other => Self::Unknown(other),
                }
            }
        }

        impl From<$enum_name> for $uint {
            fn from(value: $enum_name) -> Self {
                match value {
                    $( $enum_name::$enum_var => $enum_val, )*
                    $enum_name::Unknown(x) => x,
                }
            }
        }

        impl Codec<'_> for $enum_name {
            fn encode(&self, bytes: &mut Vec<u8>) {
                <$uint>::from(*self).encode(bytes);
            }

            fn read(r: &mut Reader<'_>) -> Result<Self, crate::error::InvalidMessage> {
                <$uint>::read(r)
                    .map(Self::from)
                    .map_err(|_| crate::error::InvalidMessage::MissingData(stringify!($enum_name)))
            }
        }

        impl core::fmt::Debug for $enum_name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                match self.as_str() {
                    Some(name) => f.write_str(name),
                    None => write!(f, "{}(0x{:x?})", stringify!($enum_name), <$uint>::from(*self)),
                }
            }
        }
    };
}
