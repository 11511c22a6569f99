//! Integer-coded enums that tolerate codes the client does not know yet

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An enum whose variants map one-to-one onto integer wire codes
pub trait WireCode: Sized + Copy {
    fn from_code(code: i64) -> Option<Self>;
    fn code(self) -> i64;
}

/// A wire code that is either a known variant or the raw integer
///
/// Services add codes over time. Parsing never rejects an unknown code; it
/// is kept as [`Code::Raw`] so it survives a round trip and stays
/// distinguishable from the known variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code<T> {
    Known(T),
    Raw(i64),
}

impl<T: WireCode> Code<T> {
    pub fn from_wire(code: i64) -> Self {
        match T::from_code(code) {
            Some(known) => Code::Known(known),
            None => Code::Raw(code),
        }
    }

    pub fn to_wire(self) -> i64 {
        match self {
            Code::Known(known) => known.code(),
            Code::Raw(code) => code,
        }
    }

    pub fn known(self) -> Option<T> {
        match self {
            Code::Known(known) => Some(known),
            Code::Raw(_) => None,
        }
    }

    pub fn is_known(self) -> bool {
        matches!(self, Code::Known(_))
    }
}

impl<T: WireCode> From<T> for Code<T> {
    fn from(value: T) -> Self {
        Code::Known(value)
    }
}

impl<T: WireCode> Default for Code<T> {
    fn default() -> Self {
        Code::from_wire(0)
    }
}

impl<T: WireCode> fmt::Display for Code<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_wire())
    }
}

impl<T: WireCode> Serialize for Code<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.to_wire())
    }
}

impl<'de, T: WireCode> Deserialize<'de> for Code<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Code::from_wire(super::json::as_int(&value).unwrap_or(0)))
    }
}

/// Declare an integer-coded enum and its [`WireCode`] mapping
///
/// ```rust,ignore
/// wire_enum! {
///     /// Who pays for transport
///     pub enum TransportCostPayer {
///         Buyer = 1,
///         Seller = 2,
///     }
/// }
/// ```
#[macro_export]
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $code:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $crate::codec::WireCode for $name {
            fn from_code(code: i64) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)+
                    _ => None,
                }
            }

            fn code(self) -> i64 {
                match self {
                    $(Self::$variant => $code,)+
                }
            }
        }
    };
}
