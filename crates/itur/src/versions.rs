//! Recommendation editions. Each recommendation gets a version enum that
//! round-trips through its edition number, so configuration files simply
//! say `"p618": 13`.

use std::fmt;

use itur_core::ItuError;
use serde::{Deserialize, Serialize};

pub use p676::P676Version;

macro_rules! editions {
    ($(#[$doc:meta])* $name:ident, $rec:literal, default $default:ident, { $($variant:ident = $num:literal),+ $(,)? }) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "u32", into = "u32")]
        pub enum $name {
            $($variant),+
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl TryFrom<u32> for $name {
            type Error = ItuError;

            fn try_from(version: u32) -> Result<Self, ItuError> {
                match version {
                    $($num => Ok(Self::$variant),)+
                    _ => Err(ItuError::ModelVersion {
                        recommendation: $rec,
                        version,
                    }),
                }
            }
        }

        impl From<$name> for u32 {
            fn from(version: $name) -> u32 {
                match version {
                    $($name::$variant => $num,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $rec, u32::from(*self))
            }
        }
    };
}

editions!(
    /// Refractivity: -12 ships a median wet-term map, -13 percentile maps.
    P453Version, "P.453", default V13, { V12 = 12, V13 = 13 }
);
editions!(
    /// Both editions share the rain and scintillation formulas; each pins the
    /// input editions it was published against (see [`Versions::for_p618`]).
    P618Version, "P.618", default V13, { V12 = 12, V13 = 13 }
);
editions!(P835Version, "P.835", default V6, { V6 = 6 });
editions!(P836Version, "P.836", default V6, { V6 = 6 });
editions!(
    /// -6 uses the Pr6/Mt/beta maps, -7 the R0.01 map and the monthly method.
    P837Version, "P.837", default V7, { V6 = 6, V7 = 7 }
);
editions!(P838Version, "P.838", default V3, { V3 = 3 });
editions!(P839Version, "P.839", default V4, { V4 = 4 });
editions!(
    /// -7 reads 1.125° reduced liquid water maps, -8 0.25° maps.
    P840Version, "P.840", default V8, { V7 = 7, V8 = 8 }
);
editions!(P1510Version, "P.1510", default V1, { V1 = 1 });
editions!(P1511Version, "P.1511", default V1, { V1 = 1 });
editions!(P530Version, "P.530", default V17, { V17 = 17 });
editions!(P1623Version, "P.1623", default V1, { V1 = 1 });
editions!(P1853Version, "P.1853", default V1, { V1 = 1 });
editions!(P1814Version, "P.1814", default V1, { V1 = 1 });

/// The edition of every recommendation a call evaluates with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Versions {
    pub p453: P453Version,
    pub p530: P530Version,
    pub p618: P618Version,
    pub p676: P676Version,
    pub p835: P835Version,
    pub p836: P836Version,
    pub p837: P837Version,
    pub p838: P838Version,
    pub p839: P839Version,
    pub p840: P840Version,
    pub p1510: P1510Version,
    pub p1511: P1511Version,
    pub p1623: P1623Version,
    pub p1814: P1814Version,
    pub p1853: P1853Version,
}

impl Versions {
    /// The input editions a P.618 edition was published against.
    ///
    /// P.618-12 predates P.837-7 and P.453-13; P.618-13 uses the current
    /// editions of every input.
    pub fn for_p618(version: P618Version) -> Self {
        match version {
            P618Version::V12 => Self {
                p453: P453Version::V12,
                p618: P618Version::V12,
                p837: P837Version::V6,
                p840: P840Version::V7,
                ..Self::default()
            },
            P618Version::V13 => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_round_trip_numbers() {
        assert_eq!(P618Version::try_from(12).unwrap(), P618Version::V12);
        assert_eq!(u32::from(P840Version::V7), 7);
        assert_eq!(P837Version::V6.to_string(), "P.837-6");
    }

    #[test]
    fn test_unknown_edition_is_reported() {
        let err = P618Version::try_from(11).unwrap_err();
        assert_eq!(
            err,
            ItuError::ModelVersion {
                recommendation: "P.618",
                version: 11
            }
        );
    }

    #[test]
    fn test_versions_deserialize_partially() {
        let v: Versions = serde_json::from_str(r#"{ "p837": 6, "p618": 12 }"#).unwrap();
        assert_eq!(v.p837, P837Version::V6);
        assert_eq!(v.p618, P618Version::V12);
        assert_eq!(v.p840, P840Version::V8);

        let bad = serde_json::from_str::<Versions>(r#"{ "p840": 3 }"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_p618_pins_inputs() {
        let v = Versions::for_p618(P618Version::V12);
        assert_eq!(v.p837, P837Version::V6);
        assert_eq!(v.p453, P453Version::V12);
        assert_eq!(Versions::for_p618(P618Version::V13), Versions::default());
    }
}
