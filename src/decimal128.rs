//! [BSON Decimal128](https://github.com/mongodb/specifications/blob/master/source/bson-decimal128/decimal128.rst) data type representation

use std::fmt;

/// Struct representing a 128-bit IEEE 754-2008 decimal floating point value.
///
/// The bytes are stored verbatim for round-tripping; the only operation this
/// crate performs on them is rendering the canonical Extended JSON string.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Decimal128 {
    bytes: [u8; 16],
}

/// The largest canonical significand: 10^34 - 1.
const MAX_SIGNIFICAND: u128 = 9_999_999_999_999_999_999_999_999_999_999_999;

const EXPONENT_BIAS: i32 = 6176;

impl Decimal128 {
    /// Constructs a new `Decimal128` from the provided raw byte representation.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self { bytes }
    }

    /// Returns the raw byte representation of this `Decimal128`.
    pub const fn bytes(&self) -> [u8; 16] {
        self.bytes
    }
}

/// The decoded fields of a decimal128 bit pattern.
enum Parsed {
    NaN,
    Infinity { negative: bool },
    Finite {
        negative: bool,
        exponent: i32,
        significand: u128,
    },
}

impl Parsed {
    fn new(source: &Decimal128) -> Self {
        let bits = u128::from_le_bytes(source.bytes);
        let negative = (bits >> 127) & 1 == 1;
        let combination = ((bits >> 122) & 0b11111) as u8;

        if combination >> 3 == 0b11 {
            match combination {
                0b11111 => return Parsed::NaN,
                0b11110 => return Parsed::Infinity { negative },
                _ => {
                    // High combination form: a two-bit '11' marker, then the
                    // exponent, with an implicit '100' prefix on the
                    // significand's most significant bits.
                    let exponent = ((bits >> 111) & 0x3fff) as i32 - EXPONENT_BIAS;
                    let msb = 0b1000 | ((bits >> 110) & 1);
                    let significand = (bits & ((1u128 << 110) - 1)) | (msb << 110);
                    return Parsed::Finite {
                        negative,
                        exponent,
                        significand,
                    };
                }
            }
        }

        let exponent = ((bits >> 113) & 0x3fff) as i32 - EXPONENT_BIAS;
        let significand = bits & ((1u128 << 113) - 1);
        Parsed::Finite {
            negative,
            exponent,
            significand,
        }
    }
}

impl fmt::Display for Decimal128 {
    /// Formats the value following the decimal128 specification's
    /// to-string rules: plain notation when the adjusted exponent lies in
    /// `[-6, 0]`, scientific notation otherwise.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (negative, exponent, significand) = match Parsed::new(self) {
            Parsed::NaN => return f.write_str("NaN"),
            Parsed::Infinity { negative: true } => return f.write_str("-Infinity"),
            Parsed::Infinity { negative: false } => return f.write_str("Infinity"),
            Parsed::Finite {
                negative,
                exponent,
                significand,
            } => {
                // Non-canonical significands are interpreted as zero.
                let significand = if significand > MAX_SIGNIFICAND {
                    0
                } else {
                    significand
                };
                (negative, exponent, significand)
            }
        };

        if negative {
            f.write_str("-")?;
        }

        let digits = significand.to_string();
        let scientific_exponent = digits.len() as i32 - 1 + exponent;

        if scientific_exponent < -6 || exponent > 0 {
            write!(f, "{}", &digits[..1])?;
            if digits.len() > 1 {
                write!(f, ".{}", &digits[1..])?;
            }
            write!(f, "E")?;
            if scientific_exponent >= 0 {
                write!(f, "+")?;
            }
            write!(f, "{}", scientific_exponent)
        } else if exponent == 0 {
            f.write_str(&digits)
        } else {
            let radix_position = digits.len() as i32 + exponent;
            if radix_position > 0 {
                write!(
                    f,
                    "{}.{}",
                    &digits[..radix_position as usize],
                    &digits[radix_position as usize..]
                )
            } else {
                write!(f, "0.")?;
                for _ in 0..-radix_position {
                    write!(f, "0")?;
                }
                f.write_str(&digits)
            }
        }
    }
}

impl fmt::Debug for Decimal128 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Decimal128(\"{}\")", self)
    }
}
