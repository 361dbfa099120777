//! Kind-specific NULL sentinels.
//!
//! Every scalar kind reserves exactly one native value meaning "no value".
//! Fixed-width nullable kinds use an out-of-range minimum, DOUBLE uses NaN
//! and VARCHAR uses an absent payload. BOOLEAN, BYTE and SHORT are not
//! nullable: their sentinel is the zero value and reads as that value.
//!
//! The sentinels are ordinary values of their native types, so they cannot
//! be bound as data: `i32::MIN` bound into INT, `i64::MIN` bound into LONG,
//! TIMESTAMP or DATE, and NaN bound into DOUBLE are stored as the sentinel
//! and read back as NULL.

pub const INT_NULL: i32 = i32::MIN;
pub const LONG_NULL: i64 = i64::MIN;
pub const DOUBLE_NULL: f64 = f64::NAN;
pub const TIMESTAMP_NULL: i64 = LONG_NULL;
pub const DATE_NULL: i64 = LONG_NULL;
pub const BOOLEAN_NULL: bool = false;
pub const BYTE_NULL: i8 = 0;
pub const SHORT_NULL: i16 = 0;

/// Whether `value` is the INT sentinel
#[inline]
pub fn is_int_null(value: i32) -> bool {
    value == INT_NULL
}

/// Whether `value` is the LONG/TIMESTAMP/DATE sentinel
#[inline]
pub fn is_long_null(value: i64) -> bool {
    value == LONG_NULL
}

/// Whether `value` is the DOUBLE sentinel
#[inline]
pub fn is_double_null(value: f64) -> bool {
    value.is_nan()
}
