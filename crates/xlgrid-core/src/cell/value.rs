//! Cell value types

use crate::datetime;
use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use std::fmt;

/// Error code written in place of a non-finite float
pub const NUM_ERROR: &str = "#NUM!";

/// The value of a cell
///
/// A snapshot decoded from the worksheet XML; changing it does not change the
/// cell. Use [`Cell::set_value`](crate::Cell::set_value) to write.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellValue {
    /// No value stored
    #[default]
    Empty,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Floating-point value
    Float(f64),
    /// Text, shared or inline
    String(String),
    /// Error code such as "#N/A"
    Error(String),
}

/// Classification of a [`CellValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueType {
    Empty,
    Boolean,
    Integer,
    Float,
    String,
    Error,
}

impl ValueType {
    /// Lowercase name of the type
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Empty => "empty",
            ValueType::Boolean => "boolean",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::String => "string",
            ValueType::Error => "error",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl CellValue {
    /// Create an error value
    pub fn error<S: Into<String>>(code: S) -> Self {
        CellValue::Error(code.into())
    }

    /// Type of this value
    pub fn value_type(&self) -> ValueType {
        match self {
            CellValue::Empty => ValueType::Empty,
            CellValue::Boolean(_) => ValueType::Boolean,
            CellValue::Integer(_) => ValueType::Integer,
            CellValue::Float(_) => ValueType::Float,
            CellValue::String(_) => ValueType::String,
            CellValue::Error(_) => ValueType::Error,
        }
    }

    /// Type name, for error messages
    pub fn type_name(&self) -> &'static str {
        self.value_type().name()
    }

    /// Check if the value is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Check if the value is numeric (integer or float)
    pub fn is_number(&self) -> bool {
        matches!(self, CellValue::Integer(_) | CellValue::Float(_))
    }

    /// Get as boolean if this is a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as integer if this is an integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as float if this is numeric
    pub fn as_float(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Date/time value, stored as its serial number
    ///
    /// Fails with [`Error::InvalidDateTime`] before 1900 or after 9999.
    pub fn from_datetime(moment: NaiveDateTime) -> Result<Self> {
        Ok(CellValue::Float(datetime::to_serial(moment)?))
    }

    /// Read a numeric value as a serial date/time
    pub fn as_datetime(&self) -> Result<NaiveDateTime> {
        let serial = self.as_float().ok_or_else(|| self.mismatch("date/time"))?;
        datetime::from_serial(serial)
    }

    /// Get as string slice if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Typed read; fails with [`Error::InvalidValueType`] on a mismatch
    ///
    /// # Examples
    /// ```
    /// use xlgrid_core::CellValue;
    ///
    /// let value = CellValue::Integer(42);
    /// assert_eq!(value.get::<i64>().unwrap(), 42);
    /// assert_eq!(value.get::<f64>().unwrap(), 42.0);
    /// assert!(value.get::<String>().is_err());
    /// ```
    pub fn get<T: FromCellValue>(&self) -> Result<T> {
        T::from_cell_value(self)
    }

    /// Canonical text of the value, whatever its type
    ///
    /// Booleans render as "TRUE"/"FALSE" and an error without a code as
    /// "Error". Same as the [`Display`](fmt::Display) output.
    pub fn as_string(&self) -> String {
        self.to_string()
    }

    fn mismatch(&self, expected: &'static str) -> Error {
        Error::InvalidValueType {
            expected,
            actual: self.type_name(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Float(n) => write!(f, "{}", n),
            CellValue::String(s) => write!(f, "{}", s),
            CellValue::Error(code) if code.is_empty() => f.write_str("Error"),
            CellValue::Error(code) => write!(f, "{}", code),
        }
    }
}

/// Conversion out of a [`CellValue`] for [`CellValue::get`]
pub trait FromCellValue: Sized {
    fn from_cell_value(value: &CellValue) -> Result<Self>;
}

impl FromCellValue for bool {
    fn from_cell_value(value: &CellValue) -> Result<Self> {
        value.as_bool().ok_or_else(|| value.mismatch("boolean"))
    }
}

impl FromCellValue for i64 {
    fn from_cell_value(value: &CellValue) -> Result<Self> {
        value.as_integer().ok_or_else(|| value.mismatch("integer"))
    }
}

impl FromCellValue for f64 {
    fn from_cell_value(value: &CellValue) -> Result<Self> {
        value.as_float().ok_or_else(|| value.mismatch("float"))
    }
}

impl FromCellValue for String {
    fn from_cell_value(value: &CellValue) -> Result<Self> {
        match value {
            CellValue::String(s) => Ok(s.clone()),
            _ => Err(value.mismatch("string")),
        }
    }
}

impl FromCellValue for NaiveDateTime {
    fn from_cell_value(value: &CellValue) -> Result<Self> {
        value.as_datetime()
    }
}

impl TryFrom<NaiveDateTime> for CellValue {
    type Error = Error;

    fn try_from(moment: NaiveDateTime) -> Result<Self> {
        Self::from_datetime(moment)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Integer(n as i64)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Integer(n)
    }
}

impl From<u32> for CellValue {
    fn from(n: u32) -> Self {
        CellValue::Integer(n as i64)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Float(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Empty, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_types() {
        assert_eq!(CellValue::Empty.value_type(), ValueType::Empty);
        assert_eq!(CellValue::from(true).value_type(), ValueType::Boolean);
        assert_eq!(CellValue::from(7).value_type(), ValueType::Integer);
        assert_eq!(CellValue::from(1.5).value_type(), ValueType::Float);
        assert_eq!(CellValue::from("x").value_type(), ValueType::String);
        assert_eq!(CellValue::error("#N/A").value_type(), ValueType::Error);
        assert_eq!(CellValue::from(None::<i64>), CellValue::Empty);
    }

    #[test]
    fn test_as_string() {
        assert_eq!(CellValue::Empty.as_string(), "");
        assert_eq!(CellValue::Boolean(true).as_string(), "TRUE");
        assert_eq!(CellValue::Boolean(false).as_string(), "FALSE");
        assert_eq!(CellValue::Integer(-12).as_string(), "-12");
        assert_eq!(CellValue::Float(3.25).as_string(), "3.25");
        assert_eq!(CellValue::from("hello").as_string(), "hello");
        assert_eq!(CellValue::error("#DIV/0!").as_string(), "#DIV/0!");
        assert_eq!(CellValue::error("").as_string(), "Error");
    }

    #[test]
    fn test_typed_get() {
        assert!(CellValue::Boolean(true).get::<bool>().unwrap());
        assert_eq!(CellValue::Float(2.5).get::<f64>().unwrap(), 2.5);
        assert_eq!(CellValue::from("s").get::<String>().unwrap(), "s");

        match CellValue::Float(2.5).get::<i64>() {
            Err(Error::InvalidValueType { expected, actual }) => {
                assert_eq!(expected, "integer");
                assert_eq!(actual, "float");
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(CellValue::Empty.get::<bool>().is_err());
    }

    #[test]
    fn test_datetime_values() {
        let moment = chrono::NaiveDate::from_ymd_opt(2023, 3, 15)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        let value = CellValue::from_datetime(moment).unwrap();
        assert_eq!(value, CellValue::Float(45000.25));
        assert_eq!(value.get::<NaiveDateTime>().unwrap(), moment);
        assert_eq!(CellValue::Integer(61).as_datetime().unwrap().to_string(), "1900-03-01 00:00:00");

        assert!(matches!(
            CellValue::from("2023-03-15").as_datetime(),
            Err(Error::InvalidValueType { expected: "date/time", .. })
        ));
        assert!(matches!(
            CellValue::Integer(0).as_datetime(),
            Err(Error::InvalidDateTime(_))
        ));
    }
}
