//! Owned result sets returned by a [`crate::driver::Driver`], and the typed row/column
//! accessors built on top of them.

use chrono::{DateTime, FixedOffset, Utc};

use crate::error::{StorageError, StorageResult};
use crate::types::StorageType;

/// One column value, already materialised into an owned Rust type by the driver.
///
/// This is the driver-facing counterpart of [`crate::params::ParameterValue`]: params borrow
/// from the caller going in, raw values own their data coming back out.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Real(f32),
    Double(f64),
    Boolean(bool),
    String(String),
    Timestamp(DateTime<Utc>),
    TimestampWithZone(DateTime<FixedOffset>),
    Binary(Vec<u8>),
    Uuid([u8; 16]),
}

/// One row: an ordered list of columns, addressable by position or name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    columns: Vec<String>,
    values: Vec<RawValue>,
}

impl RawRow {
    pub fn new(columns: Vec<String>, values: Vec<RawValue>) -> Self {
        debug_assert_eq!(columns.len(), values.len(), "row column/value count mismatch");
        Self { columns, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn value(&self, index: usize) -> Option<&RawValue> {
        self.values.get(index)
    }

    pub fn value_by_name(&self, name: &str) -> Option<&RawValue> {
        self.index_of(name).and_then(|i| self.values.get(i))
    }
}

/// What a driver hands back from `execute_prepared`/`execute_ad_hoc`: either a set of rows
/// (queries) or an affected-row count (DML with no projection).
#[derive(Debug, Clone, Default)]
pub struct RawResultSet {
    rows: Vec<RawRow>,
    rows_affected: u64,
}

impl RawResultSet {
    pub fn from_rows(rows: Vec<RawRow>) -> Self {
        let rows_affected = rows.len() as u64;
        Self { rows, rows_affected }
    }

    pub fn from_rows_affected(rows_affected: u64) -> Self {
        Self { rows: Vec::new(), rows_affected }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }
}

impl PartialEq for RawResultSet {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows && self.rows_affected == other.rows_affected
    }
}

/// The public result handle returned from [`crate::transaction::Transaction::execute`].
#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    ty: StorageType,
    rows: Vec<RawRow>,
    rows_affected: u64,
}

impl ExecutionResult {
    pub(crate) fn new(ty: StorageType, raw: RawResultSet) -> Self {
        Self { ty, rows: raw.rows, rows_affected: raw.rows_affected }
    }

    pub fn empty(ty: StorageType) -> Self {
        Self { ty, rows: Vec::new(), rows_affected: 0 }
    }

    /// Number of rows affected by a DML statement, or the number of rows returned by a query.
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn at(&self, index: usize) -> Option<RowResult<'_>> {
        self.rows.get(index).map(|row| RowResult { ty: self.ty, row })
    }

    pub fn iter(&self) -> RowIter<'_> {
        RowIter { ty: self.ty, inner: self.rows.iter() }
    }
}

impl<'a> IntoIterator for &'a ExecutionResult {
    type Item = RowResult<'a>;
    type IntoIter = RowIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the rows of an [`ExecutionResult`], in original order.
pub struct RowIter<'a> {
    ty: StorageType,
    inner: std::slice::Iter<'a, RawRow>,
}

impl<'a> Iterator for RowIter<'a> {
    type Item = RowResult<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|row| RowResult { ty: self.ty, row })
    }
}

/// A borrowed view onto one row, with typed column extraction.
#[derive(Debug, Clone, Copy)]
pub struct RowResult<'a> {
    ty: StorageType,
    row: &'a RawRow,
}

impl<'a> RowResult<'a> {
    pub fn storage_type(&self) -> StorageType {
        self.ty
    }

    pub fn len(&self) -> usize {
        self.row.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row.is_empty()
    }

    pub fn column_names(&self) -> &[String] {
        self.row.column_names()
    }

    fn value_at(&self, index: usize) -> StorageResult<&'a RawValue> {
        self.row.value(index).ok_or_else(|| {
            StorageError::invalid_argument(self.ty, format!("column index {} out of range", index))
        })
    }

    fn value_named(&self, name: &str) -> StorageResult<&'a RawValue> {
        self.row.value_by_name(name).ok_or_else(|| {
            StorageError::invalid_argument(self.ty, format!("no such column: {}", name))
        })
    }

    /// Extracts column `index` as `T`, via [`FromRawValue`].
    pub fn get<T: FromRawValue>(&self, index: usize) -> StorageResult<T> {
        T::from_raw(self.ty, self.value_at(index)?)
    }

    /// Extracts column `name` as `T`, via [`FromRawValue`].
    pub fn get_by_name<T: FromRawValue>(&self, name: &str) -> StorageResult<T> {
        T::from_raw(self.ty, self.value_named(name)?)
    }
}

/// Converts a [`RawValue`] into a concrete Rust type, reporting a mismatch as a
/// [`StorageError::ParameterType`] error rather than panicking.
pub trait FromRawValue: Sized {
    fn from_raw(ty: StorageType, value: &RawValue) -> StorageResult<Self>;
}

macro_rules! impl_from_raw_value {
    ($t:ty, $variant:ident, $label:literal) => {
        impl FromRawValue for $t {
            fn from_raw(ty: StorageType, value: &RawValue) -> StorageResult<Self> {
                match value {
                    RawValue::$variant(v) => Ok(v.clone()),
                    other => Err(mismatch(ty, $label, other)),
                }
            }
        }
    };
}

impl_from_raw_value!(i16, SmallInt, "SmallInt");
impl_from_raw_value!(i32, Int, "Int");
impl_from_raw_value!(i64, BigInt, "BigInt");
impl_from_raw_value!(f32, Real, "Real");
impl_from_raw_value!(f64, Double, "Double");
impl_from_raw_value!(bool, Boolean, "Boolean");
impl_from_raw_value!(String, String, "String");
impl_from_raw_value!(DateTime<Utc>, Timestamp, "Timestamp");
impl_from_raw_value!(DateTime<FixedOffset>, TimestampWithZone, "TimestampWithZone");
impl_from_raw_value!(Vec<u8>, Binary, "Binary");
impl_from_raw_value!([u8; 16], Uuid, "Uuid");

impl<T: FromRawValue> FromRawValue for Option<T> {
    fn from_raw(ty: StorageType, value: &RawValue) -> StorageResult<Self> {
        match value {
            RawValue::Null => Ok(None),
            other => T::from_raw(ty, other).map(Some),
        }
    }
}

fn mismatch(ty: StorageType, expected: &str, actual: &RawValue) -> StorageError {
    StorageError::parameter_type(
        ty,
        format!("expected column of type {}, found {:?}", expected, actual),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> ExecutionResult {
        let raw = RawResultSet::from_rows(vec![
            RawRow::new(
                vec!["id".into(), "name".into()],
                vec![RawValue::Int(1), RawValue::String("alice".into())],
            ),
            RawRow::new(
                vec!["id".into(), "name".into()],
                vec![RawValue::Int(2), RawValue::Null],
            ),
        ]);
        ExecutionResult::new(StorageType::Postgres, raw)
    }

    #[test]
    fn rows_affected_tracks_row_count_for_queries() {
        let result = sample_result();
        assert_eq!(result.rows_affected(), 2);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn typed_extraction_by_index_and_name() {
        let result = sample_result();
        let first = result.at(0).unwrap();
        assert_eq!(first.get::<i32>(0).unwrap(), 1);
        assert_eq!(first.get_by_name::<String>("name").unwrap(), "alice");
    }

    #[test]
    fn null_extracts_as_none_through_option_wrapper() {
        let result = sample_result();
        let second = result.at(1).unwrap();
        let name: Option<String> = second.get_by_name("name").unwrap();
        assert_eq!(name, None);
    }

    #[test]
    fn type_mismatch_is_reported_not_panicked() {
        let result = sample_result();
        let first = result.at(0).unwrap();
        let err = first.get::<String>(0).unwrap_err();
        assert_eq!(err.storage_type(), StorageType::Postgres);
    }

    #[test]
    fn iteration_visits_rows_in_order() {
        let result = sample_result();
        let ids: Vec<i32> = result.iter().map(|r| r.get::<i32>(0).unwrap()).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
