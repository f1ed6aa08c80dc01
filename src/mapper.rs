//! Row-to-struct mapping.
//!
//! Grounded in the original `Mapper::Dynamic`/`Mapper::Map` template pair: `Dynamic` pulls a
//! tuple of named columns out of a row given an ordered column-name list (`row->As<T>(name)`
//! per position), `Map` turns a tuple into a model. Without C++-style variadic templates, the
//! idiomatic Rust shape for `Map` is a [`FromRow`] trait (the same contract sqlx exposes via its
//! `#[derive(FromRow)]`); `Dynamic` becomes [`FromNamedRow`] plus manual tuple impls standing in
//! for the derive this crate does not ship.

use crate::error::{StorageError, StorageResult};
use crate::result::{FromRawValue, RowResult};

/// Builds `Self` from one row, addressing columns by name. Implement this by hand for a model
/// type — the original's `Mapper::Map`.
pub trait FromRow: Sized {
    fn from_row(row: RowResult<'_>) -> StorageResult<Self>;
}

/// Builds `Self` from `row`, looking up `column_names[i]` for tuple position `i`. The original's
/// `Mapper::Dynamic<Args...>(row, column_names)`.
pub trait FromNamedRow: Sized {
    fn from_named_row(row: RowResult<'_>, column_names: &[&str]) -> StorageResult<Self>;
}

/// Pulls `column_names` out of `row` as a tuple, in the style of the original `Mapper::Dynamic`.
pub fn dynamic<T: FromNamedRow>(row: RowResult<'_>, column_names: &[&str]) -> StorageResult<T> {
    T::from_named_row(row, column_names)
}

fn column_name_at<'n>(row: &RowResult<'_>, column_names: &[&'n str], idx: usize) -> StorageResult<&'n str> {
    column_names.get(idx).copied().ok_or_else(|| {
        StorageError::invalid_argument(
            row.storage_type(),
            format!("no column name supplied for tuple position {}", idx),
        )
    })
}

macro_rules! impl_from_named_row_for_tuple {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name),+> FromNamedRow for ($($name,)+)
        where
            $($name: FromRawValue),+
        {
            fn from_named_row(row: RowResult<'_>, column_names: &[&str]) -> StorageResult<Self> {
                Ok(($(row.get_by_name::<$name>(column_name_at(&row, column_names, $idx)?)?,)+))
            }
        }
    };
}

impl_from_named_row_for_tuple!(A: 0);
impl_from_named_row_for_tuple!(A: 0, B: 1);
impl_from_named_row_for_tuple!(A: 0, B: 1, C: 2);
impl_from_named_row_for_tuple!(A: 0, B: 1, C: 2, D: 3);
impl_from_named_row_for_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_from_named_row_for_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{ExecutionResult, RawResultSet, RawRow, RawValue};
    use crate::types::StorageType;

    struct User {
        id: i32,
        name: String,
    }

    impl FromRow for User {
        fn from_row(row: RowResult<'_>) -> StorageResult<Self> {
            Ok(User { id: row.get_by_name("id")?, name: row.get_by_name("name")? })
        }
    }

    fn sample() -> ExecutionResult {
        let raw = RawResultSet::from_rows(vec![RawRow::new(
            vec!["id".into(), "name".into()],
            vec![RawValue::Int(7), RawValue::String("grace".into())],
        )]);
        ExecutionResult::new(StorageType::Postgres, raw)
    }

    #[test]
    fn maps_a_row_into_a_hand_written_model() {
        let result = sample();
        let row = result.at(0).unwrap();
        let user = User::from_row(row).unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.name, "grace");
    }

    #[test]
    fn dynamic_tuple_extraction_by_column_name() {
        let result = sample();
        let row = result.at(0).unwrap();
        let (id, name): (i32, String) = dynamic(row, &["id", "name"]).unwrap();
        assert_eq!(id, 7);
        assert_eq!(name, "grace");
    }

    #[test]
    fn dynamic_ignores_physical_column_order() {
        let result = sample();
        let row = result.at(0).unwrap();
        let (name, id): (String, i32) = dynamic(row, &["name", "id"]).unwrap();
        assert_eq!(id, 7);
        assert_eq!(name, "grace");
    }

    #[test]
    fn dynamic_reports_a_missing_column_name_instead_of_panicking() {
        let result = sample();
        let row = result.at(0).unwrap();
        let outcome: StorageResult<(i32,)> = dynamic(row, &[]);
        assert!(outcome.is_err());
    }
}
