//! Sort state and local comparison

use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;

use super::column::raw_field;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }
}

/// The single active sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    pub key: String,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }
}

/// Who orders the rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// The table reorders the rows it was given
    #[default]
    Local,
    /// The caller reorders; the table only reports `SortChanged`
    Remote,
}

/// Next sort state after a header click on `key`
///
/// Same column cycles `None → Asc → Desc → None`; another column starts at `Asc`.
pub fn next_sort(current: Option<&SortState>, key: &str) -> Option<SortState> {
    match current {
        Some(state) if state.key == key => match state.direction {
            SortDirection::Asc => Some(SortState::new(key, SortDirection::Desc)),
            SortDirection::Desc => None,
        },
        _ => Some(SortState::new(key, SortDirection::Asc)),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Bool(_) => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Array(_) => 3,
        Value::Object(_) => 4,
        Value::Null => 5,
    }
}

fn compare_present(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a)
            .cmp(&type_rank(b))
            .then_with(|| a.to_string().cmp(&b.to_string())),
    }
}

/// Compare two field values; nulls always sort last regardless of direction
pub fn compare_values(a: Option<&Value>, b: Option<&Value>, direction: SortDirection) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ord = compare_present(a, b);
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
    }
}

/// Display order of `rows` under `sort`, as indices into `rows`
///
/// The sort is stable, so equal values keep their relative order.
pub fn sorted_indices<T: Serialize>(rows: &[T], sort: Option<&SortState>) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..rows.len()).collect();
    let Some(sort) = sort else {
        return indices;
    };
    let keys: Vec<Option<Value>> = rows.iter().map(|r| raw_field(r, &sort.key)).collect();
    indices.sort_by(|&a, &b| compare_values(keys[a].as_ref(), keys[b].as_ref(), sort.direction));
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Row {
        name: Option<&'static str>,
        score: Option<f64>,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { name: Some("carol"), score: Some(2.0) },
            Row { name: None, score: Some(1.0) },
            Row { name: Some("alice"), score: None },
            Row { name: Some("bob"), score: Some(2.0) },
        ]
    }

    #[test]
    fn test_three_clicks_return_to_unsorted() {
        let first = next_sort(None, "name");
        assert_eq!(first, Some(SortState::new("name", SortDirection::Asc)));
        let second = next_sort(first.as_ref(), "name");
        assert_eq!(second, Some(SortState::new("name", SortDirection::Desc)));
        let third = next_sort(second.as_ref(), "name");
        assert_eq!(third, None);
    }

    #[test]
    fn test_other_column_resets_to_ascending() {
        let current = SortState::new("name", SortDirection::Desc);
        assert_eq!(
            next_sort(Some(&current), "score"),
            Some(SortState::new("score", SortDirection::Asc))
        );
    }

    #[test]
    fn test_nulls_sort_last_both_directions() {
        let rows = rows();
        let asc = sorted_indices(&rows, Some(&SortState::new("name", SortDirection::Asc)));
        assert_eq!(asc, vec![2, 3, 0, 1]);
        let desc = sorted_indices(&rows, Some(&SortState::new("name", SortDirection::Desc)));
        assert_eq!(desc, vec![0, 3, 2, 1]);
    }

    #[test]
    fn test_equal_values_keep_order() {
        let rows = rows();
        let desc = sorted_indices(&rows, Some(&SortState::new("score", SortDirection::Desc)));
        // carol and bob tie on 2.0 and stay in input order
        assert_eq!(desc, vec![0, 3, 1, 2]);
    }

    #[test]
    fn test_unsorted_is_identity() {
        assert_eq!(sorted_indices(&rows(), None), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_numbers_compare_numerically() {
        let a = json!(9);
        let b = json!(10);
        assert_eq!(
            compare_values(Some(&a), Some(&b), SortDirection::Asc),
            Ordering::Less
        );
    }
}
