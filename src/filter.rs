use crate::assembler::{Dataset, Row};
use crate::schema::ExpenseRecord;
use log::warn;
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Synthetic option meaning "do not restrict on this column".
pub const SELECT_ALL: &str = "<Todos>";

/// The three filterable columns, in cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterColumn {
    ParentOrg,
    Org,
    ExpenseItem,
}

impl FilterColumn {
    pub const ALL: [FilterColumn; 3] = [
        FilterColumn::ParentOrg,
        FilterColumn::Org,
        FilterColumn::ExpenseItem,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FilterColumn::ParentOrg => "Órgão Superior",
            FilterColumn::Org => "Órgão",
            FilterColumn::ExpenseItem => "Item de despesa",
        }
    }

    /// Query-string parameter carrying this column's selection.
    pub fn query_key(self) -> &'static str {
        match self {
            FilterColumn::ParentOrg => "orgao_superior",
            FilterColumn::Org => "orgao",
            FilterColumn::ExpenseItem => "item",
        }
    }

    pub fn value_of(self, record: &ExpenseRecord) -> &str {
        match self {
            FilterColumn::ParentOrg => &record.parent_org_name,
            FilterColumn::Org => &record.org_name,
            FilterColumn::ExpenseItem => &record.expense_item,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    /// Missing, blank and sentinel values all mean [`Selection::All`].
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None => Selection::All,
            Some(value) if value.is_empty() || value == SELECT_ALL => Selection::All,
            Some(value) => Selection::Only(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Selection::All => SELECT_ALL,
            Selection::Only(value) => value,
        }
    }

    /// Exact, case-sensitive equality; `All` matches everything.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(expected) => expected == value,
        }
    }
}

impl Serialize for Selection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterState {
    pub parent_org: Selection,
    pub org: Selection,
    pub expense_item: Selection,
}

impl FilterState {
    pub fn get(&self, column: FilterColumn) -> &Selection {
        match column {
            FilterColumn::ParentOrg => &self.parent_org,
            FilterColumn::Org => &self.org,
            FilterColumn::ExpenseItem => &self.expense_item,
        }
    }

    pub fn set(&mut self, column: FilterColumn, selection: Selection) {
        match column {
            FilterColumn::ParentOrg => self.parent_org = selection,
            FilterColumn::Org => self.org = selection,
            FilterColumn::ExpenseItem => self.expense_item = selection,
        }
    }

    pub fn with(mut self, column: FilterColumn, value: &str) -> Self {
        self.set(column, Selection::parse(Some(value)));
        self
    }
}

/// Query parameters as they arrive from the dashboard form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterQuery {
    pub orgao_superior: Option<String>,
    pub orgao: Option<String>,
    pub item: Option<String>,
}

impl From<FilterQuery> for FilterState {
    fn from(query: FilterQuery) -> Self {
        Self {
            parent_org: Selection::parse(query.orgao_superior.as_deref()),
            org: Selection::parse(query.orgao.as_deref()),
            expense_item: Selection::parse(query.item.as_deref()),
        }
    }
}

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

/// Sort key for pt-BR ordering: case and accents are ignored.
pub fn collation_key(value: &str) -> String {
    value
        .chars()
        .flat_map(char::to_lowercase)
        .map(fold_diacritic)
        .collect()
}

pub fn collate(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

/// Distinct values of `column` among `rows`, in collation order.
pub fn candidates(rows: &[Row<'_>], column: FilterColumn) -> Vec<String> {
    let distinct: BTreeSet<&str> = rows.iter().map(|r| column.value_of(r.record)).collect();
    let mut values: Vec<String> = distinct.into_iter().map(str::to_string).collect();
    values.sort_by_cached_key(|v| (collation_key(v), v.clone()));
    values
}

/// Dropdown options: the sentinel followed by the candidates.
pub fn options(candidates: &[String]) -> Vec<String> {
    std::iter::once(SELECT_ALL.to_string())
        .chain(candidates.iter().cloned())
        .collect()
}

pub fn apply<'a>(rows: Vec<Row<'a>>, column: FilterColumn, selection: &Selection) -> Vec<Row<'a>> {
    match selection {
        Selection::All => rows,
        Selection::Only(_) => rows
            .into_iter()
            .filter(|r| selection.matches(column.value_of(r.record)))
            .collect(),
    }
}

/// Applies all three selections as-is. Unknown values simply match nothing.
pub fn filter_rows<'a>(dataset: &'a Dataset, state: &FilterState) -> Vec<Row<'a>> {
    FilterColumn::ALL
        .into_iter()
        .fold(dataset.rows(), |rows, column| {
            apply(rows, column, state.get(column))
        })
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterControl {
    pub column: FilterColumn,
    pub label: &'static str,
    pub key: &'static str,
    pub options: Vec<String>,
    pub selected: Selection,
}

/// Result of running the dropdown cascade for one interaction.
#[derive(Debug, Clone)]
pub struct Cascade<'a> {
    pub controls: Vec<FilterControl>,
    pub rows: Vec<Row<'a>>,
    /// Selections that were no longer available and fell back to the sentinel.
    pub resets: Vec<FilterColumn>,
    pub state: FilterState,
}

/// Runs the three dropdowns in order. Each control's options come from the
/// rows left by the controls before it; a selection missing from its options
/// is reset to [`Selection::All`].
pub fn cascade<'a>(dataset: &'a Dataset, requested: &FilterState) -> Cascade<'a> {
    let mut rows = dataset.rows();
    let mut state = FilterState::default();
    let mut controls = Vec::with_capacity(FilterColumn::ALL.len());
    let mut resets = Vec::new();

    for column in FilterColumn::ALL {
        let values = candidates(&rows, column);
        let mut selection = requested.get(column).clone();

        if let Selection::Only(value) = &selection {
            if !values.iter().any(|v| v == value) {
                warn!(
                    "Selection '{}' for {} is not available; resetting to {}",
                    value,
                    column.label(),
                    SELECT_ALL
                );
                resets.push(column);
                selection = Selection::All;
            }
        }

        rows = apply(rows, column, &selection);
        controls.push(FilterControl {
            column,
            label: column.label(),
            key: column.query_key(),
            options: options(&values),
            selected: selection.clone(),
        });
        state.set(column, selection);
    }

    Cascade {
        controls,
        rows,
        resets,
        state,
    }
}
