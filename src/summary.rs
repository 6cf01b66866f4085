use crate::assembler::Row;
use crate::format::CurrencyFormat;
use serde::Serialize;
use std::collections::HashMap;

/// Aggregates of `value` over a non-empty working set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub sum: f64,
}

impl Summary {
    /// `None` when there are no rows; callers render a neutral state instead.
    pub fn compute(rows: &[Row<'_>]) -> Option<Self> {
        let first = rows.first()?.record.value;
        let (min, max, sum) = rows.iter().fold((first, first, 0.0), |(min, max, sum), r| {
            let v = r.record.value;
            (min.min(v), max.max(v), sum + v)
        });
        let count = rows.len();
        Some(Self {
            count,
            min,
            max,
            mean: sum / count as f64,
            sum,
        })
    }

    pub fn metrics(&self, format: &CurrencyFormat) -> Vec<Metric> {
        vec![
            Metric::new("Mínimo", format.format(self.min)),
            Metric::new("Máximo", format.format(self.max)),
            Metric::new("Média", format.format(self.mean)),
            Metric::new("Soma", format.format(self.sum)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub label: &'static str,
    pub value: String,
}

impl Metric {
    fn new(label: &'static str, value: String) -> Self {
        Self { label, value }
    }
}

/// Placeholders shown when the filtered set is empty.
pub fn empty_metrics() -> Vec<Metric> {
    ["Mínimo", "Máximo", "Média", "Soma"]
        .into_iter()
        .map(|label| Metric::new(label, "-".to_string()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodTotal {
    pub period: String,
    pub total: f64,
}

/// Bar series with one category per period, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodSeries {
    pub bars: Vec<PeriodTotal>,
}

impl PeriodSeries {
    pub fn from_rows(rows: &[Row<'_>]) -> Self {
        let mut bars: Vec<PeriodTotal> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for row in rows {
            let period = row.record.period.as_str();
            match index.get(period) {
                Some(&i) => bars[i].total += row.record.value,
                None => {
                    index.insert(period, bars.len());
                    bars.push(PeriodTotal {
                        period: period.to_string(),
                        total: row.record.value,
                    });
                }
            }
        }

        Self { bars }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Smallest and largest bar, each widened to include zero.
    pub fn bounds(&self) -> (f64, f64) {
        self.bars.iter().fold((0.0_f64, 0.0_f64), |(lo, hi), b| {
            (lo.min(b.total), hi.max(b.total))
        })
    }
}
