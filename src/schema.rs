use serde::{Deserialize, Serialize};

/// Column names the source CSV must provide, in output order.
pub const SOURCE_COLUMNS: [&str; 8] = [
    "ano_mes_referencia",
    "orgao_superior_nome",
    "orgao_superior_sigla",
    "orgao_nome",
    "orgao_sigla",
    "nome_item",
    "nome_natureza_despesa_detalhada",
    "valor",
];

/// Column names exposed by the assembled dataset.
///
/// Same order as [`SOURCE_COLUMNS`]; `nome_item` and
/// `nome_natureza_despesa_detalhada` are renamed.
pub const OUTPUT_COLUMNS: [&str; 8] = [
    "ano_mes_referencia",
    "orgao_superior_nome",
    "orgao_superior_sigla",
    "orgao_nome",
    "orgao_sigla",
    "item_despesa",
    "natureza_despesa",
    "valor",
];

/// One row of administrative expenditure for an organization in a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Year-month token, e.g. `"202101"`. Kept as text.
    #[serde(rename = "ano_mes_referencia")]
    pub period: String,

    #[serde(rename = "orgao_superior_nome")]
    pub parent_org_name: String,

    #[serde(rename = "orgao_superior_sigla")]
    pub parent_org_code: String,

    #[serde(rename = "orgao_nome")]
    pub org_name: String,

    #[serde(rename = "orgao_sigla")]
    pub org_code: String,

    #[serde(rename = "item_despesa")]
    pub expense_item: String,

    #[serde(rename = "natureza_despesa")]
    pub expense_nature: String,

    /// Signed amount. Negative values are corrections or refunds.
    #[serde(rename = "valor")]
    pub value: f64,
}

impl ExpenseRecord {
    /// Text cells in [`OUTPUT_COLUMNS`] order. The value keeps its full precision.
    pub fn cells(&self) -> [String; 8] {
        [
            self.period.clone(),
            self.parent_org_name.clone(),
            self.parent_org_code.clone(),
            self.org_name.clone(),
            self.org_code.clone(),
            self.expense_item.clone(),
            self.expense_nature.clone(),
            self.value.to_string(),
        ]
    }
}
