use crate::error::{CusteioError, Result};
use num_format::{CustomFormat, Grouping, ToFormattedString};

/// Largest number of fraction digits `format` can scale without overflowing.
pub const MAX_DECIMALS: usize = 9;

/// Currency formatting rules passed explicitly to whatever renders money.
#[derive(Debug, Clone)]
pub struct CurrencyFormat {
    symbol: String,
    decimal_mark: char,
    decimals: usize,
    number_format: CustomFormat,
}

impl CurrencyFormat {
    pub fn new(
        symbol: impl Into<String>,
        separator: &str,
        decimal_mark: char,
        decimals: usize,
        grouping: Grouping,
    ) -> Result<Self> {
        if decimals > MAX_DECIMALS {
            return Err(CusteioError::Config(format!(
                "{} decimal places requested, at most {} supported",
                decimals, MAX_DECIMALS
            )));
        }

        let number_format = CustomFormat::builder()
            .grouping(grouping)
            .separator(separator)
            .minus_sign("-")
            .build()
            .map_err(|e| CusteioError::Config(format!("invalid number format: {}", e)))?;

        Ok(Self {
            symbol: symbol.into(),
            decimal_mark,
            decimals,
            number_format,
        })
    }

    /// Brazilian real: `R$ 1.234,56`.
    pub fn pt_br() -> Result<Self> {
        Self::new("R$", ".", ',', 2, Grouping::Standard)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn format(&self, amount: f64) -> String {
        if !amount.is_finite() {
            return "-".to_string();
        }

        let scale = 10u64.pow(self.decimals as u32);
        let scaled = (amount.abs() * scale as f64).round() as u64;
        let integer = (scaled / scale).to_formatted_string(&self.number_format);
        let sign = if amount < 0.0 && scaled != 0 { "-" } else { "" };

        if self.decimals == 0 {
            format!("{}{} {}", sign, self.symbol, integer)
        } else {
            format!(
                "{}{} {}{}{:0width$}",
                sign,
                self.symbol,
                integer,
                self.decimal_mark,
                scaled % scale,
                width = self.decimals
            )
        }
    }
}
