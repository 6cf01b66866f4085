//! Server-side HTML for the dashboard.
//!
//! One self-contained page: embedded CSS, dropdowns that submit on change and an
//! inline SVG bar chart. No scripts beyond the `onchange` handlers, which clear
//! the dropdowns further down the cascade before submitting.

use crate::dashboard::DashboardView;
use crate::filter::{FilterControl, SELECT_ALL};
use crate::format::CurrencyFormat;
use crate::llm::{NarrativePanel, PanelBody};
use crate::schema::OUTPUT_COLUMNS;
use crate::summary::PeriodSeries;

const CSS: &str = r#"
body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; margin: 0; color: #1f2937; background: #f9fafb; }
main { max-width: 1200px; margin: 0 auto; padding: 24px; }
h1 { margin-bottom: 4px; }
.subtitle { color: #6b7280; margin-top: 0; }
.filters { display: grid; grid-template-columns: repeat(3, 1fr); gap: 16px; margin: 24px 0; }
.filters label { display: block; font-size: 0.85rem; color: #4b5563; margin-bottom: 4px; }
.filters select { width: 100%; padding: 6px; }
.notice { background: #fef3c7; border: 1px solid #f59e0b; padding: 8px 12px; border-radius: 4px; }
.metrics { display: grid; grid-template-columns: repeat(2, 1fr); gap: 16px; }
.metric { background: #fff; border: 1px solid #e5e7eb; border-radius: 6px; padding: 12px 16px; }
.metric h3 { margin: 0; font-size: 0.85rem; color: #6b7280; font-weight: normal; }
.metric p { margin: 4px 0 0; font-size: 1.6rem; }
.empty { color: #6b7280; font-style: italic; }
.table-container { max-height: 480px; overflow: auto; border: 1px solid #e5e7eb; background: #fff; }
table { border-collapse: collapse; width: 100%; font-size: 0.85rem; }
th, td { padding: 4px 8px; border-bottom: 1px solid #f3f4f6; text-align: left; white-space: nowrap; }
th { position: sticky; top: 0; background: #f3f4f6; }
td.num { text-align: right; }
.panel { background: #fff; border: 1px solid #e5e7eb; border-radius: 6px; padding: 12px 16px; margin-bottom: 16px; }
.panel.failed { border-color: #fca5a5; background: #fef2f2; color: #991b1b; }
svg .bar { fill: #636efa; }
svg .bar.negative { fill: #ef553b; }
svg text { font-size: 11px; fill: #374151; }
"#;

const CHART_WIDTH: f64 = 960.0;
const CHART_HEIGHT: f64 = 320.0;
const MARGIN_LEFT: f64 = 110.0;
const MARGIN_RIGHT: f64 = 16.0;
const MARGIN_TOP: f64 = 16.0;
const MARGIN_BOTTOM: f64 = 48.0;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

pub fn render_page(view: &DashboardView<'_>, format: &CurrencyFormat) -> String {
    let filters: String = view
        .controls
        .iter()
        .enumerate()
        .map(|(i, control)| render_control(control, &view.controls[i + 1..]))
        .collect();

    let notice = if view.resets.is_empty() {
        String::new()
    } else {
        let labels: Vec<&str> = view.resets.iter().map(|c| c.label()).collect();
        format!(
            r#"<p class="notice">Seleção indisponível para {}; exibindo todos.</p>"#,
            escape(&labels.join(", "))
        )
    };

    let metrics: String = view
        .metrics
        .iter()
        .map(|m| {
            format!(
                r#"<div class="metric"><h3>{}</h3><p>{}</p></div>"#,
                escape(m.label),
                escape(&m.value)
            )
        })
        .collect();

    let chart = match &view.series {
        Some(series) => render_chart(series, format),
        None => r#"<p class="empty">Nenhum registro para o filtro selecionado.</p>"#.to_string(),
    };

    let insights: String = view.insights.iter().map(render_panel).collect();

    format!(
        r##"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Custeio Administrativo {year}</title>
    <style>
{css}
    </style>
</head>
<body>
<main>
    <h1>Custeio Administrativo</h1>
    <p class="subtitle">Despesas necessárias para o funcionamento da administração pública federal ({year}).</p>

    <form method="get" action="/" class="filters">
{filters}
        <noscript><button type="submit">Filtrar</button></noscript>
    </form>
    {notice}

    <section class="metrics">
{metrics}
    </section>

    <h2>Série temporal</h2>
    <section class="chart">
{chart}
    </section>

    <h2>Dados detalhados <small>({count} registros)</small></h2>
    <section class="table-container">
{table}
    </section>

    <h2>Insights do ChatGPT</h2>
    <section class="insights">
{insights}
    </section>
</main>
</body>
</html>
"##,
        year = view.year,
        css = CSS,
        filters = filters,
        notice = notice,
        metrics = metrics,
        chart = chart,
        count = view.rows.len(),
        table = render_table(view),
        insights = insights,
    )
}

/// `downstream` are the controls narrowed by this one; they go back to the
/// sentinel when this selection changes.
fn render_control(control: &FilterControl, downstream: &[FilterControl]) -> String {
    let selected = control.selected.as_str();
    let options: String = control
        .options
        .iter()
        .map(|option| {
            format!(
                r#"<option value="{value}"{sel}>{value}</option>"#,
                value = escape(option),
                sel = if option == selected { " selected" } else { "" }
            )
        })
        .collect();

    let clear: String = downstream
        .iter()
        .map(|c| format!("this.form.{}.value='{}';", c.key, escape(SELECT_ALL)))
        .collect();

    format!(
        r#"        <div><label for="{key}">{label}</label><select id="{key}" name="{key}" onchange="{clear}this.form.submit()">{options}</select></div>
"#,
        key = control.key,
        label = escape(control.label),
        clear = clear,
        options = options
    )
}

fn render_table(view: &DashboardView<'_>) -> String {
    let header: String = OUTPUT_COLUMNS
        .iter()
        .map(|c| format!("<th>{}</th>", c))
        .collect();

    let body: String = view
        .rows
        .iter()
        .map(|row| {
            let cells = row.record.cells();
            let last = cells.len() - 1;
            let tds: String = cells
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    let class = if i == last { r#" class="num""# } else { "" };
                    format!("<td{}>{}</td>", class, escape(cell))
                })
                .collect();
            format!("<tr><td>{}</td>{}</tr>\n", row.id, tds)
        })
        .collect();

    format!(
        "<table>\n<thead><tr><th></th>{}</tr></thead>\n<tbody>\n{}</tbody>\n</table>",
        header, body
    )
}

/// Categorical bar chart: one band per period, zero baseline, negative bars below it.
pub fn render_chart(series: &PeriodSeries, format: &CurrencyFormat) -> String {
    if series.is_empty() {
        return String::new();
    }

    let (lo, hi) = series.bounds();
    let span = if hi - lo > 0.0 { hi - lo } else { 1.0 };
    let plot_w = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let y = |v: f64| MARGIN_TOP + (hi - v) / span * plot_h;
    let band = plot_w / series.bars.len() as f64;
    let bar_w = band * 0.7;

    let mut svg = format!(
        r#"<svg viewBox="0 0 {w} {h}" width="100%" role="img" aria-label="Valor por período">"#,
        w = CHART_WIDTH,
        h = CHART_HEIGHT
    );

    // Bounds always include zero, so this is at most [hi, 0, lo].
    let mut ticks = vec![hi, 0.0, lo];
    ticks.dedup();
    for tick in ticks {
        svg.push_str(&format!(
            r#"<text x="{x:.1}" y="{y:.1}" text-anchor="end" dominant-baseline="middle">{text}</text>"#,
            x = MARGIN_LEFT - 6.0,
            y = y(tick),
            text = escape(&format.format(tick))
        ));
    }

    for (i, bar) in series.bars.iter().enumerate() {
        let x = MARGIN_LEFT + band * i as f64 + (band - bar_w) / 2.0;
        let top = y(bar.total.max(0.0));
        let height = (y(bar.total.min(0.0)) - top).max(0.5);
        let class = if bar.total < 0.0 { "bar negative" } else { "bar" };
        svg.push_str(&format!(
            r#"<rect class="{class}" x="{x:.1}" y="{top:.1}" width="{bar_w:.1}" height="{height:.1}"><title>{period}: {value}</title></rect>"#,
            class = class,
            x = x,
            top = top,
            bar_w = bar_w,
            height = height,
            period = escape(&bar.period),
            value = escape(&format.format(bar.total))
        ));
        svg.push_str(&format!(
            r#"<text x="{x:.1}" y="{y:.1}" text-anchor="middle">{period}</text>"#,
            x = x + bar_w / 2.0,
            y = CHART_HEIGHT - MARGIN_BOTTOM + 16.0,
            period = escape(&bar.period)
        ));
    }

    svg.push_str(&format!(
        r##"<line x1="{x1}" x2="{x2}" y1="{y0:.1}" y2="{y0:.1}" stroke="#9ca3af"/>"##,
        x1 = MARGIN_LEFT,
        x2 = CHART_WIDTH - MARGIN_RIGHT,
        y0 = y(0.0)
    ));
    svg.push_str("</svg>");
    svg
}

fn render_panel(panel: &NarrativePanel) -> String {
    match &panel.body {
        PanelBody::Text(text) => format!(
            r#"<article class="panel"><h3>{}</h3>{}</article>
"#,
            escape(panel.title),
            paragraphs(text)
        ),
        PanelBody::Failed(reason) => format!(
            r#"<article class="panel failed"><h3>{}</h3><p>Não foi possível gerar os insights: {}</p></article>
"#,
            escape(panel.title),
            escape(reason)
        ),
    }
}

/// Blank lines separate paragraphs; single newlines become `<br>`.
fn paragraphs(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            let lines: Vec<String> = p.lines().map(escape).collect();
            format!("<p>{}</p>", lines.join("<br>"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterColumn, Selection};
    use crate::summary::PeriodTotal;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<Todos> & "aspas" 'simples'"#),
            "&lt;Todos&gt; &amp; &quot;aspas&quot; &#39;simples&#39;"
        );
    }

    #[test]
    fn test_paragraphs() {
        assert_eq!(
            paragraphs("1. Um\n2. Dois\n\n<b>fim</b>\n"),
            "<p>1. Um<br>2. Dois</p><p>&lt;b&gt;fim&lt;/b&gt;</p>"
        );
    }

    #[test]
    fn test_chart_has_one_bar_per_period() {
        let series = PeriodSeries {
            bars: vec![
                PeriodTotal {
                    period: "202101".to_string(),
                    total: 150.0,
                },
                PeriodTotal {
                    period: "202102".to_string(),
                    total: -50.0,
                },
                PeriodTotal {
                    period: "202103".to_string(),
                    total: 0.0,
                },
            ],
        };
        let svg = render_chart(&series, &CurrencyFormat::pt_br().unwrap());
        assert_eq!(svg.matches("<rect").count(), 3);
        assert_eq!(svg.matches("bar negative").count(), 1);
        assert!(svg.contains("202102: -R$ 50,00"));
        assert!(svg.starts_with("<svg") && svg.ends_with("</svg>"));
    }

    fn control(column: FilterColumn, selected: &str) -> FilterControl {
        FilterControl {
            column,
            label: column.label(),
            key: column.query_key(),
            options: vec![SELECT_ALL.to_string(), selected.to_string()],
            selected: Selection::parse(Some(selected)),
        }
    }

    #[test]
    fn test_changing_a_control_clears_the_ones_below() {
        let controls = vec![
            control(FilterColumn::ParentOrg, "Ministério A"),
            control(FilterColumn::Org, "Secretaria X"),
            control(FilterColumn::ExpenseItem, "Diárias"),
        ];

        let top = render_control(&controls[0], &controls[1..]);
        assert!(top.contains(
            "onchange=\"this.form.orgao.value='&lt;Todos&gt;';this.form.item.value='&lt;Todos&gt;';this.form.submit()\""
        ));
        assert!(top.contains(r#"<option value="Ministério A" selected>"#));

        let middle = render_control(&controls[1], &controls[2..]);
        assert!(middle.contains("this.form.item.value='&lt;Todos&gt;';this.form.submit()"));
        assert!(!middle.contains("this.form.orgao.value"));

        let last = render_control(&controls[2], &[]);
        assert!(last.contains(r#"onchange="this.form.submit()""#));
    }

    #[test]
    fn test_failed_panel_is_rendered_inline() {
        let panel = NarrativePanel::failed("Valores negativos", "OPENAI_API_KEY não configurada");
        let html = render_panel(&panel);
        assert!(html.contains("panel failed"));
        assert!(html.contains("OPENAI_API_KEY não configurada"));
    }
}
