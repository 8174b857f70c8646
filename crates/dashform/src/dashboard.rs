//! Dashboard specifications and the configuration handed to the renderer.
//!
//! A [`DashboardSpec`] is the authored description (metadata, derived
//! columns, filters and a grid of KPI and chart components). The
//! [`DashboardProcessor`] turns it into a [`DashboardConfig`] with stable ids,
//! translated formulas and chart conditions rewritten to column names.

use crate::error::Result;
use dashform_core::{CellValue, ColumnSchema, Table};
use dashform_formula::{
    evaluate_script, format_kpi, EvaluationContext, FilterCondition, FormulaTranslator,
    ScriptValue,
};
use lazy_regex::{regex, regex_captures};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Specification records
// ============================================================================

/// Dashboard metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardMetadata {
    pub name: String,
    pub description: String,
    /// Data file the dashboard is built on
    pub file_path: String,
    pub fa_icon: String,
}

/// A derived column: `name` computed per row from `formula`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationSpec {
    pub name: String,
    pub formula: String,
}

/// A dashboard filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub name: String,
    /// `list`, `number_range` or `date_range`
    #[serde(rename = "type", default = "default_filter_type")]
    pub kind: String,
    /// Formula producing the selectable values, e.g. `=UNIQUE(A2:A)`
    pub values_formula: String,
}

fn default_filter_type() -> String {
    "list".to_string()
}

/// A KPI tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSpec {
    pub name: String,
    #[serde(default)]
    pub fa_icon: String,
    pub value_formula: String,
    #[serde(default = "default_format_type")]
    pub format_type: String,
    #[serde(default)]
    pub unit: String,
}

fn default_format_type() -> String {
    "number".to_string()
}

/// Chart x axis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartAxisSpec {
    pub name: String,
    pub column: String,
    pub group_by: String,
}

/// One plotted series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeriesSpec {
    pub name: String,
    pub column: String,
    #[serde(default)]
    pub aggregation: String,
    #[serde(default = "default_format_type")]
    pub format_type: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub filter_condition: String,
    /// `y` for the primary axis, `y1` for the secondary one
    #[serde(default = "default_axis")]
    pub axis: String,
}

fn default_axis() -> String {
    "y".to_string()
}

/// A chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub chart_type: String,
    pub name: String,
    #[serde(default)]
    pub x_axis: ChartAxisSpec,
    #[serde(default)]
    pub series_list: Vec<ChartSeriesSpec>,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub area: bool,
    #[serde(default)]
    pub cumulative: bool,
    /// 0 shows every group, N > 0 the top N
    #[serde(default)]
    pub top_n: usize,
    /// Row conditions such as `S>0` or `N2:N="Male"`
    #[serde(default)]
    pub default_filter_conditions: Vec<String>,
}

/// Grid cell content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "spec", rename_all = "lowercase")]
pub enum ComponentSpec {
    Kpi(KpiSpec),
    Chart(ChartSpec),
}

/// A grid column: relative width plus stacked components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridColumnSpec {
    #[serde(default = "default_size")]
    pub size: u32,
    #[serde(default)]
    pub content: Vec<ComponentSpec>,
}

fn default_size() -> u32 {
    1
}

/// A grid row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridRowSpec {
    pub columns: Vec<GridColumnSpec>,
}

/// Layout grid
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpec {
    pub rows: Vec<GridRowSpec>,
}

/// A complete dashboard description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSpec {
    pub metadata: DashboardMetadata,
    pub transformations: Vec<TransformationSpec>,
    pub filters: Vec<FilterSpec>,
    pub grid: GridSpec,
}

impl DashboardSpec {
    /// Parse a JSON dashboard description
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

// ============================================================================
// Renderer configuration
// ============================================================================

/// Processed dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardConfig {
    pub metadata: DashboardMetadata,
    pub filters: Vec<FilterConfig>,
    pub components: Vec<RowConfig>,
}

/// Processed filter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterConfig {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// The authored formula
    pub values_formula: String,
    /// Immediately invoked script returning the values
    pub values_script: String,
    /// Values computed against a loaded table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<CellValue>>,
}

/// Grid row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "row")]
pub struct RowConfig {
    pub id: String,
    pub columns: Vec<ColumnConfig>,
}

/// Grid column
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "column")]
pub struct ColumnConfig {
    pub id: String,
    pub flex_grow: u32,
    pub content: Vec<ComponentConfig>,
}

/// Processed component
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ComponentConfig {
    Kpi(KpiConfig),
    Chart(ChartConfig),
}

/// Processed KPI tile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiConfig {
    pub id: String,
    pub name: String,
    pub fa_icon: String,
    pub value_formula: String,
    /// COLUMN-mode translation of `value_formula`
    pub value_script: String,
    pub format_type: String,
    pub unit: String,
    /// Formatted value computed against a loaded table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_value: Option<String>,
}

/// Processed chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfig {
    pub id: String,
    pub chart_type: String,
    pub name: String,
    pub x_axis: ChartAxisSpec,
    pub series_list: Vec<ChartSeriesSpec>,
    pub style: String,
    pub area: bool,
    pub cumulative: bool,
    pub top_n: usize,
    /// Conditions with column references rewritten to column names
    pub default_filter_conditions: Option<Vec<String>>,
}

/// Column a filter selects on, optionally through a transform
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterColumn {
    Column(String),
    Transformed { column: String, transform: String },
}

// ============================================================================
// Processing
// ============================================================================

/// `Product (Units)` -> `product_units`; `-` also becomes `_` when `dashes` is set
fn slug(name: &str, dashes: bool) -> String {
    name.to_lowercase()
        .chars()
        .filter(|&c| c != '(' && c != ')')
        .map(|c| match c {
            ' ' => '_',
            '-' if dashes => '_',
            c => c,
        })
        .collect()
}

/// Turns dashboard specifications into renderer configuration
#[derive(Debug, Clone, Default)]
pub struct DashboardProcessor {
    translator: FormulaTranslator,
}

impl DashboardProcessor {
    /// Create a processor with the built-in function table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a processor translating with `translator`
    pub fn with_translator(translator: FormulaTranslator) -> Self {
        Self { translator }
    }

    /// Build the configuration against a column schema
    pub fn process(&self, spec: &DashboardSpec, schema: &ColumnSchema) -> DashboardConfig {
        DashboardConfig {
            metadata: spec.metadata.clone(),
            filters: spec
                .filters
                .iter()
                .map(|filter| self.process_filter(filter, schema))
                .collect(),
            components: spec
                .grid
                .rows
                .iter()
                .enumerate()
                .map(|(i, row)| self.process_row(i, row, schema))
                .collect(),
        }
    }

    /// Build the configuration and compute filter values and KPI display
    /// values against `table`. Values that fail to evaluate are left unset.
    pub fn process_table(&self, spec: &DashboardSpec, table: &Table) -> DashboardConfig {
        let mut config = self.process(spec, table.schema());
        let ctx = EvaluationContext::new(Some(table));

        for filter in &mut config.filters {
            match self.filter_values(&filter.values_formula, table.schema(), &ctx) {
                Ok(values) => filter.values = Some(values),
                Err(e) => log::warn!("filter '{}': {}", filter.name, e),
            }
        }

        let kpis = config
            .components
            .iter_mut()
            .flat_map(|row| row.columns.iter_mut())
            .flat_map(|column| column.content.iter_mut())
            .filter_map(|component| match component {
                ComponentConfig::Kpi(kpi) => Some(kpi),
                ComponentConfig::Chart(_) => None,
            });
        for kpi in kpis {
            match evaluate_script(&kpi.value_script, &ctx) {
                Ok(value) => kpi.display_value = Some(format_kpi(&value, &kpi.format_type)),
                Err(e) => log::warn!("kpi '{}': {}", kpi.name, e),
            }
        }

        config
    }

    fn process_filter(&self, filter: &FilterSpec, schema: &ColumnSchema) -> FilterConfig {
        FilterConfig {
            id: format!("filter_{}", filter.name.to_lowercase().replace(' ', "_")),
            name: filter.name.clone(),
            kind: filter.kind.clone(),
            values_formula: filter.values_formula.clone(),
            values_script: self
                .translator
                .filter_values_script(&filter.values_formula, schema),
            values: None,
        }
    }

    fn filter_values(
        &self,
        formula: &str,
        schema: &ColumnSchema,
        ctx: &EvaluationContext<'_>,
    ) -> Result<Vec<CellValue>> {
        let script = self.translator.translate_column(formula, schema);
        let values = match evaluate_script(&script, ctx)? {
            ScriptValue::Array(items) => items.into_iter().map(ScriptValue::into_cell).collect(),
            scalar => vec![scalar.into_cell()],
        };
        Ok(values)
    }

    fn process_row(&self, index: usize, row: &GridRowSpec, schema: &ColumnSchema) -> RowConfig {
        let id = format!("row_{}", index);
        let columns = row
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| ColumnConfig {
                id: format!("{}_col_{}", id, i),
                flex_grow: column.size,
                content: column
                    .content
                    .iter()
                    .map(|component| match component {
                        ComponentSpec::Kpi(kpi) => ComponentConfig::Kpi(self.process_kpi(kpi, schema)),
                        ComponentSpec::Chart(chart) => {
                            ComponentConfig::Chart(process_chart(chart, schema))
                        }
                    })
                    .collect(),
            })
            .collect();
        RowConfig { id, columns }
    }

    fn process_kpi(&self, kpi: &KpiSpec, schema: &ColumnSchema) -> KpiConfig {
        KpiConfig {
            id: format!("kpi_{}", slug(&kpi.name, false)),
            name: kpi.name.clone(),
            fa_icon: kpi.fa_icon.clone(),
            value_formula: kpi.value_formula.clone(),
            value_script: self.translator.translate_column(&kpi.value_formula, schema),
            format_type: kpi.format_type.clone(),
            unit: kpi.unit.clone(),
            display_value: None,
        }
    }
}

fn process_chart(chart: &ChartSpec, schema: &ColumnSchema) -> ChartConfig {
    let conditions = if chart.default_filter_conditions.is_empty() {
        None
    } else {
        Some(
            chart
                .default_filter_conditions
                .iter()
                .map(|condition| rewrite_condition(condition, schema))
                .collect(),
        )
    };

    ChartConfig {
        id: format!("chart_{}", slug(&chart.name, true)),
        chart_type: chart.chart_type.clone(),
        name: chart.name.clone(),
        x_axis: chart.x_axis.clone(),
        series_list: chart.series_list.clone(),
        style: chart.style.clone(),
        area: chart.area,
        cumulative: chart.cumulative,
        top_n: chart.top_n,
        default_filter_conditions: conditions,
    }
}

/// `N2:N="Male"` -> `gender = "Male"`; unparsable conditions are kept as written
fn rewrite_condition(condition: &str, schema: &ColumnSchema) -> String {
    match FilterCondition::parse(condition, schema) {
        Ok(parsed) => parsed.to_string(),
        Err(e) => {
            log::warn!("keeping default filter condition as written: {}", e);
            condition.to_string()
        }
    }
}

/// Map each filter name to the column its values come from.
///
/// `YEAR(C2:C)` maps to `{column, transform: "YEAR"}`; otherwise the first
/// column name mentioned in the formula, then the first column letter, then
/// the filter's own name.
pub fn filter_column_mapping(
    filters: &[FilterSpec],
    schema: &ColumnSchema,
) -> BTreeMap<String, FilterColumn> {
    let mut mapping = BTreeMap::new();

    for filter in filters {
        let formula = filter.values_formula.as_str();

        let year_column = regex_captures!(r"YEAR\(([A-Z]+)\d*:?(?:[A-Z]+)?\)", formula)
            .and_then(|(_, letter)| schema.name_for(letter));
        if let Some(column) = year_column {
            mapping.insert(
                filter.name.clone(),
                FilterColumn::Transformed {
                    column: column.to_string(),
                    transform: "YEAR".to_string(),
                },
            );
            continue;
        }

        let column = schema
            .names()
            .iter()
            .find(|name| formula.contains(name.as_str()))
            .cloned()
            .or_else(|| {
                regex!(r"\b([A-Z]+)\d*(?::[A-Z]+)?\b")
                    .captures_iter(formula)
                    .find_map(|caps| schema.name_for(&caps[1]))
                    .map(str::to_string)
            })
            .unwrap_or_else(|| filter.name.clone());

        mapping.insert(filter.name.clone(), FilterColumn::Column(column));
    }

    mapping
}

/// Evaluate a KPI against a table and format it for display
pub fn evaluate_kpi(kpi: &KpiSpec, table: &Table) -> Result<String> {
    let script = FormulaTranslator::new().translate_column(&kpi.value_formula, table.schema());
    let value = evaluate_script(&script, &EvaluationContext::new(Some(table)))?;
    Ok(format_kpi(&value, &kpi.format_type))
}
