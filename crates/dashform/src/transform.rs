//! Derived columns computed from transformation formulas.
//!
//! Each transformation is evaluated row by row in ROW mode: the formula is
//! translated with the row's own values substituted, then evaluated. The new
//! column joins the schema only after every row has a value, so later
//! transformations can refer to it by letter or by name.

use crate::dashboard::TransformationSpec;
use crate::error::Result;
use dashform_core::{CellValue, Table};
use dashform_formula::{evaluate_script, EvaluationContext, FormulaTranslator};

/// Outcome of applying one transformation
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedColumn {
    /// Column name
    pub name: String,
    /// Letter assigned in the schema
    pub letter: String,
    /// Rows whose value could not be computed (left empty)
    pub failed_rows: usize,
}

/// Extension trait for Table to add derived-column calculation
pub trait TableTransformExt {
    /// Apply transformations in order with a default context
    fn apply_transformations(&mut self, specs: &[TransformationSpec]) -> Result<Vec<DerivedColumn>>;

    /// Apply transformations in order, evaluating with `ctx` (its dataset is ignored)
    fn apply_transformations_with(
        &mut self,
        specs: &[TransformationSpec],
        ctx: &EvaluationContext<'_>,
    ) -> Result<Vec<DerivedColumn>>;
}

impl TableTransformExt for Table {
    fn apply_transformations(&mut self, specs: &[TransformationSpec]) -> Result<Vec<DerivedColumn>> {
        self.apply_transformations_with(specs, &EvaluationContext::new(None))
    }

    fn apply_transformations_with(
        &mut self,
        specs: &[TransformationSpec],
        ctx: &EvaluationContext<'_>,
    ) -> Result<Vec<DerivedColumn>> {
        let translator = FormulaTranslator::new();
        let ctx = EvaluationContext { data: None, ..*ctx };
        let mut derived = Vec::with_capacity(specs.len());

        for spec in specs {
            let (values, failed_rows) = compute_column(self, &translator, spec, &ctx);
            let letter = self.add_column(spec.name.as_str(), values)?;

            if failed_rows > 0 {
                log::warn!(
                    "column '{}': {} of {} rows could not be computed",
                    spec.name,
                    failed_rows,
                    self.row_count()
                );
            }
            log::info!("created column '{}' ({})", spec.name, letter);

            derived.push(DerivedColumn {
                name: spec.name.clone(),
                letter,
                failed_rows,
            });
        }

        Ok(derived)
    }
}

fn compute_column(
    table: &Table,
    translator: &FormulaTranslator,
    spec: &TransformationSpec,
    ctx: &EvaluationContext<'_>,
) -> (Vec<CellValue>, usize) {
    if !spec.formula.starts_with('=') {
        let constant = CellValue::string(spec.formula.as_str());
        return (vec![constant; table.row_count()], 0);
    }

    let mut failed = 0;
    let values = table
        .rows()
        .map(|row| {
            let script = translator.translate_row(&spec.formula, row);
            match evaluate_script(&script, ctx) {
                Ok(value) => value.into_cell(),
                Err(e) => {
                    log::warn!(
                        "column '{}', row {}: cannot evaluate {:?}: {}",
                        spec.name,
                        row.index(),
                        script,
                        e
                    );
                    failed += 1;
                    CellValue::Empty
                }
            }
        })
        .collect();

    (values, failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn spec(name: &str, formula: &str) -> TransformationSpec {
        TransformationSpec {
            name: name.to_string(),
            formula: formula.to_string(),
        }
    }

    #[test]
    fn test_constant_column() {
        let mut table = Table::from_rows(["a"], vec![vec![1.into()], vec![2.into()]]);
        table.apply_transformations(&[spec("source", "manual")]).unwrap();
        assert_eq!(
            table.column_values("source").unwrap(),
            &[CellValue::from("manual"), CellValue::from("manual")]
        );
    }

    #[test]
    fn test_failed_rows_are_empty() {
        let mut table = Table::from_rows(["a"], vec![vec![1.into()], vec![2.into()]]);
        let derived = table
            .apply_transformations(&[spec("broken", "=NOSUCHFUNCTION(A2)")])
            .unwrap();
        assert_eq!(derived[0].failed_rows, 2);
        assert_eq!(derived[0].letter, "B");
        assert_eq!(
            table.column_values("broken").unwrap(),
            &[CellValue::Empty, CellValue::Empty]
        );
    }
}
