//! Built-in runtime functions
//!
//! Every function is registered under each name the translator can emit for
//! it: the spreadsheet name left in row expressions (`LEFT`) and the mapped
//! name used in column expressions (`excelLeft`).

pub mod array;
pub mod date;
pub mod logical;
pub mod math;
pub mod text;

use super::evaluator::{EvaluationContext, ScriptValue};
use crate::error::FormulaResult;
use ahash::AHashMap;

/// Function implementation signature
pub type FunctionImpl = fn(&[ScriptValue], &EvaluationContext) -> FormulaResult<ScriptValue>;

/// Function definition
pub struct FunctionDef {
    /// Function name as called
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
}

/// Function registry
pub struct FunctionRegistry {
    functions: AHashMap<String, FunctionDef>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: AHashMap::new(),
        };

        registry.register_text_functions();
        registry.register_date_functions();
        registry.register_math_functions();
        registry.register_logical_functions();
        registry.register_array_functions();

        registry
    }

    /// Look up a function by name; exact spelling first, then uppercase
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions
            .get(name)
            .or_else(|| self.functions.get(&name.to_uppercase()))
    }

    /// Whether a function is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Register a function
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_string(), def);
    }

    /// Register one implementation under several names
    fn register_aliases(
        &mut self,
        names: &[&'static str],
        min_args: usize,
        max_args: Option<usize>,
        implementation: FunctionImpl,
    ) {
        for &name in names {
            self.register(FunctionDef {
                name,
                min_args,
                max_args,
                implementation,
            });
        }
    }

    fn register_text_functions(&mut self) {
        self.register_aliases(&["LEFT", "excelLeft"], 1, Some(2), text::fn_left);
        self.register_aliases(&["RIGHT", "excelRight"], 1, Some(2), text::fn_right);
        self.register_aliases(&["MID", "excelMid"], 3, Some(3), text::fn_mid);
        self.register_aliases(&["VALUE", "parseFloat", "float"], 1, Some(1), text::fn_value);
        self.register_aliases(&["ISNUMBER", "excelIsNumber"], 1, Some(1), text::fn_isnumber);
        self.register_aliases(&["SEARCH"], 2, Some(3), text::fn_search);
        self.register_aliases(&["excelSearch"], 2, Some(3), text::fn_search_index);
        self.register_aliases(&["TEXT", "excelText"], 2, Some(2), text::fn_text);
        self.register_aliases(&["LEN", "len"], 1, Some(1), text::fn_len);
        self.register_aliases(&["str", "String"], 1, Some(1), text::fn_str);
    }

    fn register_date_functions(&mut self) {
        self.register_aliases(&["TIME", "excelTime"], 2, Some(3), date::fn_time);
        self.register_aliases(&["HOUR", "excelHour"], 1, Some(1), date::fn_hour);
        self.register_aliases(&["TIMEVALUE", "excelTimeValue"], 1, Some(1), date::fn_timevalue);
        self.register_aliases(&["YEAR", "arrayMapYear"], 1, Some(1), date::fn_year);
        self.register_aliases(&["MONTH", "getMonth"], 1, Some(1), date::fn_month);
        self.register_aliases(&["TODAY", "excelToday"], 0, Some(0), date::fn_today);
    }

    fn register_math_functions(&mut self) {
        self.register_aliases(&["ROUND", "Math.round"], 1, Some(2), math::fn_round);
        self.register_aliases(&["ABS", "Math.abs"], 1, Some(1), math::fn_abs);
        self.register_aliases(&["INT", "Math.floor"], 1, Some(1), math::fn_floor);
        self.register_aliases(&["int"], 1, Some(1), math::fn_trunc);
        self.register_aliases(&["CHOOSE", "excelChoose"], 2, None, math::fn_choose);
    }

    fn register_logical_functions(&mut self) {
        self.register_aliases(&["IF", "excelIf"], 2, Some(3), logical::fn_if);
        self.register_aliases(&["AND", "excelAnd"], 1, None, logical::fn_and);
        self.register_aliases(&["OR", "excelOr"], 1, None, logical::fn_or);
    }

    fn register_array_functions(&mut self) {
        self.register_aliases(&["SUM", "arraySum"], 1, None, array::fn_sum);
        self.register_aliases(&["AVERAGE", "AVG", "arrayAvg"], 1, None, array::fn_average);
        self.register_aliases(&["COUNT", "arrayCount"], 1, None, array::fn_count);
        self.register_aliases(&["COUNTA", "arrayCountA"], 1, None, array::fn_counta);
        self.register_aliases(&["MAX", "arrayMax"], 1, None, array::fn_max);
        self.register_aliases(&["MIN", "arrayMin"], 1, None, array::fn_min);
        self.register_aliases(&["SUMIF", "arraySumIf"], 2, Some(3), array::fn_sumif);
        self.register_aliases(&["COUNTIF", "arrayCountIf"], 2, Some(2), array::fn_countif);
        self.register_aliases(&["COUNTIFS", "arrayCountIfs"], 2, None, array::fn_countifs);
        self.register_aliases(&["UNIQUE", "arrayUnique"], 1, Some(2), array::fn_unique);
        self.register_aliases(&["INDEX", "arrayIndex"], 2, Some(3), array::fn_index);
        self.register_aliases(&["MATCH", "arrayMatch"], 2, Some(3), array::fn_match);
        self.register_aliases(&["arrayPercentageGrowth"], 2, Some(2), array::fn_percentage_growth);
        self.register_aliases(&["getColumnData"], 1, Some(2), array::fn_column_data);
        self.register_aliases(&["getCellValue"], 2, Some(2), array::fn_cell_value);
    }
}

/// Integer argument at `index`, truncated; `default` when absent
pub(crate) fn int_arg(args: &[ScriptValue], index: usize, default: i64) -> i64 {
    match args.get(index) {
        None | Some(ScriptValue::Null) => default,
        Some(v) => {
            let n = v.to_number();
            if n.is_nan() {
                default
            } else {
                n.trunc() as i64
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::FunctionTable;

    #[test]
    fn test_every_mapped_name_is_registered() {
        let registry = FunctionRegistry::new();
        for (excel, script) in FunctionTable::default().iter() {
            assert!(registry.contains(script), "{} -> {} missing", excel, script);
        }
    }

    #[test]
    fn test_lookup_falls_back_to_uppercase() {
        let registry = FunctionRegistry::new();
        assert!(registry.contains("left"));
        assert!(registry.contains("arraySum"));
        assert!(!registry.contains("arraysum"));
    }

    #[test]
    fn test_aliases_share_arity() {
        let registry = FunctionRegistry::new();
        let excel = registry.get("MID").unwrap();
        let script = registry.get("excelMid").unwrap();
        assert_eq!(excel.min_args, script.min_args);
        assert_eq!(excel.max_args, script.max_args);
    }
}
