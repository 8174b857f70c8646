//! End-to-end tests: formulas translated in ROW and COLUMN mode, then
//! evaluated by the runtime against a table

use dashform_core::{CellValue, ColumnSchema, Table};
use dashform_formula::{
    convert_and, convert_if, convert_or, convert_statements, evaluate_script, excel_text,
    split_arguments, EvaluationContext, FormulaTranslator, FunctionTable, ScriptValue,
};
use pretty_assertions::assert_eq;

fn sales() -> Table {
    Table::from_rows(
        ["region", "sales"],
        vec![
            vec!["east".into(), 100.into()],
            vec!["west".into(), 200.into()],
        ],
    )
}

fn eval_column(table: &Table, formula: &str) -> ScriptValue {
    let script = FormulaTranslator::new().translate_column(formula, table.schema());
    evaluate_script(&script, &EvaluationContext::new(Some(table)))
        .unwrap_or_else(|e| panic!("{} -> {}: {}", formula, script, e))
}

fn eval_row(table: &Table, index: usize, formula: &str) -> ScriptValue {
    let row = table.row(index).unwrap();
    let script = FormulaTranslator::new().translate_row(formula, row);
    evaluate_script(&script, &EvaluationContext::simple())
        .unwrap_or_else(|e| panic!("{} -> {}: {}", formula, script, e))
}

#[test]
fn test_column_letters() {
    assert_eq!(ColumnSchema::column_to_letters(0), "A");
    assert_eq!(ColumnSchema::column_to_letters(25), "Z");
    assert_eq!(ColumnSchema::column_to_letters(26), "AA");
    assert_eq!(ColumnSchema::column_to_letters(701), "ZZ");
}

#[test]
fn test_argument_splitting() {
    assert_eq!(split_arguments(r#"a,"b,c",d"#), vec!["a", r#""b,c""#, "d"]);
    assert_eq!(split_arguments("f(1,2),3"), vec!["f(1,2)", "3"]);
}

#[test]
fn test_sum_over_column_range() {
    let table = sales();
    let script = FormulaTranslator::new().translate_column("=SUM(B2:B)", table.schema());
    assert_eq!(script, r#"arraySum(getColumnData("sales", 2))"#);
    assert_eq!(eval_column(&table, "=SUM(B2:B)"), ScriptValue::Number(300.0));
}

#[test]
fn test_column_mode_aggregates() {
    let table = sales();
    assert_eq!(eval_column(&table, "=AVERAGE(B2:B)"), ScriptValue::Number(150.0));
    assert_eq!(eval_column(&table, "=MAX(B:B)"), ScriptValue::Number(200.0));
    assert_eq!(eval_column(&table, "=SUM(B3:B)"), ScriptValue::Number(200.0));
    assert_eq!(
        eval_column(&table, r#"=SUMIF(A2:A, "east", B2:B)"#),
        ScriptValue::Number(100.0)
    );
    assert_eq!(
        eval_column(&table, r#"=COUNTIF(B2:B, ">=150")"#),
        ScriptValue::Number(1.0)
    );
    assert_eq!(eval_column(&table, "=COUNTA(region)"), ScriptValue::Number(2.0));
    assert_eq!(eval_column(&table, "=B3-B2"), ScriptValue::Number(100.0));
    assert_eq!(eval_column(&table, "=ROUND(AVERAGE(B2:B)/7, 2)"), ScriptValue::Number(21.43));
}

#[test]
fn test_percentage_growth_idiom() {
    let table = Table::from_rows(
        ["current", "previous"],
        vec![vec![110.into(), 100.into()], vec![90.into(), 100.into()]],
    );
    let formula = "=AVERAGE(((A2:A-B2:B)/B2:B)*100)";
    let script = FormulaTranslator::new().translate_column(formula, table.schema());
    assert!(script.contains("arrayPercentageGrowth"), "{}", script);
    assert_eq!(eval_column(&table, formula), ScriptValue::Number(0.0));

    let with_zero = Table::from_rows(
        ["current", "previous"],
        vec![vec![110.into(), 100.into()], vec![50.into(), 0.into()]],
    );
    assert_eq!(eval_column(&with_zero, formula), ScriptValue::Number(5.0));
}

#[test]
fn test_filter_values_script() {
    let table = sales();
    let translator = FormulaTranslator::new();
    let script = translator.filter_values_script("=UNIQUE(A2:A)", table.schema());
    assert!(script.starts_with("(function() { return "));

    assert_eq!(
        eval_column(&table, "=UNIQUE(A2:A)"),
        ScriptValue::Array(vec!["east".into(), "west".into()])
    );
}

#[test]
fn test_row_mode_derived_values() {
    let table = Table::from_rows(
        ["age", "name", "joined"],
        vec![
            vec![42.into(), "Bob".into(), "2021-06-01".into()],
            vec![12.into(), "".into(), "03/15/2024".into()],
        ],
    );

    let formula = r#"=IF(AND(A2>18,B2<>""),"adult","minor")"#;
    assert_eq!(eval_row(&table, 0, formula), ScriptValue::from("adult"));
    assert_eq!(eval_row(&table, 1, formula), ScriptValue::from("minor"));

    assert_eq!(eval_row(&table, 0, "=A2*2+1"), ScriptValue::Number(85.0));
    assert_eq!(eval_row(&table, 0, r#"=B2&" is "&A2"#), ScriptValue::from("Bob is 42"));
    assert_eq!(eval_row(&table, 1, "=YEAR(C2)"), ScriptValue::Number(2024.0));
    assert_eq!(
        eval_row(&table, 0, r#"=TEXT(C2, "mmmm yyyy")"#),
        ScriptValue::from("June 2021")
    );
    assert_eq!(
        eval_row(&table, 0, r#"=IF(OR(age<18, age>65), "discount", "full")"#),
        ScriptValue::from("full")
    );
}

#[test]
fn test_row_mode_empty_values_are_zero() {
    let table = Table::from_rows(
        ["a", "b"],
        vec![vec![CellValue::Empty, 3.into()]],
    );
    assert_eq!(eval_row(&table, 0, "=A2+B2"), ScriptValue::Number(3.0));
}

#[test]
fn test_search_sentinels_differ_by_mode() {
    let table = sales();
    // Row mode: not found is NaN, so ISNUMBER is false
    assert_eq!(
        eval_row(&table, 0, r#"=ISNUMBER(SEARCH("zz", A2))"#),
        ScriptValue::Boolean(false)
    );
    assert_eq!(
        eval_row(&table, 0, r#"=ISNUMBER(SEARCH("AS", A2))"#),
        ScriptValue::Boolean(true)
    );
    // Column mode: not found is -1, which ISNUMBER accepts
    assert_eq!(
        eval_column(&table, r#"=SEARCH("zz", A2)"#),
        ScriptValue::Number(-1.0)
    );
    assert_eq!(
        eval_column(&table, r#"=ISNUMBER(SEARCH("zz", A2))"#),
        ScriptValue::Boolean(true)
    );
    assert_eq!(
        eval_column(&table, r#"=IF(SEARCH("zz", A2) > 0, "hit", "miss")"#),
        ScriptValue::from("miss")
    );
}

#[test]
fn test_row_mode_uppercase_header_range() {
    let table = Table::from_rows(
        ["ID", "kind"],
        vec![vec![7.into(), "a".into()], vec![8.into(), "b".into()]],
    );
    assert_eq!(eval_row(&table, 0, "=ID2:ID*2"), ScriptValue::Number(14.0));
    assert_eq!(eval_row(&table, 0, "=ID*2"), ScriptValue::Number(14.0));
    assert_eq!(eval_column(&table, "=SUM(ID2:ID)"), ScriptValue::Number(15.0));
}

#[test]
fn test_doubled_quote_escape() {
    let table = sales();
    assert_eq!(
        eval_row(&table, 0, r#"=A2&" says ""hi""""#),
        ScriptValue::from(r#"east says "hi""#)
    );
    assert_eq!(
        eval_row(&table, 0, r#"=IF(A2="east","""quoted""","plain")"#),
        ScriptValue::from(r#""quoted""#)
    );
}

#[test]
fn test_uppercase_boolean_literals() {
    let table = Table::from_rows(
        ["name", "active"],
        vec![
            vec!["a".into(), true.into()],
            vec!["b".into(), false.into()],
            vec!["c".into(), true.into()],
        ],
    );
    assert_eq!(eval_row(&table, 0, "=IF(B2=TRUE,1,0)"), ScriptValue::Number(1.0));
    assert_eq!(eval_row(&table, 1, "=IF(B2=TRUE,1,0)"), ScriptValue::Number(0.0));
    assert_eq!(eval_column(&table, "=COUNTIF(B2:B,TRUE)"), ScriptValue::Number(2.0));
    assert_eq!(eval_column(&table, "=COUNTIF(B2:B,FALSE)"), ScriptValue::Number(1.0));
}

#[test]
fn test_literals_pass_through() {
    let table = sales();
    let translator = FormulaTranslator::new();
    assert_eq!(translator.translate_column("Revenue", table.schema()), r#""Revenue""#);
    assert_eq!(
        translator.translate_row("Revenue", table.row(0).unwrap()),
        r#""Revenue""#
    );
}

#[test]
fn test_unparsable_if_is_left_in_place() {
    let out = convert_statements(r#"IF(A>1,"only two")"#);
    assert_eq!(out, r#"IF(A>1,"only two")"#);
}

#[test]
fn test_converters_are_idempotent() {
    let formulas = [
        r#"IF(A>1,IF(B>2,"x","y"),"z")"#,
        r#"IF(AND(A>1,OR(B<2,C=3)),"yes","no")"#,
        "AND(A>1,B<2)",
        "OR(A>1,B<2,C<3)",
    ];
    for formula in formulas {
        let once = convert_or(&convert_and(&convert_if(formula)));
        assert!(!once.contains("IF(") && !once.contains("AND(") && !once.contains("OR("));
        assert_eq!(convert_if(&once), once);
        assert_eq!(convert_and(&once), once);
        assert_eq!(convert_or(&once), once);
    }
}

#[test]
fn test_text_format_table() {
    let date = ScriptValue::from("2024-03-15");
    for (code, expected) in [
        ("mmm yyyy", "Mar 2024"),
        ("mmmm-yyyy", "March 2024"),
        ("mm/yyyy", "03/2024"),
        ("yyyy-mm", "2024-03"),
        ("yyyy-mm-dd", "2024-03-15"),
        ("mm/dd/yyyy", "03/15/2024"),
        ("dd/mm/yyyy", "15/03/2024"),
        ("mmm", "Mar"),
        ("month", "March"),
        ("yyyy", "2024"),
        ("month_num", "03"),
        ("dd", "15"),
    ] {
        assert_eq!(excel_text(&date, code), expected, "{}", code);
    }

    let number = ScriptValue::from("1234.5");
    for (code, expected) in [
        ("0", "1235"),
        ("0.0", "1234.5"),
        ("0.00", "1234.50"),
        ("$0", "$1235"),
        ("$0.00", "$1234.50"),
        ("#,##0", "1,235"),
        ("#,##0.00", "1,234.50"),
    ] {
        assert_eq!(excel_text(&number, code), expected, "{}", code);
    }

    assert_eq!(excel_text(&ScriptValue::Number(0.5), "0%"), "50%");
    assert_eq!(excel_text(&ScriptValue::Number(0.5), "0.0%"), "50.0%");
    assert_eq!(
        excel_text(&ScriptValue::from("not-a-date-or-number"), "yyyy"),
        "not-a-date-or-number"
    );
}

#[test]
fn test_alternate_function_table() {
    let table = sales();
    let translator = FormulaTranslator::with_functions(FunctionTable::from_pairs([("TOTAL", "arraySum")]));
    let script = translator.translate_column("=TOTAL(B2:B)", table.schema());
    assert_eq!(script, r#"arraySum(getColumnData("sales", 2))"#);
    // Functions outside the table keep their spreadsheet names
    assert_eq!(
        translator.translate_column("=SUM(B2:B)", table.schema()),
        r#"SUM(getColumnData("sales", 2))"#
    );
}
