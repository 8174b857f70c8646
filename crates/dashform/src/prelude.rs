//! Prelude module - common imports for dashform users
//!
//! ```rust
//! use dashform::prelude::*;
//! ```

pub use crate::{
    // Table types
    CellValue,
    ColumnSchema,
    CsvReadOptions,
    // I/O types
    CsvReader,
    CsvWriteOptions,
    CsvWriter,
    // Dashboard types
    DashboardProcessor,
    DashboardSpec,
    // Error types
    Error,
    EvaluationContext,
    FilterCondition,
    // Formula types
    FormulaTranslator,
    KpiSpec,
    Result,
    ScriptValue,
    Table,
    // Extension traits
    TableConditionExt,
    TableTransformExt,
    TransformationSpec,
};
