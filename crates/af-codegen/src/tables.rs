//! Declarations and static table data.

use af_core::Dialect;
use af_model::Model;

use crate::emit::{CodegenOptions, array_name};
use crate::syntax::syntax_for;

/// One double precision declaration per name, in order.
pub fn generate_declarations(var_names: &[String], dialect: Dialect) -> String {
    generate_declarations_with(var_names, &CodegenOptions::new(dialect))
}

pub fn generate_declarations_with(var_names: &[String], options: &CodegenOptions) -> String {
    let syntax = syntax_for(options.dialect);
    var_names
        .iter()
        .map(|v| syntax.declaration(v, options.indent))
        .collect()
}

/// Constant arrays for every breakpoint set and function table, in the
/// order they were added. Table values are flattened with the last
/// dimension varying fastest, matching the runtime interpolation helpers.
pub fn generate_table_data(model: &Model, dialect: Dialect) -> String {
    let syntax = syntax_for(dialect);
    let mut out = String::new();
    for bp in model.breakpoint_sets() {
        out.push_str(&syntax.comment(&format!("breakpoints {}", bp.name())));
        out.push_str(&syntax.array(&array_name(bp.id()), bp.values()));
    }
    for table in model.tables() {
        let dims: Vec<String> = table.dims().iter().map(ToString::to_string).collect();
        out.push_str(&syntax.comment(&format!(
            "table {} ({}) over {}",
            table.name(),
            dims.join("x"),
            table.bp_ids().join(", ")
        )));
        out.push_str(&syntax.array(&array_name(table.id()), table.values()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declarations_per_dialect() {
        let names = vec!["alpha".to_string(), "cm".to_string()];
        assert_eq!(
            generate_declarations(&names, Dialect::C),
            "    double alpha;\n    double cm;\n"
        );
        assert_eq!(
            generate_declarations(&names, Dialect::Fortran),
            "      DOUBLE PRECISION alpha\n      DOUBLE PRECISION cm\n"
        );
    }

    #[test]
    fn table_data_lists_sets_then_tables() {
        let mut model = Model::new("t");
        model
            .new_breakpoint_set("X1", "x", vec![0.0, 1.0])
            .unwrap();
        model
            .new_func_table("T1", "t of x", &["X1"], vec![5.0, 7.0])
            .unwrap();
        let text = generate_table_data(&model, Dialect::C);
        assert_eq!(
            text,
            "/* breakpoints x */\n\
             static const double X1[2] = {\n    0.0, 1.0\n};\n\
             /* table t of x (2) over X1 */\n\
             static const double T1[2] = {\n    5.0, 7.0\n};\n"
        );
    }
}
