//! C and Fortran code generation for aeroflow models.
//!
//! [`generate_code`] walks an initialized model's execution order and
//! returns the assignment statements together with every variable they
//! touch; [`generate_model_code`] does the same in the dialect the model
//! was configured with. Breakpoint location and table interpolation are
//! emitted as calls to runtime helpers (`locate_bp`, `interp_<n>d`) that
//! the consumer of the generated code supplies; [`generate_table_data`]
//! emits the arrays they read.

pub mod code;
pub mod emit;
pub mod syntax;
pub mod tables;

pub use code::CodeAndVarNames;
pub use emit::{
    CodegenOptions, generate_code, generate_code_with, generate_model_code, generate_source,
};
pub use syntax::{CSyntax, Expr, FortranSyntax, Syntax, fixed_form, syntax_for};
pub use tables::{generate_declarations, generate_declarations_with, generate_table_data};
