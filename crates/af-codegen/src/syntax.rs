//! Per-dialect spelling of expressions and statements.
//!
//! The emitter builds expressions bottom-up as [`Expr`] values and asks a
//! [`Syntax`] for every piece of surface text. Fortran keeps comparisons
//! LOGICAL and needs explicit conversions between truth values and numbers;
//! C lets doubles stand in for both.

use std::fmt::Write;

use af_core::Dialect;
use af_model::{LogicOp, MathFunction, MinMaxOp, RelationOp};

/// Fixed-form Fortran: statement text runs from column 7 to column 72.
const FORTRAN_BODY_WIDTH: usize = 66;
const FORTRAN_INDENT: &str = "      ";
const FORTRAN_CONTINUATION: &str = "     &";
const C_VALUES_PER_LINE: usize = 8;

/// Expression text plus whether it evaluates to a truth value rather than a
/// number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub text: String,
    pub condition: bool,
}

impl Expr {
    pub fn number(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            condition: false,
        }
    }

    pub fn condition(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            condition: true,
        }
    }

    /// Same expression wrapped in parentheses.
    pub fn parenthesized(self) -> Self {
        Self {
            text: format!("({})", self.text),
            condition: self.condition,
        }
    }
}

/// Surface syntax of one target language.
pub trait Syntax {
    fn dialect(&self) -> Dialect;

    fn literal(&self, value: f64) -> String;

    fn function(&self, f: MathFunction, args: &[String]) -> String;

    fn relation(&self, op: RelationOp, a: &str, b: &str) -> String;

    /// `args` are already in condition form.
    fn logic(&self, op: LogicOp, args: &[String]) -> String;

    /// Minimum or maximum that is NaN when any argument is NaN.
    fn minmax(&self, op: MinMaxOp, args: &[String]) -> String;

    /// `x` held within the given bounds; a NaN `x` passes through.
    fn clamp(&self, x: &str, lower: Option<&str>, upper: Option<&str>) -> String;

    /// First `(value, guard)` pair whose guard holds, else `otherwise`.
    fn select(&self, pieces: &[(String, String)], otherwise: &str) -> String;

    /// Text of `e` usable where a number is expected.
    fn as_number(&self, e: &Expr) -> String;

    /// Text of `e` usable where a truth value is expected.
    fn as_condition(&self, e: &Expr) -> String;

    /// Runtime helper call locating `x` in a breakpoint array.
    fn locate_bp(&self, x: &str, bp_array: &str, len: usize) -> String;

    /// Runtime helper call interpolating a flattened table.
    fn interpolate(&self, table_array: &str, dims: &[usize], coords: &[String]) -> String;

    /// One assignment statement, newline-terminated.
    fn assignment(&self, var: &str, expr: &str, indent: usize) -> String;

    fn declaration(&self, var: &str, indent: usize) -> String;

    /// Constant array definition.
    fn array(&self, name: &str, values: &[f64]) -> String;

    fn comment(&self, text: &str) -> String;
}

/// Syntax for `dialect`.
pub fn syntax_for(dialect: Dialect) -> &'static dyn Syntax {
    match dialect {
        Dialect::C => &CSyntax,
        Dialect::Fortran => &FortranSyntax,
    }
}

// ── C ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct CSyntax;

impl Syntax for CSyntax {
    fn dialect(&self) -> Dialect {
        Dialect::C
    }

    fn literal(&self, value: f64) -> String {
        if value.is_nan() {
            "NAN".to_string()
        } else if value == f64::INFINITY {
            "INFINITY".to_string()
        } else if value == f64::NEG_INFINITY {
            "-INFINITY".to_string()
        } else {
            format!("{value:?}")
        }
    }

    fn function(&self, f: MathFunction, args: &[String]) -> String {
        let name = match f {
            MathFunction::Sin => "sin",
            MathFunction::Cos => "cos",
            MathFunction::Tan => "tan",
            MathFunction::Arcsin => "asin",
            MathFunction::Arccos => "acos",
            MathFunction::Arctan => "atan",
            MathFunction::Atan2 => "atan2",
            MathFunction::Abs => "fabs",
            MathFunction::Ceiling => "ceil",
            MathFunction::Floor => "floor",
            MathFunction::Exp => "exp",
            MathFunction::Ln => "log",
            MathFunction::Log => "log10",
            MathFunction::Sqrt => "sqrt",
            MathFunction::Power => "pow",
        };
        format!("{name}({})", args.join(", "))
    }

    fn relation(&self, op: RelationOp, a: &str, b: &str) -> String {
        let sym = match op {
            RelationOp::Lt => "<",
            RelationOp::Leq => "<=",
            RelationOp::Eq => "==",
            RelationOp::Neq => "!=",
            RelationOp::Geq => ">=",
            RelationOp::Gt => ">",
        };
        format!("{a} {sym} {b}")
    }

    fn logic(&self, op: LogicOp, args: &[String]) -> String {
        match op {
            LogicOp::Not => format!("!{}", args.first().map_or("", String::as_str)),
            LogicOp::And => args.join(" && "),
            LogicOp::Or => args.join(" || "),
        }
    }

    fn minmax(&self, op: MinMaxOp, args: &[String]) -> String {
        let name = match op {
            MinMaxOp::Min => "fmin",
            MinMaxOp::Max => "fmax",
        };
        let mut iter = args.iter();
        let first = iter.next().cloned().unwrap_or_else(|| self.literal(f64::NAN));
        if args.len() < 2 {
            return first;
        }
        let nested = iter.fold(first, |acc, a| format!("{name}({acc}, {a})"));
        let guard: Vec<String> = args.iter().map(|a| format!("isnan({a})")).collect();
        format!("({}) ? NAN : {nested}", guard.join(" || "))
    }

    fn clamp(&self, x: &str, lower: Option<&str>, upper: Option<&str>) -> String {
        match (lower, upper) {
            (Some(lo), Some(hi)) => format!("{x} < {lo} ? {lo} : ({x} > {hi} ? {hi} : {x})"),
            (Some(lo), None) => format!("{x} < {lo} ? {lo} : {x}"),
            (None, Some(hi)) => format!("{x} > {hi} ? {hi} : {x}"),
            (None, None) => x.to_string(),
        }
    }

    fn select(&self, pieces: &[(String, String)], otherwise: &str) -> String {
        let mut out = String::new();
        for (value, guard) in pieces {
            let _ = write!(out, "{guard} ? {value} : ");
        }
        out.push_str(otherwise);
        out
    }

    fn as_number(&self, e: &Expr) -> String {
        e.text.clone()
    }

    fn as_condition(&self, e: &Expr) -> String {
        e.text.clone()
    }

    fn locate_bp(&self, x: &str, bp_array: &str, len: usize) -> String {
        format!("locate_bp({x}, {bp_array}, {len})")
    }

    fn interpolate(&self, table_array: &str, dims: &[usize], coords: &[String]) -> String {
        let mut args = vec![table_array.to_string()];
        args.extend(dims.iter().map(ToString::to_string));
        args.extend(coords.iter().cloned());
        format!("interp_{}d({})", dims.len(), args.join(", "))
    }

    fn assignment(&self, var: &str, expr: &str, indent: usize) -> String {
        format!("{:indent$}{var} = {expr};\n", "")
    }

    fn declaration(&self, var: &str, indent: usize) -> String {
        format!("{:indent$}double {var};\n", "")
    }

    fn array(&self, name: &str, values: &[f64]) -> String {
        let mut out = format!("static const double {name}[{}] = {{\n", values.len());
        let rows: Vec<String> = values
            .chunks(C_VALUES_PER_LINE)
            .map(|row| {
                let items: Vec<String> = row.iter().map(|v| self.literal(*v)).collect();
                format!("    {}", items.join(", "))
            })
            .collect();
        out.push_str(&rows.join(",\n"));
        out.push_str("\n};\n");
        out
    }

    fn comment(&self, text: &str) -> String {
        format!("/* {text} */\n")
    }
}

// ── Fortran ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct FortranSyntax;

impl Syntax for FortranSyntax {
    fn dialect(&self) -> Dialect {
        Dialect::Fortran
    }

    /// Double precision literal. Non-finite values need the intrinsic
    /// IEEE_ARITHMETIC module in the enclosing unit.
    fn literal(&self, value: f64) -> String {
        if value.is_nan() {
            "IEEE_VALUE(1.0D0, IEEE_QUIET_NAN)".to_string()
        } else if value.is_infinite() {
            if value > 0.0 {
                "IEEE_VALUE(1.0D0, IEEE_POSITIVE_INF)".to_string()
            } else {
                "IEEE_VALUE(1.0D0, IEEE_NEGATIVE_INF)".to_string()
            }
        } else {
            let text = format!("{value:?}");
            if text.contains('e') {
                text.replace('e', "D")
            } else {
                format!("{text}D0")
            }
        }
    }

    fn function(&self, f: MathFunction, args: &[String]) -> String {
        let joined = args.join(", ");
        let name = match f {
            MathFunction::Power => {
                return match args {
                    [base, exponent] => format!("{base}**{exponent}"),
                    _ => format!("({joined})"),
                };
            }
            MathFunction::Ceiling => return format!("DBLE(CEILING({joined}))"),
            MathFunction::Floor => return format!("DBLE(FLOOR({joined}))"),
            MathFunction::Sin => "SIN",
            MathFunction::Cos => "COS",
            MathFunction::Tan => "TAN",
            MathFunction::Arcsin => "ASIN",
            MathFunction::Arccos => "ACOS",
            MathFunction::Arctan => "ATAN",
            MathFunction::Atan2 => "ATAN2",
            MathFunction::Abs => "ABS",
            MathFunction::Exp => "EXP",
            MathFunction::Ln => "LOG",
            MathFunction::Log => "LOG10",
            MathFunction::Sqrt => "SQRT",
        };
        format!("{name}({joined})")
    }

    fn relation(&self, op: RelationOp, a: &str, b: &str) -> String {
        let sym = match op {
            RelationOp::Lt => ".LT.",
            RelationOp::Leq => ".LE.",
            RelationOp::Eq => ".EQ.",
            RelationOp::Neq => ".NE.",
            RelationOp::Geq => ".GE.",
            RelationOp::Gt => ".GT.",
        };
        format!("{a} {sym} {b}")
    }

    fn logic(&self, op: LogicOp, args: &[String]) -> String {
        match op {
            LogicOp::Not => format!(".NOT. {}", args.first().map_or("", String::as_str)),
            LogicOp::And => args.join(" .AND. "),
            LogicOp::Or => args.join(" .OR. "),
        }
    }

    fn minmax(&self, op: MinMaxOp, args: &[String]) -> String {
        match args {
            [] => self.literal(f64::NAN),
            [only] => only.clone(),
            many => {
                let name = match op {
                    MinMaxOp::Min => "MIN",
                    MinMaxOp::Max => "MAX",
                };
                let guard: Vec<String> =
                    many.iter().map(|a| format!("IEEE_IS_NAN({a})")).collect();
                format!(
                    "MERGE({}, {name}({}), {})",
                    self.literal(f64::NAN),
                    many.join(", "),
                    guard.join(" .OR. ")
                )
            }
        }
    }

    fn clamp(&self, x: &str, lower: Option<&str>, upper: Option<&str>) -> String {
        let capped = match upper {
            Some(hi) => format!("MERGE({hi}, {x}, {x} .GT. {hi})"),
            None => x.to_string(),
        };
        match lower {
            Some(lo) => format!("MERGE({lo}, {capped}, {x} .LT. {lo})"),
            None => capped,
        }
    }

    fn select(&self, pieces: &[(String, String)], otherwise: &str) -> String {
        pieces
            .iter()
            .rev()
            .fold(otherwise.to_string(), |rest, (value, guard)| {
                format!("MERGE({value}, {rest}, {guard})")
            })
    }

    fn as_number(&self, e: &Expr) -> String {
        if e.condition {
            format!("MERGE(1.0D0, 0.0D0, {})", e.text)
        } else {
            e.text.clone()
        }
    }

    fn as_condition(&self, e: &Expr) -> String {
        if e.condition {
            e.text.clone()
        } else {
            format!("({} .NE. 0.0D0)", e.text)
        }
    }

    fn locate_bp(&self, x: &str, bp_array: &str, len: usize) -> String {
        format!("LOCATE_BP({x}, {bp_array}, {len})")
    }

    fn interpolate(&self, table_array: &str, dims: &[usize], coords: &[String]) -> String {
        let mut args = vec![table_array.to_string()];
        args.extend(dims.iter().map(ToString::to_string));
        args.extend(coords.iter().cloned());
        format!("INTERP_{}D({})", dims.len(), args.join(", "))
    }

    fn assignment(&self, var: &str, expr: &str, _indent: usize) -> String {
        fixed_form(&format!("{var} = {expr}"))
    }

    fn declaration(&self, var: &str, _indent: usize) -> String {
        fixed_form(&format!("DOUBLE PRECISION {var}"))
    }

    fn array(&self, name: &str, values: &[f64]) -> String {
        let items: Vec<String> = values.iter().map(|v| self.literal(*v)).collect();
        let mut out = fixed_form(&format!("DOUBLE PRECISION {name}({})", values.len()));
        out.push_str(&fixed_form(&format!("DATA {name} / {} /", items.join(", "))));
        out
    }

    fn comment(&self, text: &str) -> String {
        format!("C     {text}\n")
    }
}

/// Lay a statement out in fixed form, continuing past column 72 with `&` in
/// column 6. Breaks prefer the position after a space or comma.
pub fn fixed_form(statement: &str) -> String {
    let mut out = String::new();
    let mut rest = statement;
    let mut prefix = FORTRAN_INDENT;
    loop {
        if rest.len() <= FORTRAN_BODY_WIDTH {
            let _ = writeln!(out, "{prefix}{rest}");
            return out;
        }
        let mut limit = FORTRAN_BODY_WIDTH;
        while !rest.is_char_boundary(limit) {
            limit -= 1;
        }
        let cut = rest[..limit]
            .rfind([' ', ','])
            .map_or(limit, |i| i + 1);
        let (head, tail) = rest.split_at(cut);
        let _ = writeln!(out, "{prefix}{}", head.trim_end());
        rest = tail;
        prefix = FORTRAN_CONTINUATION;
    }
}
