//! Integration tests for af-codegen.

use af_codegen::{CodegenOptions, generate_code, generate_model_code, generate_source};
use af_core::Dialect;
use af_model::{BlockKind, LogicOp, MathFunction, MinMaxOp, Model, ModelError, RelationOp, config};

/// x -> sin -> s, then o1 = s + x and o2 = s * s.
fn fan_out(limit_s: bool) -> Model {
    let mut model = Model::new("fan_out");
    model.new_signal("x", "x", "rad").unwrap();
    let s = model.new_signal("s", "s", "").unwrap();
    if limit_s {
        model.signal_mut(s).unwrap().set_upper_limit(0.5);
    }
    let o1 = model.new_signal("o1", "o1", "").unwrap();
    let o2 = model.new_signal("o2", "o2", "").unwrap();
    let sin = model
        .new_block("sin", BlockKind::Function(MathFunction::Sin), &["x"])
        .unwrap();
    let a = model.new_block("a", BlockKind::Sum, &["s", "x"]).unwrap();
    let b = model.new_block("b", BlockKind::Product, &["s", "s"]).unwrap();
    model.connect_output(sin, s).unwrap();
    model.connect_output(a, o1).unwrap();
    model.connect_output(b, o2).unwrap();
    model.wire();
    model.hook_up_io().unwrap();
    model.initialize().unwrap();
    model
}

#[test]
fn fan_out_signal_is_defined_once() {
    let mut model = fan_out(false);
    let out = generate_code(&mut model, Dialect::C).unwrap();
    assert_eq!(
        out.code(),
        "    s = sin(x);\n    o1 = s + x;\n    o2 = s * s;\n"
    );
    assert_eq!(out.var_names(), ["x", "s", "o1", "o2"]);
}

#[test]
fn repeated_passes_match() {
    let mut model = fan_out(false);
    let first = generate_code(&mut model, Dialect::C).unwrap();
    let second = generate_code(&mut model, Dialect::C).unwrap();
    assert_eq!(first, second);
}

#[test]
fn spliced_limiter_is_inlined() {
    let mut model = fan_out(true);
    let out = generate_code(&mut model, Dialect::C).unwrap();
    assert_eq!(
        out.code(),
        "    s_unlim = sin(x);\n\
         \x20   o1 = (s_unlim > 0.5 ? 0.5 : s_unlim) + x;\n\
         \x20   o2 = (s_unlim > 0.5 ? 0.5 : s_unlim) * (s_unlim > 0.5 ? 0.5 : s_unlim);\n"
    );
    assert!(!out.var_names().iter().any(|v| v == "s"));

    let out = generate_code(&mut model, Dialect::Fortran).unwrap();
    assert_eq!(
        out.code(),
        "      s_unlim = SIN(x)\n\
         \x20     o1 = (MERGE(0.5D0, s_unlim, s_unlim .GT. 0.5D0)) + x\n\
         \x20     o2 = (MERGE(0.5D0, s_unlim, s_unlim .GT. 0.5D0)) * (MERGE(0.5D0,\n\
         \x20    &s_unlim, s_unlim .GT. 0.5D0))\n"
    );
}

#[test]
fn limited_output_gets_named() {
    let mut model = Model::new("lim_out");
    model.new_signal("x", "x", "").unwrap();
    let y = model.new_signal("y", "y", "").unwrap();
    model.signal_mut(y).unwrap().set_lower_limit(-1.0);
    model.signal_mut(y).unwrap().set_upper_limit(1.0);
    let neg = model.new_block("neg", BlockKind::Minus, &["x"]).unwrap();
    model.connect_output(neg, y).unwrap();
    model.wire();
    model.hook_up_io().unwrap();
    model.initialize().unwrap();

    let out = generate_code(&mut model, Dialect::C).unwrap();
    assert_eq!(
        out.code(),
        "    y_unlim = -x;\n    y = y_unlim < -1.0 ? -1.0 : (y_unlim > 1.0 ? 1.0 : y_unlim);\n"
    );
}

/// y = limit(x, -2, 2) and z = max(x, y).
fn clamped_max() -> Model {
    let mut model = Model::new("clamped");
    for var in ["x", "y", "z"] {
        model.new_signal(var, var, "").unwrap();
    }
    let lim = model
        .new_block("lim", BlockKind::limiter(-2.0, 2.0), &["x"])
        .unwrap();
    let max = model
        .new_block("max", BlockKind::MinMax(MinMaxOp::Max), &["x", "y"])
        .unwrap();
    let y = model.signal_by_var_id("y").unwrap();
    let z = model.signal_by_var_id("z").unwrap();
    model.connect_output(lim, y).unwrap();
    model.connect_output(max, z).unwrap();
    model.wire();
    model.hook_up_io().unwrap();
    model.initialize().unwrap();
    model
}

#[test]
fn nan_passes_through_limiter_and_max() {
    let mut model = clamped_max();
    model.set_input("x", f64::NAN).unwrap();
    model.cycle().unwrap();
    let y = model.signal_by_var_id("y").unwrap();
    let z = model.signal_by_var_id("z").unwrap();
    assert!(model.source_value(y).unwrap().is_nan());
    assert!(model.source_value(z).unwrap().is_nan());

    // generated code keeps the same NaN behaviour: no fmin/fmax clamping
    let c = generate_code(&mut model, Dialect::C).unwrap();
    assert_eq!(
        c.code(),
        "    y = x < -2.0 ? -2.0 : (x > 2.0 ? 2.0 : x);\n\
         \x20   z = (isnan(x) || isnan(y)) ? NAN : fmax(x, y);\n"
    );
    let f = generate_code(&mut model, Dialect::Fortran).unwrap();
    assert_eq!(
        f.code(),
        "      y = MERGE(-2.0D0, MERGE(2.0D0, x, x .GT. 2.0D0), x .LT. -2.0D0)\n\
         \x20     z = MERGE(IEEE_VALUE(1.0D0, IEEE_QUIET_NAN), MAX(x, y),\n\
         \x20    &IEEE_IS_NAN(x) .OR. IEEE_IS_NAN(y))\n"
    );
}

#[test]
fn model_dialect_drives_default_codegen() {
    let cfg = config::from_yaml_str("name: cfg\ncodegen:\n  dialect: fortran\n").unwrap();
    let mut model = Model::with_config(&cfg);
    model.new_signal("x", "x", "").unwrap();
    let y = model.new_signal("y", "y", "").unwrap();
    let neg = model.new_block("neg", BlockKind::Minus, &["x"]).unwrap();
    model.connect_output(neg, y).unwrap();
    model.wire();
    model.hook_up_io().unwrap();
    model.initialize().unwrap();

    assert_eq!(generate_model_code(&mut model).unwrap().code(), "      y = -x\n");
    model.set_dialect(Dialect::C);
    assert_eq!(generate_model_code(&mut model).unwrap().code(), "    y = -x;\n");
}

fn relation_and_logic() -> Model {
    let mut model = Model::new("logic");
    for var in ["a", "b", "p"] {
        model.new_signal(var, var, "").unwrap();
    }
    let lt = model.new_signal("lt", "lt", "").unwrap();
    let both = model.new_signal("both", "both", "").unwrap();
    let rel = model
        .new_block("rel", BlockKind::Relation(RelationOp::Lt), &["a", "b"])
        .unwrap();
    let and = model
        .new_block("and", BlockKind::Logic(LogicOp::And), &["lt", "p"])
        .unwrap();
    model.connect_output(rel, lt).unwrap();
    model.connect_output(and, both).unwrap();
    model.wire();
    model.hook_up_io().unwrap();
    model.initialize().unwrap();
    model
}

#[test]
fn c_uses_values_as_truth() {
    let mut model = relation_and_logic();
    let out = generate_code(&mut model, Dialect::C).unwrap();
    assert_eq!(out.code(), "    lt = a < b;\n    both = lt && p;\n");
}

#[test]
fn fortran_converts_truth_values() {
    let mut model = relation_and_logic();
    let out = generate_code(&mut model, Dialect::Fortran).unwrap();
    assert_eq!(
        out.code(),
        "      lt = MERGE(1.0D0, 0.0D0, a .LT. b)\n\
         \x20     both = MERGE(1.0D0, 0.0D0, (lt .NE. 0.0D0) .AND. (p .NE. 0.0D0))\n"
    );
}

fn pitch_lookup() -> Model {
    let mut model = Model::new("cm");
    model.new_signal("alpha", "ALPHA", "deg").unwrap();
    model.new_signal("elevator", "EL", "deg").unwrap();
    let el_idx = model.new_signal("el index", "EL_idx", "").unwrap();
    let alpha_idx = model.new_signal("alpha index", "ALPHA_idx", "").unwrap();
    let cm = model.new_signal("cm", "CM", "").unwrap();
    let el_bp = model
        .new_breakpoint_set("DE1", "elevator", vec![-24.0, -12.0, 0.0, 12.0, 24.0])
        .unwrap();
    let alpha_bp = model
        .new_breakpoint_set("ALPHA1", "alpha", vec![-10.0, 0.0, 10.0])
        .unwrap();
    let table = model
        .new_func_table("CMT", "cm", &["DE1", "ALPHA1"], (0u8..15).map(f64::from).collect())
        .unwrap();
    let b_el = model
        .new_block("", BlockKind::Bp { bp_set: el_bp }, &["EL"])
        .unwrap();
    let b_alpha = model
        .new_block("", BlockKind::Bp { bp_set: alpha_bp }, &["ALPHA"])
        .unwrap();
    let lookup = model
        .new_block("lookup", BlockKind::FuncTable { table }, &["EL_idx", "ALPHA_idx"])
        .unwrap();
    model.connect_output(b_el, el_idx).unwrap();
    model.connect_output(b_alpha, alpha_idx).unwrap();
    model.connect_output(lookup, cm).unwrap();
    model.wire();
    model.hook_up_io().unwrap();
    model.initialize().unwrap();
    model
}

#[test]
fn table_lookup_calls_runtime_helpers() {
    let mut model = pitch_lookup();
    let out = generate_code(&mut model, Dialect::C).unwrap();
    assert_eq!(
        out.code(),
        "    ALPHA_idx = locate_bp(ALPHA, ALPHA1, 3);\n\
         \x20   EL_idx = locate_bp(EL, DE1, 5);\n\
         \x20   CM = interp_2d(CMT, 5, 3, EL_idx, ALPHA_idx);\n"
    );
    assert_eq!(
        out.var_names(),
        ["ALPHA", "ALPHA_idx", "EL", "EL_idx", "CM"]
    );

    let out = generate_code(&mut model, Dialect::Fortran).unwrap();
    assert!(out.code().contains("INTERP_2D(CMT, 5, 3, EL_idx, ALPHA_idx)"));
}

#[test]
fn full_source_has_declarations_data_and_code() {
    let mut model = pitch_lookup();
    let text = generate_source(&mut model, &CodegenOptions::new(Dialect::C)).unwrap();
    assert!(text.starts_with("/* model cm */\n    double ALPHA;\n"));
    assert!(text.contains("static const double DE1[5] = {\n    -24.0, -12.0, 0.0, 12.0, 24.0\n};\n"));
    assert!(text.contains("static const double CMT[15] = {"));
    assert!(text.ends_with("    CM = interp_2d(CMT, 5, 3, EL_idx, ALPHA_idx);\n"));

    let cfg = config::from_yaml_str("codegen:\n  dialect: fortran\n  emit_table_data: false\n")
        .unwrap();
    let text = generate_source(&mut model, &CodegenOptions::from(&cfg.codegen)).unwrap();
    assert!(text.starts_with("C     model cm\n      DOUBLE PRECISION ALPHA\n"));
    assert!(!text.contains("DATA"));
}

#[test]
fn fortran_lines_stay_in_fixed_form() {
    let mut model = Model::new("wide");
    let vars: Vec<String> = (0..12).map(|i| format!("input_number_{i}")).collect();
    for v in &vars {
        model.new_signal(v.as_str(), v.as_str(), "").unwrap();
    }
    let total = model.new_signal("total", "total", "").unwrap();
    let refs: Vec<&str> = vars.iter().map(String::as_str).collect();
    let sum = model.new_block("sum", BlockKind::Sum, &refs).unwrap();
    model.connect_output(sum, total).unwrap();
    model.wire();
    model.hook_up_io().unwrap();
    model.initialize().unwrap();

    let out = generate_code(&mut model, Dialect::Fortran).unwrap();
    let lines: Vec<&str> = out.code().lines().collect();
    assert!(lines.len() > 1);
    assert!(lines[0].starts_with("      total = input_number_0 + "));
    assert!(lines.iter().all(|l| l.len() <= 72));
    assert!(lines[1..].iter().all(|l| l.starts_with("     &")));
    let body: Vec<&str> = lines.iter().flat_map(|l| l[6..].split_whitespace()).collect();
    assert_eq!(body.iter().filter(|t| t.starts_with("input_number_")).count(), 12);
}

#[test]
fn uninitialized_model_is_rejected() {
    let mut model = Model::new("raw");
    model
        .new_block("k", BlockKind::Constant { value: 1.0 }, &[])
        .unwrap();
    assert!(matches!(
        generate_code(&mut model, Dialect::C),
        Err(ModelError::NotReady { .. })
    ));
}

#[test]
fn switch_in_both_dialects() {
    let mut model = Model::new("sw");
    for var in ["v0", "g0", "w"] {
        model.new_signal(var, var, "").unwrap();
    }
    let out = model.new_signal("out", "out", "").unwrap();
    let sw = model
        .new_block("sw", BlockKind::Switch { pieces: 1 }, &["v0", "g0", "w"])
        .unwrap();
    model.connect_output(sw, out).unwrap();
    model.wire();
    model.hook_up_io().unwrap();
    model.initialize().unwrap();

    let c = generate_code(&mut model, Dialect::C).unwrap();
    assert_eq!(c.code(), "    out = g0 ? v0 : w;\n");
    let f = generate_code(&mut model, Dialect::Fortran).unwrap();
    assert_eq!(f.code(), "      out = MERGE(v0, w, (g0 .NE. 0.0D0))\n");
}
