//! Property tests required by the suite: random integer expressions match a
//! reference evaluator, and the optimizer never changes an observable result.

use proptest::prelude::*;

use emberc::driver::{CompilerDriver, Target};
use emberc::vm::{self, Value};

#[derive(Debug, Clone)]
enum Expr {
    Lit(i64),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
}

impl Expr {
    fn render(&self) -> String {
        match self {
            Expr::Lit(n) if *n < 0 => format!("({n})"),
            Expr::Lit(n) => n.to_string(),
            Expr::Add(l, r) => format!("({} + {})", l.render(), r.render()),
            Expr::Sub(l, r) => format!("({} - {})", l.render(), r.render()),
            Expr::Mul(l, r) => format!("({} * {})", l.render(), r.render()),
        }
    }

    /// Reference evaluator using the same wrapping semantics the VM and
    /// constant folder both implement (`spec.md` §4.8).
    fn eval(&self) -> i64 {
        match self {
            Expr::Lit(n) => *n,
            Expr::Add(l, r) => l.eval().wrapping_add(r.eval()),
            Expr::Sub(l, r) => l.eval().wrapping_sub(r.eval()),
            Expr::Mul(l, r) => l.eval().wrapping_mul(r.eval()),
        }
    }
}

fn arb_expr(depth: u32) -> BoxedStrategy<Expr> {
    let leaf = (-1000i64..1000).prop_map(Expr::Lit);
    if depth == 0 {
        leaf.boxed()
    } else {
        leaf.prop_recursive(depth, depth * 3, 3, |inner| {
            prop_oneof![
                (inner.clone(), inner.clone()).prop_map(|(l, r)| Expr::Add(Box::new(l), Box::new(r))),
                (inner.clone(), inner.clone()).prop_map(|(l, r)| Expr::Sub(Box::new(l), Box::new(r))),
                (inner.clone(), inner).prop_map(|(l, r)| Expr::Mul(Box::new(l), Box::new(r))),
            ]
        })
        .boxed()
    }
}

fn run_with_driver(driver: &mut CompilerDriver, source: &str) -> Value {
    let result = driver.compile(source, Target::Bytecode);
    assert!(result.success, "{:?}", result.diagnostics);
    let exec = vm::execute(&result.bytecode, result.bytecode.main());
    assert!(exec.success, "{}", exec.error_message);
    exec.return_value
}

/// Bytecode generated straight from the unoptimized IR (no constant folding,
/// no copy propagation, no dead-code elimination applied).
fn run_unoptimized(source: &str) -> Value {
    use emberc::checker;
    use emberc::diagnostics::Diagnostics;
    use emberc::ir;

    let mut diagnostics = Diagnostics::new();
    let (unit, mut interner) = emberc::parser::parse_source(source, &mut diagnostics);
    let output = checker::check(&unit, &interner, &mut diagnostics);
    assert!(!diagnostics.has_errors(), "{diagnostics:?}");
    let module = ir::lower(&unit, &mut interner, &output.expr_types);
    let bytecode = emberc::bytecode::generate(&module);
    let exec = vm::execute(&bytecode, bytecode.main());
    assert!(exec.success, "{}", exec.error_message);
    exec.return_value
}

proptest! {
    #[test]
    fn random_integer_expressions_match_a_reference_evaluator(expr in arb_expr(3)) {
        let source = format!("return {};\n", expr.render());
        let mut driver = CompilerDriver::new();
        let value = run_with_driver(&mut driver, &source);
        prop_assert_eq!(value, Value::Int(expr.eval()));
    }

    #[test]
    fn optimizer_never_changes_the_observable_result(expr in arb_expr(3)) {
        let source = format!("return {};\n", expr.render());
        let unoptimized_value = run_unoptimized(&source);
        let mut driver = CompilerDriver::new();
        let optimized_value = run_with_driver(&mut driver, &source);
        prop_assert_eq!(unoptimized_value, optimized_value);
    }

    #[test]
    fn random_straight_line_programs_match_a_reference_evaluator(a in -500i64..500, b in -500i64..500, c in -500i64..500) {
        let source = format!("flux x = {a};\nflux y = {b};\nflux z = {c};\nx = x + y;\ny = y * z;\nreturn x - y;\n");
        let mut driver = CompilerDriver::new();
        let value = run_with_driver(&mut driver, &source);
        let expected = a.wrapping_add(b).wrapping_sub(b.wrapping_mul(c));
        prop_assert_eq!(value, Value::Int(expected));
    }
}
