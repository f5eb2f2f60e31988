//! A reference engine library. Handles `Plus` by summing its `I32`
//! arguments and raises on a bare `I32(5)` input; everything else passes
//! through unevaluated. Exists to document the plugin ABI a
//! `BootstrapEngine` dlopens against, not to be a useful arithmetic
//! engine.

use boss_core::{CloneReason, Expression};

/// Head an evaluate implementation returns to signal failure in-band,
/// since a panic can't safely cross this `extern "C"` boundary.
const ENGINE_ERROR_HEAD: &str = "BossEngineRaised";

fn raise(message: &str) -> Expression {
    Expression::complex(ENGINE_ERROR_HEAD, vec![Expression::String(message.to_owned())])
}

fn evaluate_expr(expression: Expression) -> Expression {
    match &expression {
        Expression::I32(5) => raise("bad input"),
        Expression::Complex(complex) if complex.head().as_str() == "Plus" => {
            let sum: i64 = complex
                .dynamic_args()
                .iter()
                .chain(complex.static_args().iter())
                .filter_map(|arg| match arg {
                    Expression::I32(v) => Some(i64::from(*v)),
                    Expression::I64(v) => Some(*v),
                    _ => None,
                })
                .sum();
            Expression::I32(sum as i32)
        }
        _ => expression.deep_clone(CloneReason::ExpressionWrapping),
    }
}

/// # Safety
/// `argument` must be a valid, non-null pointer produced by
/// `Box::into_raw::<Expression>`, and ownership transfers to this call: the
/// caller must not use it again afterward. The returned pointer transfers
/// ownership back to the caller, who is responsible for eventually
/// reclaiming it with `Box::from_raw`.
#[no_mangle]
pub unsafe extern "C" fn evaluate(argument: *mut Expression) -> *mut Expression {
    let expression = *Box::from_raw(argument);
    Box::into_raw(Box::new(evaluate_expr(expression)))
}

#[cfg(test)]
mod tests {
    use boss_core::Symbol;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn sums_plus_arguments() {
        let expr = Expression::complex("Plus", vec![Expression::I32(5), Expression::I32(4)]);
        // Plus's own arguments don't hit the `I32(5)` raise rule -- only a
        // bare, top-level `I32(5)` does.
        assert_eq!(evaluate_expr(expr), Expression::I32(9));
    }

    #[test]
    fn bare_five_raises() {
        let result = evaluate_expr(Expression::I32(5));
        let complex = result.as_complex().expect("raise produces a ComplexExpression");
        assert_eq!(complex.head().as_str(), ENGINE_ERROR_HEAD);
    }

    #[test]
    fn unrecognized_head_passes_through() {
        let expr = Expression::complex("Minus", vec![Expression::I32(5), Expression::I32(1)]);
        let result = evaluate_expr(expr.deep_clone(CloneReason::ForTesting));
        assert_eq!(result.as_complex().unwrap().head(), &Symbol::new("Minus"));
    }
}
