//! The top-level evaluator: recognizes a closed set of meta-operators and
//! dispatches everything else straight through to an engine library.

use boss_core::{ComplexExpression, CoreError, Expression, Symbol};

use crate::error::{BootstrapError, BootstrapResult};
use crate::library_cache::{EngineLibrary, LibraryCache};

const EVALUATE_IN_ENGINE: &str = "EvaluateInEngine";
const EVALUATE_IN_ENGINES: &str = "EvaluateInEngines";
const SET_DEFAULT_ENGINE: &str = "SetDefaultEngine";

/// Construction-time knobs for a [`BootstrapEngine`].
///
/// Currently just the initial default engine path; split out from the
/// engine itself so callers have a place to grow configuration (timeouts,
/// a preload list of engines to open eagerly) without changing the
/// engine's constructor signature.
#[derive(Debug, Clone, Default)]
pub struct BootstrapConfig {
    pub default_engine: Option<String>,
}

/// Single-threaded evaluator holding an [`EngineLibrary`] and an optional
/// default engine path. Not `Send`/`Sync`: callers needing concurrent
/// access must serialize it behind a mutex themselves.
///
/// Generic over the library lookup so tests can substitute an in-process
/// fake for [`LibraryCache`]'s `dlopen`-backed one; production code always
/// gets the default `LibraryCache`.
pub struct BootstrapEngine<E: EngineLibrary = LibraryCache> {
    libraries: E,
    default_engine: Option<String>,
}

impl BootstrapEngine<LibraryCache> {
    pub fn new(config: BootstrapConfig) -> Self {
        Self::with_libraries(config, LibraryCache::new())
    }
}

impl<E: EngineLibrary> BootstrapEngine<E> {
    pub fn with_libraries(config: BootstrapConfig, libraries: E) -> Self {
        Self {
            libraries,
            default_engine: config.default_engine,
        }
    }

    /// Evaluates `expression` as a top-level program: if a default engine is
    /// set and `expression` isn't itself a recognized meta-operator call,
    /// it's first wrapped as `EvaluateInEngine(defaultPath, expression)`.
    pub fn evaluate(&mut self, expression: Expression) -> BootstrapResult<Expression> {
        self.evaluate_inner(expression, true)
    }

    fn evaluate_inner(&mut self, expression: Expression, is_root: bool) -> BootstrapResult<Expression> {
        let wrapped = if is_root && self.default_engine.is_some() && !is_meta_operator(&expression) {
            let path = self.default_engine.clone().expect("checked is_some above");
            Expression::complex(EVALUATE_IN_ENGINE, vec![Expression::String(path), expression])
        } else {
            expression
        };

        let Expression::Complex(complex) = wrapped else {
            return Ok(wrapped);
        };
        let head = complex.head().as_str().to_owned();
        match head.as_str() {
            EVALUATE_IN_ENGINE => self.dispatch_evaluate_in_engine(*complex),
            EVALUATE_IN_ENGINES => self.dispatch_evaluate_in_engines(*complex),
            SET_DEFAULT_ENGINE => self.dispatch_set_default_engine(*complex),
            _ => Ok(Expression::Complex(complex)),
        }
    }

    /// Evaluates every argument left to right. The first argument of
    /// `EvaluateInEngine`/`SetDefaultEngine` is a path string, which an
    /// evaluation pass leaves untouched anyway, so there's no need to
    /// special-case it out of this uniform walk.
    fn evaluate_arguments(&mut self, args: Vec<Expression>) -> BootstrapResult<Vec<Expression>> {
        args.into_iter()
            .map(|arg| self.evaluate_inner(arg, false))
            .collect()
    }

    fn dispatch_evaluate_in_engine(&mut self, complex: ComplexExpression) -> BootstrapResult<Expression> {
        let (_, _, dynamic_args, _) = complex.decompose();
        let mut args = self.evaluate_arguments(dynamic_args)?;
        if args.is_empty() {
            return Err(CoreError::OutOfRange { index: 0, len: 0 }.into());
        }
        let path = expect_path(args.remove(0))?;

        // Every remaining argument is evaluated through the engine in
        // order; only the last result is kept.
        let mut result = Expression::I64(0);
        for arg in args {
            result = self.evaluate_through_engine(&path, arg)?;
        }
        Ok(result)
    }

    fn dispatch_evaluate_in_engines(&mut self, complex: ComplexExpression) -> BootstrapResult<Expression> {
        let (_, _, dynamic_args, _) = complex.decompose();
        let mut args = self.evaluate_arguments(dynamic_args)?;
        if args.len() != 2 {
            return Err(CoreError::OutOfRange {
                index: args.len(),
                len: 2,
            }
            .into());
        }
        let argument = args.pop().expect("checked len == 2");
        let paths_expr = args.pop().expect("checked len == 2");
        let paths = expect_path_list(paths_expr)?;

        let mut value = argument;
        for path in paths {
            value = self.evaluate_through_engine(&path, value)?;
        }
        Ok(value)
    }

    fn dispatch_set_default_engine(&mut self, complex: ComplexExpression) -> BootstrapResult<Expression> {
        let (_, _, dynamic_args, _) = complex.decompose();
        let mut args = self.evaluate_arguments(dynamic_args)?;
        if args.is_empty() {
            return Err(CoreError::OutOfRange { index: 0, len: 0 }.into());
        }
        let path = expect_path(args.remove(0))?;
        self.default_engine = Some(path);
        Ok(Expression::Symbol(Symbol::new("okay")))
    }

    fn evaluate_through_engine(&mut self, path: &str, argument: Expression) -> BootstrapResult<Expression> {
        let original = argument.deep_clone(boss_core::CloneReason::ExpressionWrapping);
        match self.libraries.evaluate(path, argument) {
            Ok(result) => Ok(result),
            Err(BootstrapError::EngineRaised { message }) => Ok(Expression::complex(
                "ErrorWhenEvaluatingExpression",
                vec![original, Expression::String(message)],
            )),
            Err(other) => Err(other),
        }
    }
}

fn is_meta_operator(expression: &Expression) -> bool {
    matches!(
        expression.as_complex().map(|c| c.head().as_str()),
        Some(EVALUATE_IN_ENGINE) | Some(EVALUATE_IN_ENGINES) | Some(SET_DEFAULT_ENGINE)
    )
}

fn expect_path(expr: Expression) -> BootstrapResult<String> {
    match expr {
        Expression::String(s) => Ok(s),
        other => Err(CoreError::ArgumentTypeMismatch {
            expected: boss_core::ExpressionKind::String,
            found: format!("{other}"),
        }
        .into()),
    }
}

fn expect_path_list(expr: Expression) -> BootstrapResult<Vec<String>> {
    let complex = expr.into_complex().map_err(|other| {
        BootstrapError::Core(CoreError::ArgumentTypeMismatch {
            expected: boss_core::ExpressionKind::Complex,
            found: format!("{other}"),
        })
    })?;
    let (_, _, dynamic_args, _) = complex.decompose();
    dynamic_args.into_iter().map(expect_path).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    /// An in-process stand-in for a `dlopen`ed engine: paths map to plain
    /// closures instead of shared-library entry points, so the dispatch
    /// logic in [`BootstrapEngine`] can be exercised without building or
    /// loading an actual `cdylib`.
    #[derive(Default)]
    struct FakeEngines {
        by_path: HashMap<String, fn(Expression) -> BootstrapResult<Expression>>,
    }

    impl FakeEngines {
        fn with(path: &str, f: fn(Expression) -> BootstrapResult<Expression>) -> Self {
            let mut engines = Self::default();
            engines.by_path.insert(path.to_owned(), f);
            engines
        }
    }

    impl EngineLibrary for FakeEngines {
        fn evaluate(&mut self, path: &str, argument: Expression) -> BootstrapResult<Expression> {
            let f = self
                .by_path
                .get(path)
                .unwrap_or_else(|| panic!("no fake engine registered at \"{path}\""));
            f(argument)
        }
    }

    const ENGINE_PATH: &str = "/fake/engine.so";

    fn eval_plus(expression: Expression) -> BootstrapResult<Expression> {
        match expression.as_complex() {
            Some(c) if c.head().as_str() == "Plus" => {
                let sum: i32 = c
                    .dynamic_args()
                    .iter()
                    .chain(c.static_args().iter())
                    .filter_map(|arg| match arg {
                        Expression::I32(v) => Some(*v),
                        _ => None,
                    })
                    .sum();
                Ok(Expression::I32(sum))
            }
            _ if matches!(expression, Expression::I32(5)) => Err(BootstrapError::EngineRaised {
                message: "bad input".to_owned(),
            }),
            other => Ok(other),
        }
    }

    fn engine_with_fake() -> BootstrapEngine<FakeEngines> {
        BootstrapEngine::with_libraries(BootstrapConfig::default(), FakeEngines::with(ENGINE_PATH, eval_plus))
    }

    #[test]
    fn basic_arithmetic_through_engine() {
        let mut engine = engine_with_fake();
        let expr = Expression::complex(
            EVALUATE_IN_ENGINE,
            vec![
                Expression::String(ENGINE_PATH.to_owned()),
                Expression::complex("Plus", vec![Expression::I32(5), Expression::I32(4)]),
            ],
        );
        let result = engine.evaluate(expr).unwrap();
        assert_eq!(result, Expression::I32(9));
    }

    #[test]
    fn engine_error_is_wrapped() {
        let mut engine = engine_with_fake();
        let expr = Expression::complex(
            EVALUATE_IN_ENGINE,
            vec![Expression::String(ENGINE_PATH.to_owned()), Expression::I32(5)],
        );
        let result = engine.evaluate(expr).unwrap();
        let complex = result.as_complex().expect("wrapped error is a ComplexExpression");
        assert_eq!(complex.head().as_str(), "ErrorWhenEvaluatingExpression");
    }

    #[test]
    fn default_engine_auto_wraps_root_expression() {
        let mut engine = engine_with_fake();
        let set = engine
            .evaluate(Expression::complex(
                SET_DEFAULT_ENGINE,
                vec![Expression::String(ENGINE_PATH.to_owned())],
            ))
            .unwrap();
        assert_eq!(set, Expression::Symbol(Symbol::new("okay")));

        let result = engine
            .evaluate(Expression::complex(
                "Plus",
                vec![Expression::I32(1), Expression::I32(2)],
            ))
            .unwrap();
        assert_eq!(result, Expression::I32(3));
    }

    #[test]
    fn pipeline_feeds_result_through_each_engine_in_order() {
        let mut engine = engine_with_fake();
        let expr = Expression::complex(
            EVALUATE_IN_ENGINES,
            vec![
                Expression::complex(
                    "List",
                    vec![
                        Expression::String(ENGINE_PATH.to_owned()),
                        Expression::String(ENGINE_PATH.to_owned()),
                    ],
                ),
                Expression::complex("Plus", vec![Expression::I32(1), Expression::I32(2)]),
            ],
        );
        let result = engine.evaluate(expr).unwrap();
        // First pass: Plus(1,2) -> 3. Second pass: the fake engine sees a
        // bare I32(3) atom, not a recognized head, and passes it through
        // unchanged.
        assert_eq!(result, Expression::I32(3));
    }
}
