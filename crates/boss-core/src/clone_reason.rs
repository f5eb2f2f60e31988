use std::fmt;

/// Audit tag required by every deep copy of an [`Expression`](crate::Expression)
/// or [`ComplexExpression`](crate::ComplexExpression).
///
/// Reasons don't change cloning semantics; they exist so that every place in
/// the codebase that pays for a deep copy has to say why, which is what
/// caught unintended copies during the history of the system this was ported
/// from. Keep the enumeration closed -- adding a variant should mean adding a
/// genuinely new call site category, not working around the requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloneReason {
    ForTesting,
    ConversionToCustomExpression,
    ConversionToCBossExpression,
    ImplicitConversionWithGetArguments,
    FunctionReturningLvalue,
    FunctionTakingDefaultExpression,
    EvaluateConstExpression,
    ExpressionWrapping,
    ExpressionSubstitution,
    ExpressionAugmentation,
}

impl fmt::Display for CloneReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::ForTesting => "FOR_TESTING",
            Self::ConversionToCustomExpression => "CONVERSION_TO_CUSTOM_EXPRESSION",
            Self::ConversionToCBossExpression => "CONVERSION_TO_C_BOSS_EXPRESSION",
            Self::ImplicitConversionWithGetArguments => "IMPLICIT_CONVERSION_WITH_GET_ARGUMENTS",
            Self::FunctionReturningLvalue => "FUNCTION_RETURNING_LVALUE",
            Self::FunctionTakingDefaultExpression => "FUNCTION_TAKING_DEFAULT_EXPRESSION",
            Self::EvaluateConstExpression => "EVALUATE_CONST_EXPRESSION",
            Self::ExpressionWrapping => "EXPRESSION_WRAPPING",
            Self::ExpressionSubstitution => "EXPRESSION_SUBSTITUTION",
            Self::ExpressionAugmentation => "EXPRESSION_AUGMENTATION",
        };
        f.write_str(text)
    }
}
