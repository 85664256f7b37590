//! 文法規則のキー
//!
//! 各規則は安定した名前（camelCase）で識別される。構文木のノードは
//! どの規則で生成されたかをこのキーで記録する。

use std::fmt;

use serde::{Serialize, Serializer};

macro_rules! rules {
    ($($variant:ident => $name:literal,)*) => {
        /// 文法規則
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Rule {
            $($variant,)*
        }

        impl Rule {
            /// すべての規則
            pub const ALL: &'static [Rule] = &[$(Rule::$variant,)*];

            /// 規則名（例: `defineLine`）
            pub fn name(self) -> &'static str {
                match self {
                    $(Rule::$variant => $name,)*
                }
            }

            /// 規則名から変換
            pub fn from_name(name: &str) -> Option<Rule> {
                match name {
                    $($name => Some(Rule::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

rules! {
    // ディレクティブ行
    PreprocessorLine => "preprocessorLine",
    DefineLine => "defineLine",
    IncludeLine => "includeLine",
    PpImport => "ppImport",
    PpModule => "ppModule",
    IfLine => "ifLine",
    IfdefLine => "ifdefLine",
    ElifLine => "elifLine",
    ElseLine => "elseLine",
    EndifLine => "endifLine",
    UndefLine => "undefLine",
    LineLine => "lineLine",
    ErrorLine => "errorLine",
    PragmaLine => "pragmaLine",
    WarningLine => "warningLine",
    MiscLine => "miscLine",

    // マクロ定義
    FunctionlikeMacroDefinition => "functionlikeMacroDefinition",
    ObjectlikeMacroDefinition => "objectlikeMacroDefinition",
    ParameterList => "parameterList",
    VariadicParameter => "variadicParameter",
    ReplacementList => "replacementList",
    Stringizing => "stringizing",
    TokenPasting => "tokenPasting",
    PpToken => "ppToken",

    // 括弧の対応付けによる引数の走査
    ArgumentList => "argumentList",
    Argument => "argument",
    SomethingContainingParentheses => "somethingContainingParentheses",
    SomethingWithoutParentheses => "somethingWithoutParentheses",

    // インクルード・インポート・モジュール
    IncludeBody => "includeBody",
    ExpandedIncludeBody => "expandedIncludeBody",
    IncludeBodyBracketed => "includeBodyBracketed",
    IncludeBodyQuoted => "includeBodyQuoted",
    IncludeBodyFreeform => "includeBodyFreeform",
    ModuleName => "moduleName",

    // 定数式
    ConstantExpression => "constantExpression",
    ConditionalExpression => "conditionalExpression",
    Expression => "expression",
    LogicalOrExpression => "logicalOrExpression",
    LogicalAndExpression => "logicalAndExpression",
    InclusiveOrExpression => "inclusiveOrExpression",
    ExclusiveOrExpression => "exclusiveOrExpression",
    AndExpression => "andExpression",
    EqualityExpression => "equalityExpression",
    RelationalExpression => "relationalExpression",
    ShiftExpression => "shiftExpression",
    AdditiveExpression => "additiveExpression",
    MultiplicativeExpression => "multiplicativeExpression",
    UnaryExpression => "unaryExpression",
    UnaryOperator => "unaryOperator",
    PrimaryExpression => "primaryExpression",
    Literal => "literal",
    DefinedExpression => "definedExpression",
    HasIncludeExpression => "hasIncludeExpression",
    FunctionlikeMacro => "functionlikeMacro",
}

impl Rule {
    /// 演算子が無いとき唯一の子に畳み込まれる式の層かどうか
    pub fn collapses_single_child(self) -> bool {
        matches!(
            self,
            Rule::ConditionalExpression
                | Rule::Expression
                | Rule::LogicalOrExpression
                | Rule::LogicalAndExpression
                | Rule::InclusiveOrExpression
                | Rule::ExclusiveOrExpression
                | Rule::AndExpression
                | Rule::EqualityExpression
                | Rule::RelationalExpression
                | Rule::ShiftExpression
                | Rule::AdditiveExpression
                | Rule::MultiplicativeExpression
                | Rule::UnaryExpression
        )
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Rule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        for &rule in Rule::ALL {
            assert_eq!(Rule::from_name(rule.name()), Some(rule));
        }
        assert_eq!(Rule::from_name("noSuchRule"), None);
    }

    #[test]
    fn test_names_are_stable() {
        assert_eq!(Rule::DefineLine.name(), "defineLine");
        assert_eq!(Rule::ConstantExpression.to_string(), "constantExpression");
        assert_eq!(Rule::HasIncludeExpression.name(), "hasIncludeExpression");
    }

    #[test]
    fn test_collapsing_layers() {
        assert!(Rule::LogicalAndExpression.collapses_single_child());
        assert!(!Rule::ConstantExpression.collapses_single_child());
        assert!(!Rule::PrimaryExpression.collapses_single_child());
    }
}
