//! 定数式の規則
//!
//! `#if` / `#elif` の条件式。C の優先順位に従った層を上から順に辿る。
//! 二項演算子の層は左結合で、演算子が現れなかった層は唯一の子に畳み込まれる。
//! 項の間の空白・コメントは、後ろに演算子が続く場合にだけその層が取り込む。

use crate::grammar::{RuleParser, finish};
use crate::node::ParseNode;
use crate::rule::Rule;
use crate::token::TokenKind;

impl<'g, 't> RuleParser<'g, 't> {
    /// constantExpression: 常にノードを作る（畳み込まない）
    pub(crate) fn constant_expression(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.sub(&mut out, Rule::ConditionalExpression)?;
        Some(ParseNode::new(Rule::ConstantExpression, out))
    }

    /// 三項演算子（右結合）。GNU 拡張の `a ?: b` も受け付ける
    pub(crate) fn conditional_expression(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.sub(&mut out, Rule::LogicalOrExpression)?;
        self.optional(&mut out, |p, out| {
            p.trivia(out);
            p.punct(out, TokenKind::Question)?;
            p.trivia(out);
            p.optional(out, |p, out| {
                p.sub(out, Rule::Expression)?;
                p.trivia(out);
                Some(())
            });
            p.punct(out, TokenKind::Colon)?;
            p.trivia(out);
            p.sub(out, Rule::ConditionalExpression)
        });
        Some(finish(Rule::ConditionalExpression, out))
    }

    /// カンマ演算子
    pub(crate) fn expression(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.sub(&mut out, Rule::ConditionalExpression)?;
        while self.optional(&mut out, |p, out| {
            p.trivia(out);
            p.punct(out, TokenKind::Comma)?;
            p.trivia(out);
            p.sub(out, Rule::ConditionalExpression)
        }) {}
        Some(finish(Rule::Expression, out))
    }

    /// 左結合の二項演算子の層
    pub(crate) fn binary_layer(&mut self, rule: Rule, operand: Rule, ops: &[TokenKind]) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.sub(&mut out, operand)?;
        while self.optional(&mut out, |p, out| {
            p.trivia(out);
            p.token_if(out, |t| ops.contains(&t.kind))?;
            p.trivia(out);
            p.sub(out, operand)
        }) {}
        Some(finish(rule, out))
    }

    /// 単項演算子は入れ子にできる（`!!x`, `- -1`）
    pub(crate) fn unary_expression(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.attempt(&mut out, |p, out| {
            p.sub(out, Rule::UnaryOperator)?;
            p.trivia(out);
            p.sub(out, Rule::UnaryExpression)
        })
        .or_else(|| self.sub(&mut out, Rule::PrimaryExpression))?;
        Some(finish(Rule::UnaryExpression, out))
    }

    /// 一次式
    ///
    /// 試す順序: リテラル、`__has_include`、`defined`、関数形式マクロ呼び出し、
    /// 括弧、空の括弧、識別子。
    pub(crate) fn primary_expression(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.sub(&mut out, Rule::Literal)
            .or_else(|| self.sub(&mut out, Rule::HasIncludeExpression))
            .or_else(|| self.sub(&mut out, Rule::DefinedExpression))
            .or_else(|| self.sub(&mut out, Rule::FunctionlikeMacro))
            .or_else(|| {
                self.attempt(&mut out, |p, out| {
                    p.punct(out, TokenKind::LParen)?;
                    p.trivia(out);
                    p.sub(out, Rule::Expression)?;
                    p.trivia(out);
                    p.punct(out, TokenKind::RParen)
                })
            })
            .or_else(|| {
                self.attempt(&mut out, |p, out| {
                    p.punct(out, TokenKind::LParen)?;
                    p.trivia(out);
                    p.punct(out, TokenKind::RParen)
                })
            })
            .or_else(|| self.ident(&mut out))?;
        Some(ParseNode::new(Rule::PrimaryExpression, out))
    }

    /// 数値・文字・文字列リテラルと `true` / `false`
    pub(crate) fn literal(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.token_if(&mut out, |t| match t.kind {
            TokenKind::Number | TokenKind::CharLit(_) | TokenKind::StringLit(_) => true,
            TokenKind::Ident => t.text == "true" || t.text == "false",
            _ => false,
        })?;
        Some(ParseNode::new(Rule::Literal, out))
    }

    /// `defined X` / `defined(X)`
    pub(crate) fn defined_expression(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.keyword(&mut out, "defined")?;
        self.trivia(&mut out);
        self.attempt(&mut out, |p, out| {
            p.punct(out, TokenKind::LParen)?;
            p.trivia(out);
            p.ident(out)?;
            p.trivia(out);
            p.punct(out, TokenKind::RParen)
        })
        .or_else(|| self.ident(&mut out))?;
        Some(ParseNode::new(Rule::DefinedExpression, out))
    }

    /// `__has_include(<h>)` / `__has_include_next("h")`
    pub(crate) fn has_include_expression(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.token_if(&mut out, |t| t.is_ident("__has_include") || t.is_ident("__has_include_next"))?;
        self.trivia(&mut out);
        self.punct(&mut out, TokenKind::LParen)?;
        self.trivia(&mut out);
        self.first_of(&mut out, &[Rule::IncludeBodyBracketed, Rule::IncludeBodyQuoted])?;
        self.trivia(&mut out);
        self.punct(&mut out, TokenKind::RParen)?;
        Some(ParseNode::new(Rule::HasIncludeExpression, out))
    }

    /// マクロ呼び出しの形: 識別子、（空白）、括弧で囲まれた引数並び
    ///
    /// `defined` は演算子なので呼び出しとしては読まない。
    pub(crate) fn functionlike_macro(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.token_if(&mut out, |t| t.kind == TokenKind::Ident && t.text != "defined")?;
        self.trivia(&mut out);
        self.punct(&mut out, TokenKind::LParen)?;
        self.trivia(&mut out);
        self.optional(&mut out, |p, out| p.sub(out, Rule::ArgumentList));
        self.trivia(&mut out);
        self.punct(&mut out, TokenKind::RParen)?;
        Some(ParseNode::new(Rule::FunctionlikeMacro, out))
    }
}

#[cfg(test)]
mod tests {
    use crate::grammar::Grammar;
    use crate::rule::Rule;

    fn parse(source: &str) -> crate::node::ParseNode {
        Grammar::new().parse(Rule::ConstantExpression, source).unwrap()
    }

    #[test]
    fn test_precedence() {
        let node = parse("1 + 2 * 3");
        let add = node.child(Rule::AdditiveExpression).unwrap();
        assert!(add.child(Rule::MultiplicativeExpression).is_some());
    }

    #[test]
    fn test_left_associative() {
        let node = parse("a - b - c");
        let add = node.child(Rule::AdditiveExpression).unwrap();
        // 1つの層に3つの項が並ぶ
        assert_eq!(add.child_nodes().count(), 3);
    }

    #[test]
    fn test_conditional_is_right_associative() {
        let node = parse("a ? b : c ? d : e");
        let cond = node.child(Rule::ConditionalExpression).unwrap();
        let else_branch = cond.child_nodes().last().unwrap();
        assert_eq!(else_branch.rule, Rule::ConditionalExpression);
    }

    #[test]
    fn test_gnu_elvis() {
        assert!(Grammar::new().matches(Rule::ConstantExpression, "a ?: b"));
    }

    #[test]
    fn test_nested_unary() {
        let node = parse("!!defined X");
        let unary = node.child(Rule::UnaryExpression).unwrap();
        assert_eq!(unary.child(Rule::UnaryExpression).map(|n| n.rule), Some(Rule::UnaryExpression));
        assert!(node.has_descendant(Rule::DefinedExpression));
    }

    #[test]
    fn test_defined_is_not_a_call() {
        let node = parse("defined(X)");
        assert!(node.has_descendant(Rule::DefinedExpression));
        assert!(!node.has_descendant(Rule::FunctionlikeMacro));
    }

    #[test]
    fn test_malformed_defined_is_no_match() {
        let grammar = Grammar::new();
        for source in ["defined(1)", "defined()", "defined (A, B)"] {
            assert!(!grammar.matches(Rule::ConstantExpression, source), "{}", source);
            assert!(!grammar.matches(Rule::FunctionlikeMacro, source), "{}", source);
        }
    }

    #[test]
    fn test_string_literal() {
        let node = parse("\"abc\" == L\"abc\"");
        assert_eq!(node.descendants(Rule::Literal).len(), 2);
    }

    #[test]
    fn test_empty_parentheses() {
        let node = parse("()");
        let primary = node.child(Rule::PrimaryExpression).unwrap();
        assert_eq!(primary.child_tokens().count(), 2);
    }

    #[test]
    fn test_call_with_space() {
        let node = parse("__GNUC_PREREQ (4, 1)");
        assert!(node.has_descendant(Rule::FunctionlikeMacro));
    }
}
