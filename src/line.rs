//! ディレクティブ行の振り分けと単純な行規則
//!
//! 各行規則は行末（改行または入力終端）まで一致しなければならない。
//! どの指令にも当てはまらない `#` 行は miscLine になる。

use crate::grammar::RuleParser;
use crate::node::ParseNode;
use crate::rule::Rule;
use crate::token::TokenKind;

/// 試す順序
const LINE_RULES: &[Rule] = &[
    Rule::DefineLine,
    Rule::IncludeLine,
    Rule::PpImport,
    Rule::PpModule,
    Rule::IfLine,
    Rule::IfdefLine,
    Rule::ElifLine,
    Rule::ElseLine,
    Rule::EndifLine,
    Rule::UndefLine,
    Rule::LineLine,
    Rule::ErrorLine,
    Rule::PragmaLine,
    Rule::WarningLine,
    Rule::MiscLine,
];

impl<'g, 't> RuleParser<'g, 't> {
    pub(crate) fn preprocessor_line(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.first_of(&mut out, LINE_RULES)?;
        Some(ParseNode::new(Rule::PreprocessorLine, out))
    }

    /// `#if` / `#elif`: 式の後には空白・コメントしか置けない
    pub(crate) fn condition_line(&mut self, rule: Rule, name: &str) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.directive_head(&mut out, &[name])?;
        self.trivia(&mut out);
        self.sub(&mut out, Rule::ConstantExpression)?;
        self.end_of_line(&mut out)?;
        Some(ParseNode::new(rule, out))
    }

    /// `#ifdef` / `#ifndef`: 名前の後ろの余分なトークンは許す
    pub(crate) fn ifdef_line(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.directive_head(&mut out, &["ifdef", "ifndef"])?;
        self.trivia(&mut out);
        self.ident(&mut out)?;
        self.rest_of_line(&mut out);
        Some(ParseNode::new(Rule::IfdefLine, out))
    }

    pub(crate) fn undef_line(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.directive_head(&mut out, &["undef"])?;
        self.trivia(&mut out);
        self.ident(&mut out)?;
        self.rest_of_line(&mut out);
        Some(ParseNode::new(Rule::UndefLine, out))
    }

    /// `#else` / `#endif`: 後ろの余分なトークンは許す
    pub(crate) fn bare_line(&mut self, rule: Rule, name: &str) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.directive_head(&mut out, &[name])?;
        self.rest_of_line(&mut out);
        Some(ParseNode::new(rule, out))
    }

    /// `#line`: 1つ以上のトークンが必要
    pub(crate) fn line_line(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.directive_head(&mut out, &["line"])?;
        if self.rest_of_line(&mut out) == 0 {
            return None;
        }
        Some(ParseNode::new(Rule::LineLine, out))
    }

    /// `#error` / `#warning` / `#pragma`: 後ろは任意のトークン列（空でもよい）
    pub(crate) fn message_line(&mut self, rule: Rule, name: &str) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.directive_head(&mut out, &[name])?;
        self.rest_of_line(&mut out);
        Some(ParseNode::new(rule, out))
    }

    /// その他の `#` 行（空の `#` や未知の指令）
    pub(crate) fn misc_line(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.trivia(&mut out);
        self.punct(&mut out, TokenKind::Hash)?;
        self.rest_of_line(&mut out);
        Some(ParseNode::new(Rule::MiscLine, out))
    }
}
