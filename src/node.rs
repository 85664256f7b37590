//! 構文木
//!
//! 規則が一致するたびに1つのノードが作られ、子としてトークン（葉）か
//! 入れ子のノードを順に持つ。ノードの範囲は子の範囲を隙間なく連結したもの。

use std::ops::Range;

use serde::Serialize;

use crate::rule::Rule;
use crate::token::Token;

/// ノードの子（トークンまたはノード）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParseChild {
    Token(Token),
    Node(ParseNode),
}

impl ParseChild {
    /// ノードなら参照を返す
    pub fn as_node(&self) -> Option<&ParseNode> {
        match self {
            ParseChild::Node(node) => Some(node),
            ParseChild::Token(_) => None,
        }
    }

    /// トークンなら参照を返す
    pub fn as_token(&self) -> Option<&Token> {
        match self {
            ParseChild::Token(token) => Some(token),
            ParseChild::Node(_) => None,
        }
    }
}

/// 構文木のノード
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseNode {
    /// このノードを生成した規則
    pub rule: Rule,
    pub children: Vec<ParseChild>,
}

impl ParseNode {
    /// 新しいノードを作成
    pub fn new(rule: Rule, children: Vec<ParseChild>) -> Self {
        Self { rule, children }
    }

    /// 直下の子ノード
    pub fn child_nodes(&self) -> impl Iterator<Item = &ParseNode> {
        self.children.iter().filter_map(ParseChild::as_node)
    }

    /// 直下のトークン（トリビアを除く）
    pub fn child_tokens(&self) -> impl Iterator<Item = &Token> {
        self.children
            .iter()
            .filter_map(ParseChild::as_token)
            .filter(|t| !t.is_trivia())
    }

    /// 指定した規則の直下の子ノード
    pub fn child(&self, rule: Rule) -> Option<&ParseNode> {
        self.child_nodes().find(|n| n.rule == rule)
    }

    /// 指定した規則の最初の子孫（自分自身は含まない、先行順）
    pub fn first_descendant(&self, rule: Rule) -> Option<&ParseNode> {
        for node in self.child_nodes() {
            if node.rule == rule {
                return Some(node);
            }
            if let Some(found) = node.first_descendant(rule) {
                return Some(found);
            }
        }
        None
    }

    /// 指定した規則のすべての子孫（先行順）
    pub fn descendants(&self, rule: Rule) -> Vec<&ParseNode> {
        let mut out = Vec::new();
        self.collect_descendants(rule, &mut out);
        out
    }

    fn collect_descendants<'n>(&'n self, rule: Rule, out: &mut Vec<&'n ParseNode>) {
        for node in self.child_nodes() {
            if node.rule == rule {
                out.push(node);
            }
            node.collect_descendants(rule, out);
        }
    }

    /// 指定した規則の子孫があるかどうか
    pub fn has_descendant(&self, rule: Rule) -> bool {
        self.first_descendant(rule).is_some()
    }

    /// すべての葉トークン（入力順）
    pub fn tokens(&self) -> Vec<&Token> {
        let mut out = Vec::new();
        self.collect_tokens(&mut out);
        out
    }

    fn collect_tokens<'n>(&'n self, out: &mut Vec<&'n Token>) {
        for child in &self.children {
            match child {
                ParseChild::Token(token) => out.push(token),
                ParseChild::Node(node) => node.collect_tokens(out),
            }
        }
    }

    /// 空白・コメントを除いた葉トークン
    pub fn significant_tokens(&self) -> Vec<&Token> {
        self.tokens().into_iter().filter(|t| !t.is_trivia()).collect()
    }

    /// 一致したソーステキストをそのまま返す
    pub fn text(&self) -> String {
        self.tokens().iter().map(|t| t.text.as_str()).collect()
    }

    /// トリビアを1つの空白にまとめたテキスト
    pub fn significant_text(&self) -> String {
        join_significant(self.tokens())
    }

    /// 最初の葉トークン
    pub fn first_token(&self) -> Option<&Token> {
        self.children.iter().find_map(|child| match child {
            ParseChild::Token(token) => Some(token),
            ParseChild::Node(node) => node.first_token(),
        })
    }

    /// 最後の葉トークン
    pub fn last_token(&self) -> Option<&Token> {
        self.children.iter().rev().find_map(|child| match child {
            ParseChild::Token(token) => Some(token),
            ParseChild::Node(node) => node.last_token(),
        })
    }

    /// ソース上のバイト範囲（空のノードなら None）
    pub fn span(&self) -> Option<Range<usize>> {
        let first = self.first_token()?;
        let last = self.last_token()?;
        Some(first.loc.offset..last.end_offset())
    }
}

/// トークン列を、トリビアの連続を1つの空白にまとめて連結する
///
/// トリビアが取り除かれた列でも、元の位置に隙間があれば空白を入れる。
pub fn join_significant<'t>(tokens: impl IntoIterator<Item = &'t Token>) -> String {
    let mut out = String::new();
    let mut pending_space = false;
    let mut prev_end: Option<usize> = None;
    for token in tokens {
        if token.is_trivia() || token.kind.is_line_end() {
            pending_space = !out.is_empty();
            continue;
        }
        let gap = prev_end.is_some_and(|end| end < token.loc.offset);
        if pending_space || gap {
            out.push(' ');
            pending_space = false;
        }
        out.push_str(&token.text);
        prev_end = Some(token.end_offset());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn leaf_children(source: &str) -> Vec<ParseChild> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .filter(|t| !t.kind.is_line_end())
            .map(ParseChild::Token)
            .collect()
    }

    #[test]
    fn test_text_and_span() {
        let inner = ParseNode::new(Rule::PrimaryExpression, leaf_children("( a )"));
        let node = ParseNode::new(Rule::ConstantExpression, vec![ParseChild::Node(inner)]);

        assert_eq!(node.text(), "( a )");
        assert_eq!(node.significant_text(), "( a )");
        assert_eq!(node.span(), Some(0..5));
        assert_eq!(node.significant_tokens().len(), 3);
    }

    #[test]
    fn test_descendant_queries() {
        let literal = ParseNode::new(Rule::Literal, leaf_children("1"));
        let defined = ParseNode::new(Rule::DefinedExpression, leaf_children("defined X"));
        let and = ParseNode::new(
            Rule::LogicalAndExpression,
            vec![ParseChild::Node(defined), ParseChild::Node(literal)],
        );
        let root = ParseNode::new(Rule::ConstantExpression, vec![ParseChild::Node(and)]);

        assert!(root.has_descendant(Rule::DefinedExpression));
        assert_eq!(root.descendants(Rule::Literal).len(), 1);
        assert!(root.child(Rule::LogicalAndExpression).is_some());
        assert!(root.child(Rule::Literal).is_none());
        assert!(root.first_descendant(Rule::ConstantExpression).is_none());
    }

    #[test]
    fn test_join_significant() {
        let tokens = tokenize("a  /* c */  b\t").unwrap();
        assert_eq!(join_significant(&tokens), "a b");
    }
}
