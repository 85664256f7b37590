//! 括弧の対応付けによる引数の走査
//!
//! マクロ呼び出しの引数はどんなトークン列でもよく、意味は問わない。
//! ここではトップレベルのカンマで区切り、括弧の入れ子だけを追跡する。
//! 空の引数（`f(,)`, `f(a,)`）も許す。

use crate::grammar::RuleParser;
use crate::node::{ParseChild, ParseNode};
use crate::rule::Rule;
use crate::token::TokenKind;

impl<'g, 't> RuleParser<'g, 't> {
    /// argumentList: 1つ以上のトークンを読むこと
    pub(crate) fn argument_list(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.optional(&mut out, |p, out| p.sub(out, Rule::Argument));
        while self.optional(&mut out, |p, out| {
            p.trivia(out);
            p.punct(out, TokenKind::Comma)?;
            p.trivia(out);
            p.optional(out, |p, out| p.sub(out, Rule::Argument));
            Some(())
        }) {}

        if out.is_empty() {
            return None;
        }
        Some(ParseNode::new(Rule::ArgumentList, out))
    }

    /// argument: 括弧を含む断片と含まない断片の並び
    pub(crate) fn argument(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.first_of(
            &mut out,
            &[Rule::SomethingContainingParentheses, Rule::SomethingWithoutParentheses],
        )?;
        while self.optional(&mut out, |p, out| {
            p.trivia(out);
            p.first_of(
                out,
                &[Rule::SomethingContainingParentheses, Rule::SomethingWithoutParentheses],
            )
        }) {}
        Some(ParseNode::new(Rule::Argument, out))
    }

    /// `f(a, (b))` のように、前置きのトークン列に続く括弧の組
    pub(crate) fn something_containing_parentheses(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.optional(&mut out, |p, out| {
            p.sub(out, Rule::SomethingWithoutParentheses)?;
            p.trivia(out);
            Some(())
        });
        self.punct(&mut out, TokenKind::LParen)?;
        self.trivia(&mut out);
        self.optional(&mut out, |p, out| p.sub(out, Rule::ArgumentList));
        self.trivia(&mut out);
        self.punct(&mut out, TokenKind::RParen)?;
        Some(ParseNode::new(Rule::SomethingContainingParentheses, out))
    }

    /// `,` `(` `)` と行末以外のトークンの並び
    ///
    /// 空白以外のトークンで始まり、末尾の空白・コメントは含めない。
    pub(crate) fn something_without_parentheses(&mut self) -> Option<ParseNode> {
        let is_plain = |kind: TokenKind| {
            !matches!(kind, TokenKind::Comma | TokenKind::LParen | TokenKind::RParen) && !kind.is_line_end()
        };

        let first = self.cursor.peek().filter(|t| !t.is_trivia() && is_plain(t.kind))?;
        self.cursor.bump();
        let mut out = vec![ParseChild::Token(first.clone())];
        let mut end = (self.cursor.mark(), out.len());

        while let Some(token) = self.cursor.peek().filter(|t| is_plain(t.kind)) {
            self.cursor.bump();
            out.push(ParseChild::Token(token.clone()));
            if !token.is_trivia() {
                end = (self.cursor.mark(), out.len());
            }
        }

        let (mark, len) = end;
        self.cursor.reset(mark);
        out.truncate(len);
        Some(ParseNode::new(Rule::SomethingWithoutParentheses, out))
    }
}

#[cfg(test)]
mod tests {
    use crate::grammar::Grammar;
    use crate::rule::Rule;

    fn accepts(rule: Rule, source: &str) -> bool {
        Grammar::new().matches(rule, source)
    }

    #[test]
    fn test_argument_list_shapes() {
        for source in ["a", "a, b", "a,", ",", "a, , b", "(a, b)", "f(x) + 1, g()"] {
            assert!(accepts(Rule::ArgumentList, source), "{source}");
        }
        assert!(!accepts(Rule::ArgumentList, "a)"));
        assert!(!accepts(Rule::ArgumentList, "(a"));
    }

    #[test]
    fn test_without_parentheses_trims_trailing_trivia() {
        let grammar = Grammar::new();
        let node = grammar
            .parse(Rule::ArgumentList, "a + b /* c */ , d")
            .unwrap();
        let first = node.child(Rule::Argument).unwrap();
        let piece = first.child(Rule::SomethingWithoutParentheses).unwrap();
        assert_eq!(piece.text(), "a + b");
    }

    #[test]
    fn test_nested_parentheses() {
        let node = Grammar::new()
            .parse(Rule::Argument, "BOOST_PP_STRINGIZE(boost/mpl/aux_/preprocessed/AUX778076_PREPROCESSED_HEADER)")
            .unwrap();
        assert!(node.has_descendant(Rule::SomethingContainingParentheses));
        assert!(node.has_descendant(Rule::ArgumentList));
    }
}
