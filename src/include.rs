//! `#include` と C++20 の import / module 宣言
//!
//! インクルード本体は `<...>`、`"..."`、マクロ展開を前提とした自由形式
//! （識別子またはマクロ呼び出し）の3通り。

use crate::grammar::{Children, RuleParser};
use crate::node::ParseNode;
use crate::rule::Rule;
use crate::token::TokenKind;

impl<'g, 't> RuleParser<'g, 't> {
    /// `#include` / `#include_next`
    pub(crate) fn include_line(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.directive_head(&mut out, &["include", "include_next"])?;
        self.trivia(&mut out);
        self.sub(&mut out, Rule::IncludeBody)?;
        self.end_of_line(&mut out)?;
        Some(ParseNode::new(Rule::IncludeLine, out))
    }

    pub(crate) fn include_body(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.first_of(
            &mut out,
            &[Rule::IncludeBodyBracketed, Rule::IncludeBodyQuoted, Rule::IncludeBodyFreeform],
        )?;
        Some(ParseNode::new(Rule::IncludeBody, out))
    }

    /// マクロ展開後の本体（`<...>` か `"..."` のみ）
    pub(crate) fn expanded_include_body(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.first_of(&mut out, &[Rule::IncludeBodyBracketed, Rule::IncludeBodyQuoted])?;
        Some(ParseNode::new(Rule::ExpandedIncludeBody, out))
    }

    /// `<` と `>` の間に1つ以上のトークン（同じ行の中）
    pub(crate) fn include_body_bracketed(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.punct(&mut out, TokenKind::Lt)?;
        self.token_if(&mut out, |t| t.kind != TokenKind::Gt && !t.kind.is_line_end())?;
        while self
            .token_if(&mut out, |t| t.kind != TokenKind::Gt && !t.kind.is_line_end())
            .is_some()
        {}
        self.punct(&mut out, TokenKind::Gt)?;
        Some(ParseNode::new(Rule::IncludeBodyBracketed, out))
    }

    pub(crate) fn include_body_freeform(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.sub(&mut out, Rule::FunctionlikeMacro)
            .or_else(|| self.ident(&mut out))?;
        Some(ParseNode::new(Rule::IncludeBodyFreeform, out))
    }

    /// `[export] import <header>;` / `import name;` / `import :partition;`
    pub(crate) fn pp_import(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.trivia(&mut out);
        self.optional(&mut out, |p, out| {
            p.keyword(out, "export")?;
            p.trivia(out);
            Some(())
        });
        self.keyword(&mut out, "import")?;
        self.trivia(&mut out);

        self.attempt(&mut out, |p, out| {
            // ヘッダーユニットのセミコロンは省略可能
            p.first_of(out, &[Rule::IncludeBodyBracketed, Rule::IncludeBodyQuoted])?;
            p.optional(out, |p, out| {
                p.trivia(out);
                p.punct(out, TokenKind::Semi)
            });
            Some(())
        })
        .or_else(|| {
            self.attempt(&mut out, |p, out| {
                p.optional(out, |p, out| {
                    p.punct(out, TokenKind::Colon)?;
                    p.trivia(out);
                    Some(())
                });
                p.sub(out, Rule::ModuleName)?;
                p.trivia(out);
                p.punct(out, TokenKind::Semi)
            })
        })?;

        self.end_of_line(&mut out)?;
        Some(ParseNode::new(Rule::PpImport, out))
    }

    /// グローバルモジュール断片、プライベート断片、名前付きモジュール宣言
    pub(crate) fn pp_module(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.trivia(&mut out);
        self.attempt(&mut out, |p, out| {
            p.keyword(out, "module")?;
            p.trivia(out);
            p.punct(out, TokenKind::Semi)
        })
        .or_else(|| {
            self.attempt(&mut out, |p, out| {
                p.keyword(out, "module")?;
                p.trivia(out);
                p.punct(out, TokenKind::Colon)?;
                p.trivia(out);
                p.keyword(out, "private")?;
                p.trivia(out);
                p.punct(out, TokenKind::Semi)
            })
        })
        .or_else(|| self.attempt(&mut out, |p, out| p.named_module(out)))?;

        self.end_of_line(&mut out)?;
        Some(ParseNode::new(Rule::PpModule, out))
    }

    fn named_module(&mut self, out: &mut Children) -> Option<()> {
        self.optional(out, |p, out| {
            p.keyword(out, "export")?;
            p.trivia(out);
            Some(())
        });
        self.keyword(out, "module")?;
        self.trivia(out);
        self.sub(out, Rule::ModuleName)?;
        self.optional(out, |p, out| {
            p.trivia(out);
            p.punct(out, TokenKind::Colon)?;
            p.trivia(out);
            p.sub(out, Rule::ModuleName)
        });
        self.trivia(out);
        self.punct(out, TokenKind::Semi)
    }

    /// `a.b.c`
    pub(crate) fn module_name(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.ident(&mut out)?;
        while self.optional(&mut out, |p, out| {
            p.punct(out, TokenKind::Dot)?;
            p.ident(out)
        }) {}
        Some(ParseNode::new(Rule::ModuleName, out))
    }
}

#[cfg(test)]
mod tests {
    use crate::grammar::Grammar;
    use crate::rule::Rule;

    #[test]
    fn test_include_body_forms() {
        let grammar = Grammar::new();
        let bracketed = grammar.parse(Rule::IncludeBody, "<sys/types.h>").unwrap();
        assert!(bracketed.child(Rule::IncludeBodyBracketed).is_some());

        let quoted = grammar.parse(Rule::IncludeBody, "\"local.h\"").unwrap();
        assert!(quoted.child(Rule::IncludeBodyQuoted).is_some());

        let freeform = grammar.parse(Rule::IncludeBody, "CONFIG_HEADER").unwrap();
        assert!(freeform.child(Rule::IncludeBodyFreeform).is_some());
    }

    #[test]
    fn test_expanded_body_rejects_identifier() {
        let grammar = Grammar::new();
        assert!(grammar.matches(Rule::ExpandedIncludeBody, "<a>"));
        assert!(!grammar.matches(Rule::ExpandedIncludeBody, "CONFIG_HEADER"));
    }

    #[test]
    fn test_bracketed_needs_content() {
        assert!(!Grammar::new().matches(Rule::IncludeBodyBracketed, "<>"));
    }

    #[test]
    fn test_prefixed_string_is_not_quoted_body() {
        assert!(!Grammar::new().matches(Rule::IncludeBodyQuoted, "L\"a.h\""));
    }

    #[test]
    fn test_module_partition() {
        let node = Grammar::new()
            .parse(Rule::PpModule, "export module foo.bar:part;")
            .unwrap();
        assert_eq!(node.descendants(Rule::ModuleName).len(), 2);
    }
}
