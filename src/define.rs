//! `#define` の規則
//!
//! 関数形式マクロはマクロ名の直後に空白なしで `(` が続く場合だけ。
//! 置換リストは文字列化 (`#`)、トークン連結 (`##`) とそれ以外の
//! 前処理トークンの並びで、空でもよい。

use crate::grammar::{Children, RuleParser};
use crate::node::ParseNode;
use crate::rule::Rule;
use crate::token::{EncodingPrefix, TokenKind};

impl<'g, 't> RuleParser<'g, 't> {
    /// defineLine: 関数形式を先に試す
    pub(crate) fn define_line(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.first_of(
            &mut out,
            &[Rule::FunctionlikeMacroDefinition, Rule::ObjectlikeMacroDefinition],
        )?;
        Some(ParseNode::new(Rule::DefineLine, out))
    }

    /// `#define NAME(params) replacement`
    pub(crate) fn functionlike_macro_definition(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.define_head(&mut out)?;
        self.punct(&mut out, TokenKind::LParen)?;
        self.trivia(&mut out);
        self.optional(&mut out, |p, out| p.sub(out, Rule::ParameterList));
        self.trivia(&mut out);
        self.punct(&mut out, TokenKind::RParen)?;
        self.trivia(&mut out);
        self.sub(&mut out, Rule::ReplacementList)?;
        self.end_of_line(&mut out)?;
        Some(ParseNode::new(Rule::FunctionlikeMacroDefinition, out))
    }

    /// `#define NAME replacement`
    pub(crate) fn objectlike_macro_definition(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.define_head(&mut out)?;
        if self.cursor.peek_kind() == TokenKind::LParen {
            return None;
        }
        self.trivia(&mut out);
        self.sub(&mut out, Rule::ReplacementList)?;
        self.end_of_line(&mut out)?;
        Some(ParseNode::new(Rule::ObjectlikeMacroDefinition, out))
    }

    /// `# define NAME` まで
    fn define_head(&mut self, out: &mut Children) -> Option<()> {
        self.directive_head(out, &["define"])?;
        self.trivia(out);
        self.ident(out)
    }

    /// 仮引数の並び。可変長引数は最後にだけ置ける
    pub(crate) fn parameter_list(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        let mut variadic = self.parameter(&mut out)?;
        while !variadic
            && self.optional(&mut out, |p, out| {
                p.trivia(out);
                p.punct(out, TokenKind::Comma)?;
                p.trivia(out);
                variadic = p.parameter(out)?;
                Some(())
            })
        {}
        Some(ParseNode::new(Rule::ParameterList, out))
    }

    /// 仮引数1つ。可変長引数なら true
    fn parameter(&mut self, out: &mut Children) -> Option<bool> {
        if self.sub(out, Rule::VariadicParameter).is_some() {
            return Some(true);
        }
        self.ident(out)?;
        Some(false)
    }

    /// `...` または GNU 拡張の `args...`
    pub(crate) fn variadic_parameter(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.optional(&mut out, |p, out| {
            p.ident(out)?;
            p.trivia(out);
            Some(())
        });
        self.punct(&mut out, TokenKind::Ellipsis)?;
        Some(ParseNode::new(Rule::VariadicParameter, out))
    }

    /// 置換リスト。末尾の空白・コメントは含めない
    pub(crate) fn replacement_list(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        if self.optional(&mut out, |p, out| p.replacement_element(out)) {
            while self.optional(&mut out, |p, out| {
                p.trivia(out);
                p.replacement_element(out)
            }) {}
        }
        Some(ParseNode::new(Rule::ReplacementList, out))
    }

    fn replacement_element(&mut self, out: &mut Children) -> Option<()> {
        if self.cursor.at_line_end() {
            return None;
        }
        self.first_of(out, &[Rule::Stringizing, Rule::TokenPasting, Rule::PpToken])
    }

    /// `#param`、またはエンコーディングプレフィックス付きの `L#param`
    pub(crate) fn stringizing(&mut self) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.optional(&mut out, |p, out| {
            p.token_if(out, |t| {
                t.kind == TokenKind::Ident
                    && EncodingPrefix::from_spelling(&t.text).is_some()
            })?;
            (p.cursor.peek_kind() == TokenKind::Hash).then_some(())
        });
        self.punct(&mut out, TokenKind::Hash)?;
        self.trivia(&mut out);
        self.ident(&mut out)?;
        Some(ParseNode::new(Rule::Stringizing, out))
    }
}
