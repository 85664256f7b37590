//! 文法の実行基盤
//!
//! `Grammar` は構築後に変更されない値で、複数スレッドから同時に参照できる。
//! 1回のパースごとに `RuleParser` がカーソルとバックトラック状態を持つ。
//!
//! 各規則は `RuleParser` のメソッドとして実装され、`Rule` キーを通して
//! 互いを参照する（`RuleParser::rule`）。代替は宣言順に試し、失敗したら
//! カーソルを元に戻す（順序付き選択）。失敗は `None` で表し、例外的な
//! 制御フローは使わない。
//!
//! 失敗した (規則, 位置) は深さ上限によるものも含めてパースの終わりまで
//! 記録し、同じ試行を繰り返さない。閉じていない括弧や深すぎる入れ子で
//! 走査が指数的に増えるのを防ぐ。上限は規則呼び出しの入れ子で数えるので、
//! 式の括弧1段はおよそ14段に当たる。

use std::collections::{BTreeSet, HashSet};
use std::sync::OnceLock;

use log::{debug, trace};

use crate::error::{CompileError, ParseError, Result};
use crate::lexer::Lexer;
use crate::node::{ParseChild, ParseNode};
use crate::rule::Rule;
use crate::source::{FileId, SourceLocation};
use crate::token::{EncodingPrefix, Token, TokenKind};
use crate::token_source::TokenCursor;

/// 規則の再帰深さの既定上限
pub const DEFAULT_MAX_RULE_DEPTH: usize = 1024;

/// 文法設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarConfig {
    /// 規則呼び出しの入れ子の上限（超えた場合は不一致として扱う）
    pub max_rule_depth: usize,
    /// モック化された規則（規則名と同じ綴りの識別子1つにだけ一致する）
    pub mocked_rules: BTreeSet<Rule>,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            max_rule_depth: DEFAULT_MAX_RULE_DEPTH,
            mocked_rules: BTreeSet::new(),
        }
    }
}

/// `Grammar` のビルダー
#[derive(Debug, Default)]
pub struct GrammarBuilder {
    config: GrammarConfig,
}

impl GrammarBuilder {
    /// 再帰深さの上限を設定
    pub fn max_rule_depth(mut self, depth: usize) -> Self {
        self.config.max_rule_depth = depth;
        self
    }

    /// 規則をモック化する（文法の1層だけを切り出してテストする用途）
    pub fn mock(mut self, rule: Rule) -> Self {
        self.config.mocked_rules.insert(rule);
        self
    }

    /// 文法を構築
    pub fn build(self) -> Grammar {
        Grammar {
            config: self.config,
        }
    }
}

/// プリプロセッサ文法
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    config: GrammarConfig,
}

static GLOBAL_GRAMMAR: OnceLock<Grammar> = OnceLock::new();

impl Grammar {
    /// 既定設定の文法を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// ビルダーを作成
    pub fn builder() -> GrammarBuilder {
        GrammarBuilder::default()
    }

    /// プロセス全体で共有する既定の文法
    pub fn global() -> &'static Grammar {
        GLOBAL_GRAMMAR.get_or_init(Grammar::new)
    }

    /// 設定を取得
    pub fn config(&self) -> &GrammarConfig {
        &self.config
    }

    /// 規則がモック化されているか
    pub fn is_mocked(&self, rule: Rule) -> bool {
        self.config.mocked_rules.contains(&rule)
    }

    /// トークン列全体を指定した規則でパースする
    ///
    /// 前後の空白・コメントと末尾の改行はルートノードに含める。
    /// 入力全体に一致しなければ `None`。
    pub fn parse_tokens(&self, rule: Rule, tokens: &[Token]) -> Option<ParseNode> {
        let mut parser = RuleParser::new(self, tokens);

        let mut leading = Vec::new();
        parser.trivia(&mut leading);

        let mut node = parser.rule(rule)?;
        if node.rule != rule {
            // 畳み込まれた式の層でも、ルートは要求された規則にする
            node = ParseNode::new(rule, vec![ParseChild::Node(node)]);
        }

        let mut trailing = Vec::new();
        parser.trivia(&mut trailing);
        if parser.cursor.peek_kind() == TokenKind::Newline {
            parser.any_token(&mut trailing);
            parser.trivia(&mut trailing);
        }
        if !parser.cursor.at_eof() {
            trace!(
                "{} matched only {} of {} tokens",
                rule,
                parser.cursor.position(),
                tokens.len().saturating_sub(1)
            );
            return None;
        }

        if !leading.is_empty() {
            leading.append(&mut node.children);
            node.children = leading;
        }
        node.children.append(&mut trailing);
        Some(node)
    }

    /// 文字列を字句解析して指定した規則でパースする
    pub fn parse(&self, rule: Rule, source: &str) -> Result<ParseNode> {
        self.parse_at(rule, source, FileId::default(), 1)
    }

    /// ファイルと開始行を指定してパースする
    pub fn parse_at(&self, rule: Rule, source: &str, file_id: FileId, line: u32) -> Result<ParseNode> {
        let tokens = Lexer::new(source, file_id).with_start_line(line).tokenize()?;
        self.parse_tokens(rule, &tokens).ok_or_else(|| {
            debug!("no match for {}: {:?}", rule, source);
            CompileError::Parse {
                loc: tokens
                    .first()
                    .map(|t| t.loc.clone())
                    .unwrap_or_else(|| SourceLocation::new(file_id, line, 1)),
                kind: ParseError::NoMatch { rule },
            }
        })
    }

    /// 文字列が規則に一致するかどうか
    pub fn matches(&self, rule: Rule, source: &str) -> bool {
        self.parse(rule, source).is_ok()
    }
}

/// 子の並び
pub(crate) type Children = Vec<ParseChild>;

/// 1回のパースの状態
pub(crate) struct RuleParser<'g, 't> {
    grammar: &'g Grammar,
    pub(crate) cursor: TokenCursor<'t>,
    depth: usize,
    /// 失敗した (規則, 開始位置)
    failed: HashSet<(Rule, usize)>,
}

impl<'g, 't> RuleParser<'g, 't> {
    pub(crate) fn new(grammar: &'g Grammar, tokens: &'t [Token]) -> Self {
        Self {
            grammar,
            cursor: TokenCursor::new(tokens),
            depth: 0,
            failed: HashSet::new(),
        }
    }

    /// 規則を適用する。失敗したらカーソルを元の位置に戻す
    ///
    /// 深さ上限による失敗も他の失敗と同じく記録するので、上限に達した後も
    /// 同じ (規則, 位置) を二度試すことはない。
    pub(crate) fn rule(&mut self, rule: Rule) -> Option<ParseNode> {
        let start = self.cursor.position();
        if self.failed.contains(&(rule, start)) {
            return None;
        }
        if self.depth >= self.grammar.config.max_rule_depth {
            debug!("rule depth limit reached at {}", rule);
            self.failed.insert((rule, start));
            return None;
        }

        let mark = self.cursor.mark();
        self.depth += 1;
        let result = if self.grammar.is_mocked(rule) {
            self.mocked(rule)
        } else {
            self.dispatch(rule)
        };
        self.depth -= 1;

        if result.is_none() {
            trace!("{} failed at token {}", rule, start);
            self.cursor.reset(mark);
            self.failed.insert((rule, start));
        }
        result
    }

    fn dispatch(&mut self, rule: Rule) -> Option<ParseNode> {
        match rule {
            Rule::PreprocessorLine => self.preprocessor_line(),
            Rule::DefineLine => self.define_line(),
            Rule::IncludeLine => self.include_line(),
            Rule::PpImport => self.pp_import(),
            Rule::PpModule => self.pp_module(),
            Rule::IfLine => self.condition_line(Rule::IfLine, "if"),
            Rule::ElifLine => self.condition_line(Rule::ElifLine, "elif"),
            Rule::IfdefLine => self.ifdef_line(),
            Rule::ElseLine => self.bare_line(Rule::ElseLine, "else"),
            Rule::EndifLine => self.bare_line(Rule::EndifLine, "endif"),
            Rule::UndefLine => self.undef_line(),
            Rule::LineLine => self.line_line(),
            Rule::ErrorLine => self.message_line(Rule::ErrorLine, "error"),
            Rule::WarningLine => self.message_line(Rule::WarningLine, "warning"),
            Rule::PragmaLine => self.message_line(Rule::PragmaLine, "pragma"),
            Rule::MiscLine => self.misc_line(),

            Rule::FunctionlikeMacroDefinition => self.functionlike_macro_definition(),
            Rule::ObjectlikeMacroDefinition => self.objectlike_macro_definition(),
            Rule::ParameterList => self.parameter_list(),
            Rule::VariadicParameter => self.variadic_parameter(),
            Rule::ReplacementList => self.replacement_list(),
            Rule::Stringizing => self.stringizing(),
            Rule::TokenPasting => self.single_token(Rule::TokenPasting, |t| t.kind == TokenKind::HashHash),
            Rule::PpToken => self.single_token(Rule::PpToken, |t| !t.is_trivia() && !t.kind.is_line_end()),

            Rule::ArgumentList => self.argument_list(),
            Rule::Argument => self.argument(),
            Rule::SomethingContainingParentheses => self.something_containing_parentheses(),
            Rule::SomethingWithoutParentheses => self.something_without_parentheses(),

            Rule::IncludeBody => self.include_body(),
            Rule::ExpandedIncludeBody => self.expanded_include_body(),
            Rule::IncludeBodyBracketed => self.include_body_bracketed(),
            Rule::IncludeBodyQuoted => self.single_token(Rule::IncludeBodyQuoted, |t| {
                t.kind == TokenKind::StringLit(EncodingPrefix::None)
            }),
            Rule::IncludeBodyFreeform => self.include_body_freeform(),
            Rule::ModuleName => self.module_name(),

            Rule::ConstantExpression => self.constant_expression(),
            Rule::ConditionalExpression => self.conditional_expression(),
            Rule::Expression => self.expression(),
            Rule::LogicalOrExpression => {
                self.binary_layer(Rule::LogicalOrExpression, Rule::LogicalAndExpression, &[TokenKind::PipePipe])
            }
            Rule::LogicalAndExpression => {
                self.binary_layer(Rule::LogicalAndExpression, Rule::InclusiveOrExpression, &[TokenKind::AmpAmp])
            }
            Rule::InclusiveOrExpression => {
                self.binary_layer(Rule::InclusiveOrExpression, Rule::ExclusiveOrExpression, &[TokenKind::Pipe])
            }
            Rule::ExclusiveOrExpression => {
                self.binary_layer(Rule::ExclusiveOrExpression, Rule::AndExpression, &[TokenKind::Caret])
            }
            Rule::AndExpression => {
                self.binary_layer(Rule::AndExpression, Rule::EqualityExpression, &[TokenKind::Amp])
            }
            Rule::EqualityExpression => self.binary_layer(
                Rule::EqualityExpression,
                Rule::RelationalExpression,
                &[TokenKind::EqEq, TokenKind::BangEq],
            ),
            Rule::RelationalExpression => self.binary_layer(
                Rule::RelationalExpression,
                Rule::ShiftExpression,
                &[TokenKind::Lt, TokenKind::Gt, TokenKind::LtEq, TokenKind::GtEq],
            ),
            Rule::ShiftExpression => self.binary_layer(
                Rule::ShiftExpression,
                Rule::AdditiveExpression,
                &[TokenKind::LtLt, TokenKind::GtGt],
            ),
            Rule::AdditiveExpression => self.binary_layer(
                Rule::AdditiveExpression,
                Rule::MultiplicativeExpression,
                &[TokenKind::Plus, TokenKind::Minus],
            ),
            Rule::MultiplicativeExpression => self.binary_layer(
                Rule::MultiplicativeExpression,
                Rule::UnaryExpression,
                &[TokenKind::Star, TokenKind::Slash, TokenKind::Percent],
            ),
            Rule::UnaryExpression => self.unary_expression(),
            Rule::UnaryOperator => self.single_token(Rule::UnaryOperator, |t| {
                matches!(t.kind, TokenKind::Plus | TokenKind::Minus | TokenKind::Bang | TokenKind::Tilde)
            }),
            Rule::PrimaryExpression => self.primary_expression(),
            Rule::Literal => self.literal(),
            Rule::DefinedExpression => self.defined_expression(),
            Rule::HasIncludeExpression => self.has_include_expression(),
            Rule::FunctionlikeMacro => self.functionlike_macro(),
        }
    }

    /// モック化された規則: 規則名と同じ綴りの識別子1つに一致する
    fn mocked(&mut self, rule: Rule) -> Option<ParseNode> {
        let token = self.cursor.peek().filter(|t| t.is_ident(rule.name()))?;
        self.cursor.bump();
        Some(ParseNode::new(rule, vec![ParseChild::Token(token.clone())]))
    }

    // === 組み立て用の部品 ===

    /// 空白・コメントを読み進めて積む。1つでも読んだら true
    pub(crate) fn trivia(&mut self, out: &mut Children) -> bool {
        let mut consumed = false;
        while let Some(token) = self.cursor.peek().filter(|t| t.is_trivia()) {
            self.cursor.bump();
            out.push(ParseChild::Token(token.clone()));
            consumed = true;
        }
        consumed
    }

    /// 条件を満たすトークン1つ
    pub(crate) fn token_if(&mut self, out: &mut Children, pred: impl FnOnce(&Token) -> bool) -> Option<()> {
        let token = self.cursor.peek().filter(|t| pred(t))?;
        self.cursor.bump();
        out.push(ParseChild::Token(token.clone()));
        Some(())
    }

    /// 指定した種別のトークン1つ
    pub(crate) fn punct(&mut self, out: &mut Children, kind: TokenKind) -> Option<()> {
        self.token_if(out, |t| t.kind == kind)
    }

    /// 指定した綴りの識別子1つ
    pub(crate) fn keyword(&mut self, out: &mut Children, name: &str) -> Option<()> {
        self.token_if(out, |t| t.is_ident(name))
    }

    /// 任意の識別子1つ
    pub(crate) fn ident(&mut self, out: &mut Children) -> Option<()> {
        self.token_if(out, |t| t.kind == TokenKind::Ident)
    }

    /// 入力終端以外の任意のトークン1つ
    pub(crate) fn any_token(&mut self, out: &mut Children) -> Option<()> {
        self.token_if(out, |_| true)
    }

    /// 下位規則を適用してノードを積む
    pub(crate) fn sub(&mut self, out: &mut Children, rule: Rule) -> Option<()> {
        let node = self.rule(rule)?;
        out.push(ParseChild::Node(node));
        Some(())
    }

    /// 列を試す。失敗したらカーソルを戻し、何も積まない
    pub(crate) fn attempt(
        &mut self,
        out: &mut Children,
        f: impl FnOnce(&mut Self, &mut Children) -> Option<()>,
    ) -> Option<()> {
        let mark = self.cursor.mark();
        let mut local = Vec::new();
        match f(self, &mut local) {
            Some(()) => {
                out.append(&mut local);
                Some(())
            }
            None => {
                self.cursor.reset(mark);
                None
            }
        }
    }

    /// 省略可能な列。一致したら true
    pub(crate) fn optional(
        &mut self,
        out: &mut Children,
        f: impl FnOnce(&mut Self, &mut Children) -> Option<()>,
    ) -> bool {
        self.attempt(out, f).is_some()
    }

    /// 規則を宣言順に試し、最初に一致したものを採用する
    pub(crate) fn first_of(&mut self, out: &mut Children, rules: &[Rule]) -> Option<()> {
        rules.iter().find_map(|&rule| self.sub(out, rule))
    }

    /// 単一トークンからなる規則
    fn single_token(&mut self, rule: Rule, pred: impl FnOnce(&Token) -> bool) -> Option<ParseNode> {
        let mut out = Vec::new();
        self.token_if(&mut out, pred)?;
        Some(ParseNode::new(rule, out))
    }

    /// `#` と指令名。`#` の前の空白、`#` と指令名の間の空白・コメントは許す
    pub(crate) fn directive_head(&mut self, out: &mut Children, names: &[&str]) -> Option<()> {
        self.trivia(out);
        self.punct(out, TokenKind::Hash)?;
        self.trivia(out);
        self.token_if(out, |t| t.kind == TokenKind::Ident && names.contains(&t.text.as_str()))
    }

    /// 行末まで（末尾の空白・コメントを含めて）に何もないこと
    pub(crate) fn end_of_line(&mut self, out: &mut Children) -> Option<()> {
        self.trivia(out);
        self.cursor.at_line_end().then_some(())
    }

    /// 行末までの残りのトークンをすべて積む。空白以外のトークン数を返す
    pub(crate) fn rest_of_line(&mut self, out: &mut Children) -> usize {
        let mut significant = 0;
        while !self.cursor.at_line_end() {
            if let Some(token) = self.cursor.bump() {
                if !token.is_trivia() {
                    significant += 1;
                }
                out.push(ParseChild::Token(token.clone()));
            }
        }
        significant
    }
}

/// 式の層: 演算子が無ければ唯一の子ノードをそのまま返す
pub(crate) fn finish(rule: Rule, mut children: Children) -> ParseNode {
    if rule.collapses_single_child() && children.len() == 1 {
        match children.pop() {
            Some(ParseChild::Node(node)) => return node,
            Some(token) => children.push(token),
            None => {}
        }
    }
    ParseNode::new(rule, children)
}
