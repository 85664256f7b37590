//! マクロ定義と管理
//!
//! `#define` 行の構文木から取り出したマクロ定義と、ファイル内の
//! `#define` / `#undef` を順に適用したマクロテーブル。

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{CompileError, ParseError, Result};
use crate::node::ParseNode;
use crate::rule::Rule;
use crate::source::SourceLocation;
use crate::token::{Token, TokenKind};

/// 可変長引数の形
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Variadic {
    /// `...`（`__VA_ARGS__` で参照）
    Anonymous,
    /// GNU 拡張: `args...`
    Named(String),
}

/// マクロ定義の種類
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MacroKind {
    /// オブジェクトマクロ: #define FOO value
    Object,
    /// 関数マクロ: #define FOO(a, b) ...
    Function {
        params: Vec<String>,
        variadic: Option<Variadic>,
    },
}

/// マクロ定義
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MacroDef {
    /// マクロ名
    pub name: String,
    /// マクロの種類
    pub kind: MacroKind,
    /// 置換トークン列（空白・コメントを除く）
    pub replacement: Vec<Token>,
    /// 置換リストに文字列化 (#) を含むか
    pub has_stringizing: bool,
    /// 置換リストにトークン連結 (##) を含むか
    pub has_token_pasting: bool,
}

impl MacroDef {
    /// defineLine / functionlikeMacroDefinition / objectlikeMacroDefinition
    /// のノードから作成
    pub fn from_node(node: &ParseNode) -> Result<Self> {
        let def = match node.rule {
            Rule::DefineLine => node
                .child(Rule::FunctionlikeMacroDefinition)
                .or_else(|| node.child(Rule::ObjectlikeMacroDefinition))
                .ok_or_else(|| shape_error(node, "defineLine without a definition"))?,
            Rule::FunctionlikeMacroDefinition | Rule::ObjectlikeMacroDefinition => node,
            _ => return Err(shape_error(node, "not a macro definition")),
        };

        // `#` `define` の次の識別子がマクロ名
        let name = def
            .child_tokens()
            .filter(|t| t.kind == TokenKind::Ident)
            .nth(1)
            .ok_or_else(|| shape_error(def, "macro definition without a name"))?
            .text
            .clone();

        let kind = if def.rule == Rule::FunctionlikeMacroDefinition {
            let (params, variadic) = def
                .child(Rule::ParameterList)
                .map(parameters)
                .unwrap_or_default();
            MacroKind::Function { params, variadic }
        } else {
            MacroKind::Object
        };

        let list = def
            .child(Rule::ReplacementList)
            .ok_or_else(|| shape_error(def, "macro definition without a replacement list"))?;

        Ok(Self {
            name,
            kind,
            replacement: list.significant_tokens().into_iter().cloned().collect(),
            has_stringizing: list.child(Rule::Stringizing).is_some(),
            has_token_pasting: list.child(Rule::TokenPasting).is_some(),
        })
    }

    /// 関数マクロかどうか
    pub fn is_function(&self) -> bool {
        matches!(self.kind, MacroKind::Function { .. })
    }

    /// パラメータ数を取得（オブジェクトマクロなら0、可変長引数は含まない）
    pub fn param_count(&self) -> usize {
        match &self.kind {
            MacroKind::Object => 0,
            MacroKind::Function { params, .. } => params.len(),
        }
    }

    /// 可変引数マクロかどうか
    pub fn is_variadic(&self) -> bool {
        matches!(self.kind, MacroKind::Function { variadic: Some(_), .. })
    }

    /// 置換リストを1行のテキストにする
    pub fn replacement_text(&self) -> String {
        crate::node::join_significant(&self.replacement)
    }
}

fn parameters(list: &ParseNode) -> (Vec<String>, Option<Variadic>) {
    let params = list
        .child_tokens()
        .filter(|t| t.kind == TokenKind::Ident)
        .map(|t| t.text.clone())
        .collect();
    let variadic = list.child(Rule::VariadicParameter).map(|v| {
        v.child_tokens()
            .find(|t| t.kind == TokenKind::Ident)
            .map_or(Variadic::Anonymous, |t| Variadic::Named(t.text.clone()))
    });
    (params, variadic)
}

fn shape_error(node: &ParseNode, message: &str) -> CompileError {
    CompileError::Parse {
        loc: node
            .first_token()
            .map(|t| t.loc.clone())
            .unwrap_or_default(),
        kind: ParseError::UnexpectedShape(message.to_string()),
    }
}

/// マクロテーブル
#[derive(Debug, Default)]
pub struct MacroTable {
    macros: HashMap<String, (MacroDef, SourceLocation)>,
}

impl MacroTable {
    /// 新しいマクロテーブルを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// マクロを定義（既存の定義があれば返す）
    pub fn define(&mut self, def: MacroDef, loc: SourceLocation) -> Option<MacroDef> {
        self.macros
            .insert(def.name.clone(), (def, loc))
            .map(|(old, _)| old)
    }

    /// マクロを削除
    pub fn undefine(&mut self, name: &str) -> Option<MacroDef> {
        self.macros.remove(name).map(|(def, _)| def)
    }

    /// マクロを取得
    pub fn get(&self, name: &str) -> Option<&MacroDef> {
        self.macros.get(name).map(|(def, _)| def)
    }

    /// 定義された位置を取得
    pub fn location(&self, name: &str) -> Option<&SourceLocation> {
        self.macros.get(name).map(|(_, loc)| loc)
    }

    /// マクロが定義されているか
    pub fn is_defined(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    /// 名前順に列挙
    pub fn sorted(&self) -> Vec<&MacroDef> {
        let mut defs: Vec<_> = self.macros.values().map(|(def, _)| def).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// 定義されているマクロ数
    pub fn len(&self) -> usize {
        self.macros.len()
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}
