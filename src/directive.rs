//! ディレクティブの型付きビュー
//!
//! 構文木はトークンをすべて保持するが、利用側が必要とするのは
//! マクロ名やインクルード先などの要素だけなので、ここで取り出す。

use serde::Serialize;

use crate::error::{CompileError, ParseError, Result};
use crate::macro_def::MacroDef;
use crate::node::{ParseNode, join_significant};
use crate::rule::Rule;
use crate::token::{Token, TokenKind};

/// インクルード本体
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum IncludeBody {
    /// `<...>` の中身
    Bracketed(String),
    /// `"..."` の中身
    Quoted(String),
    /// マクロ展開が必要な形（識別子またはマクロ呼び出し）
    Macro(Vec<Token>),
}

impl IncludeBody {
    /// includeBody / expandedIncludeBody / 個別の本体ノードから作成
    pub fn from_node(node: &ParseNode) -> Result<Self> {
        match node.rule {
            Rule::IncludeBody | Rule::ExpandedIncludeBody => {
                let inner = node
                    .child_nodes()
                    .next()
                    .ok_or_else(|| shape_error(node, "empty include body"))?;
                Self::from_node(inner)
            }
            Rule::IncludeBodyBracketed => {
                let tokens = node.tokens();
                let inner = tokens.get(1..tokens.len().saturating_sub(1)).unwrap_or_default();
                Ok(IncludeBody::Bracketed(inner.iter().map(|t| t.text.as_str()).collect()))
            }
            Rule::IncludeBodyQuoted => {
                let text = node.text();
                let inner = text
                    .strip_prefix('"')
                    .and_then(|s| s.strip_suffix('"'))
                    .ok_or_else(|| shape_error(node, "quoted include without quotes"))?;
                Ok(IncludeBody::Quoted(inner.to_string()))
            }
            Rule::IncludeBodyFreeform => Ok(IncludeBody::Macro(
                node.significant_tokens().into_iter().cloned().collect(),
            )),
            _ => Err(shape_error(node, "not an include body")),
        }
    }

    /// 元の綴りに近い形で表示する
    pub fn display(&self) -> String {
        match self {
            IncludeBody::Bracketed(path) => format!("<{path}>"),
            IncludeBody::Quoted(path) => format!("\"{path}\""),
            IncludeBody::Macro(tokens) => join_significant(tokens),
        }
    }
}

/// import の対象
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ImportTarget {
    /// ヘッダーユニット
    Header(IncludeBody),
    /// 名前付きモジュール
    Module(String),
    /// 同じモジュールのパーティション（`:part`）
    Partition(String),
}

/// `[export] import ...;`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportDecl {
    pub exported: bool,
    pub target: ImportTarget,
}

/// module 宣言
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModuleDecl {
    /// `module;`
    Global,
    /// `module :private;`
    Private,
    /// `[export] module name[:partition];`
    Named {
        exported: bool,
        name: String,
        partition: Option<String>,
    },
}

/// ディレクティブ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "directive", rename_all = "snake_case")]
pub enum Directive {
    Define(MacroDef),
    Undef { name: String },
    Include { next: bool, body: IncludeBody },
    Import(ImportDecl),
    Module(ModuleDecl),
    If { condition: ParseNode },
    Elif { condition: ParseNode },
    Ifdef { name: String, negated: bool },
    Else,
    Endif,
    Line { tokens: Vec<Token> },
    Error { message: Option<String> },
    Warning { message: Option<String> },
    Pragma { tokens: Vec<Token> },
    Misc { tokens: Vec<Token> },
}

impl Directive {
    /// preprocessorLine または個別の行規則のノードから作成
    pub fn from_node(node: &ParseNode) -> Result<Self> {
        let directive = match node.rule {
            Rule::PreprocessorLine => {
                let line = node
                    .child_nodes()
                    .next()
                    .ok_or_else(|| shape_error(node, "empty preprocessor line"))?;
                return Self::from_node(line);
            }
            Rule::DefineLine | Rule::FunctionlikeMacroDefinition | Rule::ObjectlikeMacroDefinition => {
                Directive::Define(MacroDef::from_node(node)?)
            }
            Rule::UndefLine => Directive::Undef {
                name: directive_operand(node)?,
            },
            Rule::IncludeLine => {
                let body = node
                    .child(Rule::IncludeBody)
                    .ok_or_else(|| shape_error(node, "include without a body"))?;
                Directive::Include {
                    next: directive_name(node) == Some("include_next"),
                    body: IncludeBody::from_node(body)?,
                }
            }
            Rule::PpImport => Directive::Import(import_decl(node)?),
            Rule::PpModule => Directive::Module(module_decl(node)?),
            Rule::IfLine | Rule::ElifLine => {
                let condition = node
                    .child(Rule::ConstantExpression)
                    .ok_or_else(|| shape_error(node, "conditional without an expression"))?
                    .clone();
                if node.rule == Rule::IfLine {
                    Directive::If { condition }
                } else {
                    Directive::Elif { condition }
                }
            }
            Rule::IfdefLine => Directive::Ifdef {
                name: directive_operand(node)?,
                negated: directive_name(node) == Some("ifndef"),
            },
            Rule::ElseLine => Directive::Else,
            Rule::EndifLine => Directive::Endif,
            Rule::LineLine => Directive::Line {
                tokens: after_head(node, 2),
            },
            Rule::ErrorLine => Directive::Error {
                message: message(node),
            },
            Rule::WarningLine => Directive::Warning {
                message: message(node),
            },
            Rule::PragmaLine => Directive::Pragma {
                tokens: after_head(node, 2),
            },
            Rule::MiscLine => Directive::Misc {
                tokens: after_head(node, 1),
            },
            _ => return Err(shape_error(node, "not a directive line")),
        };
        Ok(directive)
    }

    /// 指令名（`define`, `include`, `import` など）
    pub fn name(&self) -> &'static str {
        match self {
            Directive::Define(_) => "define",
            Directive::Undef { .. } => "undef",
            Directive::Include { next: false, .. } => "include",
            Directive::Include { next: true, .. } => "include_next",
            Directive::Import(_) => "import",
            Directive::Module(_) => "module",
            Directive::If { .. } => "if",
            Directive::Elif { .. } => "elif",
            Directive::Ifdef { negated: false, .. } => "ifdef",
            Directive::Ifdef { negated: true, .. } => "ifndef",
            Directive::Else => "else",
            Directive::Endif => "endif",
            Directive::Line { .. } => "line",
            Directive::Error { .. } => "error",
            Directive::Warning { .. } => "warning",
            Directive::Pragma { .. } => "pragma",
            Directive::Misc { .. } => "misc",
        }
    }
}

/// `#` の次の識別子
fn directive_name(node: &ParseNode) -> Option<&str> {
    node.child_tokens()
        .find(|t| t.kind == TokenKind::Ident)
        .map(|t| t.text.as_str())
}

/// 指令名の次の識別子（`#undef X` の X）
fn directive_operand(node: &ParseNode) -> Result<String> {
    node.child_tokens()
        .filter(|t| t.kind == TokenKind::Ident)
        .nth(1)
        .map(|t| t.text.clone())
        .ok_or_else(|| shape_error(node, "directive without an operand"))
}

/// 先頭の `skip` 個の有意トークンより後ろの有意トークン
fn after_head(node: &ParseNode, skip: usize) -> Vec<Token> {
    node.significant_tokens()
        .into_iter()
        .filter(|t| !t.kind.is_line_end())
        .skip(skip)
        .cloned()
        .collect()
}

/// `#error` / `#warning` のメッセージ（元の空白を保ったまま前後を削る）
fn message(node: &ParseNode) -> Option<String> {
    let text: String = node
        .tokens()
        .into_iter()
        .filter(|t| !t.kind.is_line_end())
        .skip_while(|t| t.kind != TokenKind::Ident)
        .skip(1)
        .map(|t| t.text.as_str())
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn import_decl(node: &ParseNode) -> Result<ImportDecl> {
    let exported = node.child_tokens().any(|t| t.is_ident("export"));

    let header = node
        .child(Rule::IncludeBodyBracketed)
        .or_else(|| node.child(Rule::IncludeBodyQuoted));
    let target = if let Some(body) = header {
        ImportTarget::Header(IncludeBody::from_node(body)?)
    } else {
        let name = node
            .child(Rule::ModuleName)
            .ok_or_else(|| shape_error(node, "import without a target"))?
            .significant_text();
        if node.child_tokens().any(|t| t.kind == TokenKind::Colon) {
            ImportTarget::Partition(name)
        } else {
            ImportTarget::Module(name)
        }
    };
    Ok(ImportDecl { exported, target })
}

fn module_decl(node: &ParseNode) -> Result<ModuleDecl> {
    let mut names = node.child_nodes().filter(|n| n.rule == Rule::ModuleName);
    let Some(name) = names.next() else {
        if node.child_tokens().any(|t| t.is_ident("private")) {
            return Ok(ModuleDecl::Private);
        }
        return Ok(ModuleDecl::Global);
    };
    Ok(ModuleDecl::Named {
        exported: node.child_tokens().any(|t| t.is_ident("export")),
        name: name.significant_text(),
        partition: names.next().map(ParseNode::significant_text),
    })
}

fn shape_error(node: &ParseNode, message: &str) -> CompileError {
    CompileError::Parse {
        loc: node
            .first_token()
            .map(|t| t.loc.clone())
            .unwrap_or_default(),
        kind: ParseError::UnexpectedShape(format!("{}: {}", node.rule, message)),
    }
}
