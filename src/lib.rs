//! C/C++ Preprocessor Grammar
//!
//! C/C++ のプリプロセッサディレクティブ行、マクロの置換リスト、
//! `#if` の定数式、C++20 の import / module 宣言を順序付き選択と
//! バックトラックでパースし、構文木を返す。

pub mod directive;
pub mod error;
pub mod grammar;
pub mod lexer;
pub mod macro_def;
pub mod node;
pub mod rule;
pub mod scan;
pub mod sexp;
pub mod source;
pub mod token;
pub mod token_source;

// 文法規則の実装（RuleParser のメソッド）
mod args;
mod define;
mod expr;
mod include;
mod line;

// 主要な型を再エクスポート
pub use directive::{Directive, ImportDecl, ImportTarget, IncludeBody, ModuleDecl};
pub use error::{CompileError, DisplayLocation, LexError, ParseError, Result};
pub use grammar::{DEFAULT_MAX_RULE_DEPTH, Grammar, GrammarBuilder, GrammarConfig};
pub use lexer::{Lexer, tokenize};
pub use macro_def::{MacroDef, MacroKind, MacroTable, Variadic};
pub use node::{ParseChild, ParseNode, join_significant};
pub use rule::Rule;
pub use scan::{ScannedDirective, collect_macros, scan_file, scan_source};
pub use sexp::SexpPrinter;
pub use source::{FileId, FileRegistry, LogicalLine, SourceLocation, logical_lines};
pub use token::{CommentKind, EncodingPrefix, Token, TokenKind};
pub use token_source::{Mark, TokenCursor};
