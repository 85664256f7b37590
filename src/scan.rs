//! ソース全体からディレクティブを走査する
//!
//! 継続行を結合した論理行ごとに、`#` で始まる行と C++20 のモジュール宣言
//! らしい行（`import` / `export` / `module` で始まる行）を preprocessorLine で
//! パースする。それ以外の行は読み飛ばす。

use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::Serialize;

use crate::directive::Directive;
use crate::error::{CompileError, Result};
use crate::grammar::Grammar;
use crate::lexer::Lexer;
use crate::macro_def::MacroTable;
use crate::node::ParseNode;
use crate::rule::Rule;
use crate::source::{FileId, FileRegistry, SourceLocation, logical_lines};

/// 走査で見つかったディレクティブ
#[derive(Debug, Clone, Serialize)]
pub struct ScannedDirective {
    /// 行の先頭の有意トークンの位置
    pub loc: SourceLocation,
    /// preprocessorLine の構文木
    pub node: ParseNode,
    pub directive: Directive,
}

/// 文字列からディレクティブを走査する
pub fn scan_source(grammar: &Grammar, source: &str, file_id: FileId) -> Result<Vec<ScannedDirective>> {
    let mut found = Vec::new();

    for line in logical_lines(source) {
        if !looks_like_directive(&line.text) {
            continue;
        }

        let tokens = Lexer::new(&line.text, file_id)
            .with_start_line(line.line)
            .tokenize()?;
        let Some(node) = grammar.parse_tokens(Rule::PreprocessorLine, &tokens) else {
            // `import` などを普通の識別子として使っている行
            debug!("line {}: not a directive: {:?}", line.line, line.text);
            continue;
        };

        let directive = Directive::from_node(&node)?;
        let loc = node
            .significant_tokens()
            .first()
            .map(|t| t.loc.clone())
            .unwrap_or_else(|| SourceLocation::new(file_id, line.line, 1));
        debug!("{}: #{}", loc, directive.name());

        found.push(ScannedDirective { loc, node, directive });
    }

    Ok(found)
}

/// ファイルを読み込んでディレクティブを走査する
pub fn scan_file(grammar: &Grammar, files: &mut FileRegistry, path: &Path) -> Result<Vec<ScannedDirective>> {
    let source = fs::read_to_string(path).map_err(|source| CompileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file_id = files.register(path.to_path_buf());
    let found = scan_source(grammar, &source, file_id)?;
    info!("{}: {} directives", path.display(), found.len());
    Ok(found)
}

/// `#define` / `#undef` を出現順に適用したマクロテーブルを作る
pub fn collect_macros(directives: &[ScannedDirective]) -> MacroTable {
    let mut table = MacroTable::new();
    for scanned in directives {
        match &scanned.directive {
            Directive::Define(def) => {
                if table.define(def.clone(), scanned.loc.clone()).is_some() {
                    debug!("{}: {} redefined", scanned.loc, def.name);
                }
            }
            Directive::Undef { name } => {
                table.undefine(name);
            }
            _ => {}
        }
    }
    table
}

/// 行がディレクティブの候補かどうか（先頭の空白は無視する）
fn looks_like_directive(text: &str) -> bool {
    let text = text.trim_start();
    if text.starts_with('#') {
        return true;
    }
    let word_end = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    matches!(&text[..word_end], "import" | "export" | "module")
}
