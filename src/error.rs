use std::fmt;
use std::path::PathBuf;

use crate::rule::Rule;
use crate::source::{FileRegistry, SourceLocation};

/// エラー表示用のロケーション（ファイル名解決付き）
pub struct DisplayLocation<'a> {
    pub loc: &'a SourceLocation,
    pub files: &'a FileRegistry,
}

impl<'a> fmt::Display for DisplayLocation<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.files.get_path(self.loc.file_id) {
            Some(path) => write!(f, "{}:{}:{}", path.display(), self.loc.line, self.loc.column),
            None => write!(f, "<input>:{}:{}", self.loc.line, self.loc.column),
        }
    }
}

/// レキサーエラー
#[derive(Debug, PartialEq, Eq)]
pub enum LexError {
    /// 閉じられていないブロックコメント
    UnterminatedComment,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::UnterminatedComment => write!(f, "unterminated block comment"),
        }
    }
}

/// パースエラー
#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    /// 指定した規則に入力全体が一致しなかった
    NoMatch { rule: Rule },
    /// 構文木が期待した形ではない（ディレクティブへの変換時）
    UnexpectedShape(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::NoMatch { rule } => write!(f, "input does not match rule '{}'", rule),
            ParseError::UnexpectedShape(s) => write!(f, "unexpected parse tree shape: {}", s),
        }
    }
}

/// 統合エラー型
#[derive(Debug)]
pub enum CompileError {
    /// レキサーエラー
    Lex { loc: SourceLocation, kind: LexError },
    /// パースエラー
    Parse { loc: SourceLocation, kind: ParseError },
    /// ファイル読み込みエラー
    Io { path: PathBuf, source: std::io::Error },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Lex { loc, kind } => {
                write!(f, "{}:{}:{}: lexer error: {}", loc.file_id.as_u32(), loc.line, loc.column, kind)
            }
            CompileError::Parse { loc, kind } => {
                write!(f, "{}:{}:{}: parse error: {}", loc.file_id.as_u32(), loc.line, loc.column, kind)
            }
            CompileError::Io { path, source } => {
                write!(f, "I/O error reading {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl CompileError {
    /// エラーが発生した位置を取得（I/O エラーは位置を持たない）
    pub fn loc(&self) -> Option<&SourceLocation> {
        match self {
            CompileError::Lex { loc, .. } => Some(loc),
            CompileError::Parse { loc, .. } => Some(loc),
            CompileError::Io { .. } => None,
        }
    }

    /// ファイル名を解決してエラーメッセージをフォーマット
    pub fn format_with_files(&self, files: &FileRegistry) -> String {
        match self {
            CompileError::Lex { loc, kind } => {
                let disp = DisplayLocation { loc, files };
                format!("{}: lexer error: {}", disp, kind)
            }
            CompileError::Parse { loc, kind } => {
                let disp = DisplayLocation { loc, files };
                format!("{}: parse error: {}", disp, kind)
            }
            CompileError::Io { .. } => self.to_string(),
        }
    }
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, CompileError>;
