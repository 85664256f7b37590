use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// ファイル識別子
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default, Serialize)]
pub struct FileId(u32);

impl FileId {
    /// 内部IDを取得（デバッグ用）
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// ソース位置
///
/// `offset` は論理行（またはトークン化した文字列）先頭からのバイト位置。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file_id: FileId,
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl SourceLocation {
    /// 新しいソース位置を作成
    pub fn new(file_id: FileId, line: u32, column: u32) -> Self {
        Self {
            file_id,
            line,
            column,
            offset: 0,
        }
    }

    /// バイトオフセット付きで作成
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// ファイルレジストリ
#[derive(Debug, Default, Clone)]
pub struct FileRegistry {
    paths: Vec<PathBuf>,
    path_to_id: HashMap<PathBuf, FileId>,
}

impl FileRegistry {
    /// 新しいレジストリを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// パスを登録してIDを返す
    pub fn register(&mut self, path: PathBuf) -> FileId {
        if let Some(&id) = self.path_to_id.get(&path) {
            return id;
        }
        let id = FileId(self.paths.len() as u32);
        self.path_to_id.insert(path.clone(), id);
        self.paths.push(path);
        id
    }

    /// IDからパスを取得（未登録なら None）
    pub fn get_path(&self, id: FileId) -> Option<&Path> {
        self.paths.get(id.0 as usize).map(PathBuf::as_path)
    }

    /// 登録されているファイル数を返す
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// レジストリが空かどうか
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// 継続行を結合した論理行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    /// `\` + 改行を取り除いた行テキスト（改行文字は含まない）
    pub text: String,
    /// 論理行が始まる物理行番号（1始まり）
    pub line: u32,
}

/// ソースを論理行に分割する
///
/// バックスラッシュ直後の改行（`\r\n` も含む）は行継続として取り除く。
/// ブロックコメントが行をまたぐ場合は分割しない。
pub fn logical_lines(source: &str) -> Vec<LogicalLine> {
    let bytes = source.as_bytes();
    let mut lines = Vec::new();
    let mut text = String::new();
    let mut start_line = 1u32;
    let mut line = 1u32;
    let mut in_block_comment = false;
    let mut in_line_comment = false;
    let mut in_string = false;
    let mut seg_start = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_string && !matches!(bytes.get(i + 1), Some(b'\n') | Some(b'\r')) => {
                i += 2;
            }
            b'"' if in_string => {
                in_string = false;
                i += 1;
            }
            b'"' if !in_block_comment && !in_line_comment => {
                in_string = true;
                i += 1;
            }
            b'/' if !in_block_comment && !in_line_comment && !in_string
                && bytes.get(i + 1) == Some(&b'/') =>
            {
                in_line_comment = true;
                i += 2;
            }
            b'\\' if bytes.get(i + 1) == Some(&b'\n') => {
                text.push_str(&source[seg_start..i]);
                i += 2;
                line += 1;
                seg_start = i;
            }
            b'\\' if bytes.get(i + 1) == Some(&b'\r') && bytes.get(i + 2) == Some(&b'\n') => {
                text.push_str(&source[seg_start..i]);
                i += 3;
                line += 1;
                seg_start = i;
            }
            b'/' if !in_block_comment && !in_line_comment && !in_string
                && bytes.get(i + 1) == Some(&b'*') =>
            {
                in_block_comment = true;
                i += 2;
            }
            b'*' if in_block_comment && bytes.get(i + 1) == Some(&b'/') => {
                in_block_comment = false;
                i += 2;
            }
            b'\n' if in_block_comment => {
                line += 1;
                i += 1;
            }
            b'\n' => {
                in_line_comment = false;
                in_string = false;
                let end = if i > seg_start && bytes[i - 1] == b'\r' { i - 1 } else { i };
                text.push_str(&source[seg_start..end]);
                lines.push(LogicalLine {
                    text: std::mem::take(&mut text),
                    line: start_line,
                });
                i += 1;
                line += 1;
                start_line = line;
                seg_start = i;
            }
            _ => i += 1,
        }
    }

    if seg_start < bytes.len() || !text.is_empty() {
        text.push_str(&source[seg_start..]);
        lines.push(LogicalLine {
            text,
            line: start_line,
        });
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_registry_register() {
        let mut registry = FileRegistry::new();
        let id1 = registry.register(PathBuf::from("/path/to/a.h"));
        let id2 = registry.register(PathBuf::from("/path/to/b.h"));
        let id3 = registry.register(PathBuf::from("/path/to/a.h"));

        assert_ne!(id1, id2);
        assert_eq!(id1, id3);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get_path(id2), Some(Path::new("/path/to/b.h")));
    }

    #[test]
    fn test_logical_lines_plain() {
        let lines = logical_lines("#if A\nint x;\n#endif\n");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].text, "#if A");
        assert_eq!(lines[1].line, 2);
        assert_eq!(lines[2].text, "#endif");
    }

    #[test]
    fn test_logical_lines_continuation() {
        let lines = logical_lines("#define X \\\n  1 + \\\r\n  2\n#endif");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "#define X   1 +   2");
        assert_eq!(lines[0].line, 1);
        assert_eq!(lines[1].text, "#endif");
        assert_eq!(lines[1].line, 4);
    }

    #[test]
    fn test_logical_lines_block_comment_spans_lines() {
        let lines = logical_lines("#endif /* a\nb */\nnext");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "#endif /* a\nb */");
        assert_eq!(lines[1].line, 3);
    }
}
