//! S-expression形式での構文木出力
//!
//! 構文木をS-expression形式で出力する。デバッグや文法の確認に便利。
//! ノードは `(規則名 子...)`、トークンはアトムとして出力する。

use std::io::{Result, Write};

use crate::node::{ParseChild, ParseNode};
use crate::scan::ScannedDirective;
use crate::token::{Token, TokenKind};

/// S-expression出力プリンター
pub struct SexpPrinter<W: Write> {
    writer: W,
    indent: usize,
    pretty: bool,
    show_trivia: bool,
}

impl<W: Write> SexpPrinter<W> {
    /// 新しいプリンターを作成
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            indent: 0,
            pretty: true,
            show_trivia: false,
        }
    }

    /// 整形出力の有無を設定
    pub fn set_pretty(&mut self, pretty: bool) {
        self.pretty = pretty;
    }

    /// 空白・コメントも出力するかどうか
    pub fn set_show_trivia(&mut self, show: bool) {
        self.show_trivia = show;
    }

    /// 構文木を出力
    pub fn print_tree(&mut self, node: &ParseNode) -> Result<()> {
        self.print_node(node)?;
        writeln!(self.writer)
    }

    /// 走査したディレクティブを位置付きで出力
    pub fn print_scanned(&mut self, scanned: &ScannedDirective) -> Result<()> {
        self.write_open("directive")?;
        self.write_atom(&format!(":line {}", scanned.loc.line))?;
        self.write_atom(&format!(":kind {}", scanned.directive.name()))?;
        self.print_node(&scanned.node)?;
        self.write_close()?;
        writeln!(self.writer)
    }

    /// ノードを出力
    pub fn print_node(&mut self, node: &ParseNode) -> Result<()> {
        self.write_open(node.rule.name())?;
        for child in &node.children {
            match child {
                ParseChild::Node(inner) => self.print_node(inner)?,
                ParseChild::Token(token) => self.print_token(token)?,
            }
        }
        self.write_close()
    }

    fn print_token(&mut self, token: &Token) -> Result<()> {
        if token.kind.is_line_end() || (token.is_trivia() && !self.show_trivia) {
            return Ok(());
        }
        if token.kind == TokenKind::Ident || token.kind == TokenKind::Number {
            self.write_atom(&token.text)
        } else {
            self.write_atom(&quote(&token.text))
        }
    }

    // ==================== ヘルパー ====================

    fn write_open(&mut self, name: &str) -> Result<()> {
        if self.indent > 0 {
            if self.pretty {
                writeln!(self.writer)?;
                for _ in 0..self.indent {
                    write!(self.writer, "  ")?;
                }
            } else {
                write!(self.writer, " ")?;
            }
        }
        write!(self.writer, "({}", name)?;
        self.indent += 1;
        Ok(())
    }

    fn write_close(&mut self) -> Result<()> {
        self.indent = self.indent.saturating_sub(1);
        write!(self.writer, ")")?;
        Ok(())
    }

    fn write_atom(&mut self, name: &str) -> Result<()> {
        if self.pretty {
            writeln!(self.writer)?;
            for _ in 0..self.indent {
                write!(self.writer, "  ")?;
            }
        } else {
            write!(self.writer, " ")?;
        }
        write!(self.writer, "{}", name)?;
        Ok(())
    }
}

/// 文字列アトムとして引用符で囲む
fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}
