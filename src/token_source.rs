//! トークン列のカーソル
//!
//! 文法規則は順序付き選択で代替を試すため、位置を保存（`mark`）し、
//! 失敗したら元に戻す（`reset`）ことができるカーソルでトークンを読む。

use crate::token::{Token, TokenKind};

/// カーソル位置の保存点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(usize);

/// トークン列を読むカーソル
///
/// 末尾を越えて読んだ場合は `Eof` を返し続ける。
#[derive(Debug, Clone)]
pub struct TokenCursor<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> TokenCursor<'t> {
    /// 新しいカーソルを作成
    pub fn new(tokens: &'t [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    /// 現在位置を保存
    pub fn mark(&self) -> Mark {
        Mark(self.pos)
    }

    /// 保存した位置に戻す
    pub fn reset(&mut self, mark: Mark) {
        self.pos = mark.0;
    }

    /// 現在位置を取得
    pub fn position(&self) -> usize {
        self.pos
    }

    /// 現在のトークンを取得（末尾なら None）
    pub fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos).filter(|t| t.kind != TokenKind::Eof)
    }

    /// 現在のトークン種別を取得（末尾なら Eof）
    pub fn peek_kind(&self) -> TokenKind {
        self.peek().map_or(TokenKind::Eof, |t| t.kind)
    }

    /// 現在のトークンを返して次へ進む
    pub fn bump(&mut self) -> Option<&'t Token> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    /// 行末（改行または入力終端）にいるかどうか
    pub fn at_line_end(&self) -> bool {
        self.peek_kind().is_line_end()
    }

    /// 入力終端にいるかどうか
    pub fn at_eof(&self) -> bool {
        self.peek().is_none()
    }
}
