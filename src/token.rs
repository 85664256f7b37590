use serde::Serialize;

use crate::source::SourceLocation;

/// コメント種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CommentKind {
    /// 行コメント: // ...
    Line,
    /// ブロックコメント: /* ... */
    Block,
}

/// 文字・文字列リテラルのエンコーディングプレフィックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum EncodingPrefix {
    #[default]
    None,
    /// L"..."
    Wide,
    /// u8"..."
    Utf8,
    /// u"..."
    Utf16,
    /// U"..."
    Utf32,
}

impl EncodingPrefix {
    /// プレフィックス文字列から変換
    pub fn from_spelling(s: &str) -> Option<EncodingPrefix> {
        match s {
            "L" => Some(EncodingPrefix::Wide),
            "u8" => Some(EncodingPrefix::Utf8),
            "u" => Some(EncodingPrefix::Utf16),
            "U" => Some(EncodingPrefix::Utf32),
            _ => None,
        }
    }
}

/// 前処理トークン種別
///
/// 字句の値そのものは `Token::text` に保持する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // === リテラル・識別子 ===
    Ident,
    /// pp-number（整数・浮動小数点・サフィックス付きを区別しない）
    Number,
    CharLit(EncodingPrefix),
    StringLit(EncodingPrefix),

    // === 演算子 ===
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Percent,    // %
    Amp,        // &
    Pipe,       // |
    Caret,      // ^
    Tilde,      // ~
    LtLt,       // <<
    GtGt,       // >>
    Bang,       // !
    AmpAmp,     // &&
    PipePipe,   // ||
    Lt,         // <
    Gt,         // >
    LtEq,       // <=
    GtEq,       // >=
    EqEq,       // ==
    BangEq,     // !=
    Eq,         // =
    PlusEq,     // +=
    MinusEq,    // -=
    StarEq,     // *=
    SlashEq,    // /=
    PercentEq,  // %=
    AmpEq,      // &=
    PipeEq,     // |=
    CaretEq,    // ^=
    LtLtEq,     // <<=
    GtGtEq,     // >>=
    PlusPlus,   // ++
    MinusMinus, // --
    Question,   // ?
    Colon,      // :
    ColonColon, // ::
    Arrow,      // ->
    Dot,        // .
    Ellipsis,   // ...

    // === 区切り記号 ===
    Comma,      // ,
    Semi,       // ;
    LParen,     // (
    RParen,     // )
    LBracket,   // [
    RBracket,   // ]
    LBrace,     // {
    RBrace,     // }

    // === プリプロセッサ用 ===
    Hash,       // #
    HashHash,   // ##

    /// 上記以外の1文字（`$`, `@`, `\`, 閉じられていない引用符など）
    Other,

    // === トリビア ===
    /// 空白（スペース/タブ/CR など、改行以外）
    Whitespace,
    Comment(CommentKind),

    // === 特殊 ===
    /// 改行
    Newline,
    /// 入力終端
    Eof,
}

impl TokenKind {
    /// 空白・コメントかどうか（改行は含まない）
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Whitespace | TokenKind::Comment(_))
    }

    /// 行の終わりを示すトークンかどうか
    pub fn is_line_end(self) -> bool {
        matches!(self, TokenKind::Newline | TokenKind::Eof)
    }
}

/// 位置情報付きトークン
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// ソース上の字句（トリビアも含め、連結すれば元の行に戻る）
    pub text: String,
    pub loc: SourceLocation,
}

impl Token {
    /// 新しいトークンを作成
    pub fn new(kind: TokenKind, text: impl Into<String>, loc: SourceLocation) -> Self {
        Self {
            kind,
            text: text.into(),
            loc,
        }
    }

    /// 空白・コメントかどうか
    pub fn is_trivia(&self) -> bool {
        self.kind.is_trivia()
    }

    /// 指定した綴りの識別子かどうか
    pub fn is_ident(&self, name: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == name
    }

    /// ソース上の終了バイト位置
    pub fn end_offset(&self) -> usize {
        self.loc.offset + self.text.len()
    }
}
