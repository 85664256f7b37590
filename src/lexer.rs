//! 前処理トークンの字句解析
//!
//! 文法側が隣接関係（`#define f(x)` と `#define f (x)` の区別など）を
//! 判断できるよう、空白とコメントもトークンとして返す。
//! すべてのトークンの `text` を連結すると入力と一致する。

use crate::error::{CompileError, LexError, Result};
use crate::source::{FileId, SourceLocation};
use crate::token::{CommentKind, EncodingPrefix, Token, TokenKind};

/// Lexer
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    file_id: FileId,
}

impl<'a> Lexer<'a> {
    /// 新しいLexerを作成
    pub fn new(source: &'a str, file_id: FileId) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
            file_id,
        }
    }

    /// 開始行番号を設定（論理行単位で字句解析する場合）
    pub fn with_start_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    /// 現在位置を取得
    pub fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.file_id, self.line, self.column).with_offset(self.pos)
    }

    /// 入力全体をトークン化する（末尾に必ず Eof を含む）
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let at_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if at_eof {
                return Ok(tokens);
            }
        }
    }

    /// 次のトークンを取得
    pub fn next_token(&mut self) -> Result<Token> {
        let loc = self.current_location();
        let start = self.pos;
        let kind = self.scan_token_kind(&loc)?;
        Ok(Token::new(kind, &self.source[start..self.pos], loc))
    }

    /// 現在の文字をピーク
    fn peek(&self) -> Option<u8> {
        self.source.as_bytes().get(self.pos).copied()
    }

    /// n文字先をピーク
    fn peek_n(&self, n: usize) -> Option<u8> {
        self.source.as_bytes().get(self.pos + n).copied()
    }

    /// 1バイト進める
    fn advance(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
            self.column = 1;
        } else if c & 0xC0 != 0x80 {
            // UTF-8 の継続バイトでは桁を進めない
            self.column += 1;
        }
        Some(c)
    }

    fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    /// 行継続（`\` + 改行）の長さ
    fn line_continuation_len(&self) -> Option<usize> {
        match (self.peek(), self.peek_n(1), self.peek_n(2)) {
            (Some(b'\\'), Some(b'\n'), _) => Some(2),
            (Some(b'\\'), Some(b'\r'), Some(b'\n')) => Some(3),
            _ => None,
        }
    }

    fn is_space(c: u8) -> bool {
        matches!(c, b' ' | b'\t' | b'\r' | 0x0B | 0x0C)
    }

    fn is_ident_char(c: u8) -> bool {
        c.is_ascii_alphanumeric() || c == b'_' || c >= 0x80
    }

    /// トークン種別をスキャン
    fn scan_token_kind(&mut self, loc: &SourceLocation) -> Result<TokenKind> {
        let Some(c) = self.peek() else {
            return Ok(TokenKind::Eof);
        };

        if Self::is_space(c) || self.line_continuation_len().is_some() {
            return Ok(self.scan_whitespace());
        }

        match c {
            b'\n' => {
                self.advance();
                Ok(TokenKind::Newline)
            }
            b'/' if self.peek_n(1) == Some(b'/') => Ok(self.scan_line_comment()),
            b'/' if self.peek_n(1) == Some(b'*') => self.scan_block_comment(loc),

            // エンコーディングプレフィックス付きリテラル（識別子より先にチェック）
            b'L' | b'u' | b'U' if self.prefixed_literal_len().is_some() => {
                let prefix_len = self.prefixed_literal_len().unwrap_or(1);
                let prefix = EncodingPrefix::from_spelling(&self.source[self.pos..self.pos + prefix_len])
                    .unwrap_or_default();
                self.advance_by(prefix_len);
                Ok(self.scan_quoted(prefix))
            }

            // 識別子
            c if c.is_ascii_alphabetic() || c == b'_' || c >= 0x80 => {
                while self.peek().is_some_and(Self::is_ident_char) {
                    self.advance();
                }
                Ok(TokenKind::Ident)
            }

            // pp-number
            b'0'..=b'9' => Ok(self.scan_number()),
            b'.' if self.peek_n(1).is_some_and(|c| c.is_ascii_digit()) => Ok(self.scan_number()),

            b'"' | b'\'' => Ok(self.scan_quoted(EncodingPrefix::None)),

            _ => Ok(self.scan_punct()),
        }
    }

    /// 空白（改行以外）と行継続をまとめて1トークンにする
    fn scan_whitespace(&mut self) -> TokenKind {
        loop {
            if let Some(len) = self.line_continuation_len() {
                self.advance_by(len);
            } else if self.peek().is_some_and(Self::is_space) {
                self.advance();
            } else {
                return TokenKind::Whitespace;
            }
        }
    }

    /// 行コメントをスキャン（改行は含めない）
    fn scan_line_comment(&mut self) -> TokenKind {
        while self.peek().is_some_and(|c| c != b'\n') {
            self.advance();
        }
        TokenKind::Comment(CommentKind::Line)
    }

    /// ブロックコメントをスキャン
    fn scan_block_comment(&mut self, loc: &SourceLocation) -> Result<TokenKind> {
        self.advance(); // /
        self.advance(); // *
        loop {
            match (self.peek(), self.peek_n(1)) {
                (Some(b'*'), Some(b'/')) => {
                    self.advance();
                    self.advance();
                    return Ok(TokenKind::Comment(CommentKind::Block));
                }
                (Some(_), _) => {
                    self.advance();
                }
                (None, _) => {
                    return Err(CompileError::Lex {
                        loc: loc.clone(),
                        kind: LexError::UnterminatedComment,
                    });
                }
            }
        }
    }

    /// `L"`, `u8'` などのプレフィックス長（引用符は含まない）
    fn prefixed_literal_len(&self) -> Option<usize> {
        match (self.peek(), self.peek_n(1), self.peek_n(2)) {
            (Some(b'u'), Some(b'8'), Some(b'"' | b'\'')) => Some(2),
            (Some(b'L' | b'u' | b'U'), Some(b'"' | b'\''), _) => Some(1),
            _ => None,
        }
    }

    /// 文字列・文字リテラルをスキャン
    ///
    /// 行内で閉じられていない引用符は `Other` として1文字だけ消費する。
    fn scan_quoted(&mut self, prefix: EncodingPrefix) -> TokenKind {
        let Some(quote) = self.peek() else {
            return TokenKind::Other;
        };
        let bytes = self.source.as_bytes();
        let mut end = self.pos + 1;
        let closed = loop {
            match bytes.get(end) {
                Some(&c) if c == quote => break true,
                Some(b'\\') if matches!(bytes.get(end + 1), Some(c) if *c != b'\n') => end += 2,
                Some(b'\n') | None => break false,
                Some(_) => end += 1,
            }
        };

        if !closed {
            self.advance();
            return TokenKind::Other;
        }

        self.advance_by(end + 1 - self.pos);
        if quote == b'"' {
            TokenKind::StringLit(prefix)
        } else {
            TokenKind::CharLit(prefix)
        }
    }

    /// pp-number をスキャン
    fn scan_number(&mut self) -> TokenKind {
        self.advance();
        loop {
            match (self.peek(), self.peek_n(1)) {
                (Some(b'e' | b'E' | b'p' | b'P'), Some(b'+' | b'-')) => self.advance_by(2),
                // C++14 の桁区切り 1'000'000
                (Some(b'\''), Some(c)) if c.is_ascii_alphanumeric() => self.advance_by(2),
                (Some(c), _) if Self::is_ident_char(c) || c == b'.' => {
                    self.advance();
                }
                _ => return TokenKind::Number,
            }
        }
    }

    /// 演算子・区切り記号をスキャン（最長一致）
    fn scan_punct(&mut self) -> TokenKind {
        const PUNCTS: &[(&str, TokenKind)] = &[
            ("...", TokenKind::Ellipsis),
            ("<<=", TokenKind::LtLtEq),
            (">>=", TokenKind::GtGtEq),
            ("##", TokenKind::HashHash),
            ("<<", TokenKind::LtLt),
            (">>", TokenKind::GtGt),
            ("&&", TokenKind::AmpAmp),
            ("||", TokenKind::PipePipe),
            ("<=", TokenKind::LtEq),
            (">=", TokenKind::GtEq),
            ("==", TokenKind::EqEq),
            ("!=", TokenKind::BangEq),
            ("+=", TokenKind::PlusEq),
            ("-=", TokenKind::MinusEq),
            ("*=", TokenKind::StarEq),
            ("/=", TokenKind::SlashEq),
            ("%=", TokenKind::PercentEq),
            ("&=", TokenKind::AmpEq),
            ("|=", TokenKind::PipeEq),
            ("^=", TokenKind::CaretEq),
            ("++", TokenKind::PlusPlus),
            ("--", TokenKind::MinusMinus),
            ("->", TokenKind::Arrow),
            ("::", TokenKind::ColonColon),
            ("+", TokenKind::Plus),
            ("-", TokenKind::Minus),
            ("*", TokenKind::Star),
            ("/", TokenKind::Slash),
            ("%", TokenKind::Percent),
            ("&", TokenKind::Amp),
            ("|", TokenKind::Pipe),
            ("^", TokenKind::Caret),
            ("~", TokenKind::Tilde),
            ("!", TokenKind::Bang),
            ("<", TokenKind::Lt),
            (">", TokenKind::Gt),
            ("=", TokenKind::Eq),
            ("?", TokenKind::Question),
            (":", TokenKind::Colon),
            (".", TokenKind::Dot),
            (",", TokenKind::Comma),
            (";", TokenKind::Semi),
            ("(", TokenKind::LParen),
            (")", TokenKind::RParen),
            ("[", TokenKind::LBracket),
            ("]", TokenKind::RBracket),
            ("{", TokenKind::LBrace),
            ("}", TokenKind::RBrace),
            ("#", TokenKind::Hash),
        ];

        let rest = &self.source[self.pos..];
        for (spelling, kind) in PUNCTS {
            if rest.starts_with(spelling) {
                self.advance_by(spelling.len());
                return *kind;
            }
        }

        // 非ASCII文字は識別子として扱われるため、ここに来るのは ASCII のみ
        self.advance();
        TokenKind::Other
    }
}

/// 文字列をトークン化するショートカット
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source, FileId::default()).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<(TokenKind, String)> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| (t.kind, t.text))
            .collect()
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).into_iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn test_directive_line() {
        assert_eq!(
            kinds("#define X(a) a"),
            vec![
                TokenKind::Hash,
                TokenKind::Ident,
                TokenKind::Whitespace,
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::Ident,
                TokenKind::RParen,
                TokenKind::Whitespace,
                TokenKind::Ident,
            ]
        );
    }

    #[test]
    fn test_operators() {
        let tokens: Vec<_> = kinds("<<= >> ## ... :: && ||")
            .into_iter()
            .filter(|k| !k.is_trivia())
            .collect();
        assert_eq!(
            tokens,
            vec![
                TokenKind::LtLtEq,
                TokenKind::GtGt,
                TokenKind::HashHash,
                TokenKind::Ellipsis,
                TokenKind::ColonColon,
                TokenKind::AmpAmp,
                TokenKind::PipePipe,
            ]
        );
    }

    #[test]
    fn test_encoding_prefixes() {
        assert_eq!(
            kinds(r#"L"a" u8"b" u'c' U"d" "e""#)
                .into_iter()
                .filter(|k| !k.is_trivia())
                .collect::<Vec<_>>(),
            vec![
                TokenKind::StringLit(EncodingPrefix::Wide),
                TokenKind::StringLit(EncodingPrefix::Utf8),
                TokenKind::CharLit(EncodingPrefix::Utf16),
                TokenKind::StringLit(EncodingPrefix::Utf32),
                TokenKind::StringLit(EncodingPrefix::None),
            ]
        );
        // L# は識別子 L と # に分かれる
        assert_eq!(kinds("L#x"), vec![TokenKind::Ident, TokenKind::Hash, TokenKind::Ident]);
    }

    #[test]
    fn test_pp_numbers() {
        let tokens = lex("0x1Fu 1.5e+10f 1'000 .5");
        let numbers: Vec<_> = tokens
            .into_iter()
            .filter(|(k, _)| *k == TokenKind::Number)
            .map(|(_, s)| s)
            .collect();
        assert_eq!(numbers, vec!["0x1Fu", "1.5e+10f", "1'000", ".5"]);
    }

    #[test]
    fn test_comments_are_tokens() {
        let tokens = lex("a /* b */ // c");
        assert_eq!(tokens[2], (TokenKind::Comment(CommentKind::Block), "/* b */".to_string()));
        assert_eq!(tokens[4], (TokenKind::Comment(CommentKind::Line), "// c".to_string()));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = tokenize("#if /* open").unwrap_err();
        assert!(matches!(err, CompileError::Lex { kind: LexError::UnterminatedComment, .. }));
    }

    #[test]
    fn test_unterminated_quote_is_other() {
        let tokens = lex("#error don't");
        assert!(tokens.contains(&(TokenKind::Other, "'".to_string())));
        assert!(tokens.contains(&(TokenKind::Ident, "t".to_string())));
    }

    #[test]
    fn test_round_trip_text() {
        let source = "#  include <a/b-c.h>\t/* x */ // y\n#endif\\\n  ";
        let text: String = tokenize(source).unwrap().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(text, source);
    }

    #[test]
    fn test_locations() {
        let tokens = tokenize("#if\n  X").unwrap();
        let x = tokens.iter().find(|t| t.text == "X").unwrap();
        assert_eq!(x.loc.line, 2);
        assert_eq!(x.loc.column, 3);
        assert_eq!(x.loc.offset, 6);
    }
}
