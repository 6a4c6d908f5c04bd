//! 型情報のエラー

use thiserror::Error;

/// 型の問い合わせで発生するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// 型情報を持たない型
    #[error("type is unknown: {0}")]
    UnknownType(String),

    /// 構造体/共用体ではない型にフィールドを問い合わせた
    #[error("type is not a struct or union: {0}")]
    NotARecord(String),

    /// 列挙型ではない型に列挙子を問い合わせた
    #[error("type is not an enum: {0}")]
    NotAnEnum(String),

    /// オフセットに対応するフィールドが存在しない
    #[error("wrong offset {offset} in {type_name}")]
    WrongOffset { type_name: String, offset: usize },

    /// 構造体の入れ子が深すぎる
    #[error("type nesting deeper than {0} levels")]
    DepthExceeded(usize),

    /// サイズの計算が usize に収まらない
    #[error("size of {0} overflows")]
    SizeOverflow(String),
}
