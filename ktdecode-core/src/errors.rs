//! デコードのエラー

use ktdecode_types::TypeError;
use thiserror::Error;

/// デコード中に発生するエラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// デコードできない型
    #[error("unsupported type for decoding: {0}")]
    Unsupported(String),

    /// 型情報の問い合わせに失敗した（オフセット不整合を含む）
    #[error(transparent)]
    Type(#[from] TypeError),

    /// テストケースに必要なオブジェクトが無い
    #[error("object not found in test case: {0}")]
    MissingObject(String),

    /// バッファの範囲外を読もうとした
    #[error("read of {len} bytes at offset {offset} exceeds buffer of {size} bytes")]
    OutOfBounds { offset: usize, len: usize, size: usize },

    /// シンボリック標準入力の読み取り量が容量を超えた
    #[error("symbolic stdin read {read} bytes but capacity is {capacity}")]
    StdinBudget { read: i64, capacity: usize },

    /// テストベクタの内容が不正
    #[error("malformed test vector: {0}")]
    Malformed(String),

    /// 呼び出し側の設定が不正（述語の演算子や型など）
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// 入れ子が深すぎる
    #[error("decoding nested deeper than {0} levels")]
    DepthExceeded(usize),
}

impl DecodeError {
    /// テストケース単位で捨てて続行できるエラーか
    pub fn is_case_local(&self) -> bool {
        !matches!(self, DecodeError::Configuration(_))
    }
}
