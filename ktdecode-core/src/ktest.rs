//! シンボリック実行エンジンのテストベクタ
//!
//! エンジンが具体化したオブジェクト（名前付きバイト列）と、
//! オブジェクト間のポインタ関係を表します。

use serde::{Deserialize, Serialize};

/// 戻り値オブジェクトの名前
pub const RESULT_VARIABLE_NAME: &str = "utbot_result";
/// 戻り値のポインタが非 NULL と証明されたかを表すオブジェクト
pub const NOT_NULL_VARIABLE_NAME: &str = "utbot_return_not_null";
/// 行/パスの条件を満たしたかを表すオブジェクト
pub const PATH_FLAG_VARIABLE_NAME: &str = "kleePathFlagSymbolic";
/// 記号に対応付けられなかったオブジェクトにエンジンが付ける名前
pub const LAZY_PLACEHOLDER_NAME: &str = "unnamed";
/// 遅延オブジェクトに生成する名前の接頭辞
pub const LAZY_NAME_PREFIX: &str = "utbotInnerVar";
/// 呼び出し後の値を持つオブジェクトの接尾辞
pub const POST_VALUE_SUFFIX: &str = "_post";
/// スタブの戻り値/引数を記録したオブジェクトの接尾辞
pub const SYMBOLIC_SUFFIX: &str = "_symbolic";
/// シンボリック標準入力の内容
pub const STDIN_OBJECT_NAME: &str = "stdin";
/// シンボリック標準入力から読まれたバイト数
pub const STDIN_READ_OBJECT_NAME: &str = "stdin-read";
/// デコードした標準入力の変数名
pub const STDIN_VARIABLE_NAME: &str = "stdin_buf";

/// オブジェクト内のポインタ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerOffset {
    /// ポインタが格納されているバイトオフセット
    pub offset: usize,
    /// 指している先のオブジェクトの番号
    pub index: usize,
}

/// 具体化されたオブジェクト
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcretizedObject {
    pub name: String,
    pub bytes: Vec<u8>,
    #[serde(default)]
    pub offsets: Vec<PointerOffset>,
    /// エンジンが割り当てたアドレス
    #[serde(default)]
    pub address: u64,
    /// 記号に対応付けられなかったオブジェクト
    #[serde(default)]
    pub is_lazy: bool,
}

impl ConcretizedObject {
    /// 新しいオブジェクトを作成する
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let is_lazy = name == LAZY_PLACEHOLDER_NAME;
        Self {
            name,
            bytes,
            offsets: Vec::new(),
            address: 0,
            is_lazy,
        }
    }

    /// アドレスを指定する
    pub fn at(mut self, address: u64) -> Self {
        self.address = address;
        self
    }

    /// 遅延オブジェクトとして扱う
    pub fn lazy(mut self) -> Self {
        self.is_lazy = true;
        self
    }

    /// ポインタを追加する
    pub fn pointing(mut self, offset: usize, index: usize) -> Self {
        self.offsets.push(PointerOffset { offset, index });
        self
    }

    /// 宣言された記号に対応しないオブジェクトか
    ///
    /// フラグを省略した入力でもプレースホルダ名なら遅延オブジェクトです。
    pub fn is_lazy(&self) -> bool {
        self.is_lazy || self.name == LAZY_PLACEHOLDER_NAME
    }
}

/// 実行パスの終了状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Success,
    /// エンジンがエラーパスと判定した
    Failed,
}

/// 1つの実行パスのテストベクタ
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TestVector {
    pub objects: Vec<ConcretizedObject>,
    #[serde(default)]
    pub status: Status,
    /// エラーパスの説明
    #[serde(default)]
    pub error_descriptors: Vec<String>,
}

impl TestVector {
    /// 新しいテストベクタを作成する
    pub fn new(objects: Vec<ConcretizedObject>) -> Self {
        Self {
            objects,
            status: Status::Success,
            error_descriptors: Vec::new(),
        }
    }

    /// 名前でオブジェクトを探す
    pub fn find(&self, name: &str) -> Option<(usize, &ConcretizedObject)> {
        self.objects.iter().enumerate().find(|(_, o)| o.name == name)
    }

    /// 名前でオブジェクトを引く
    pub fn get(&self, name: &str) -> Option<&ConcretizedObject> {
        self.find(name).map(|(_, o)| o)
    }
}
