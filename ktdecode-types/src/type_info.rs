//! 型記述子
//!
//! デコード対象の型を、基底型名とポインタ/配列の修飾の並びで表現します。
//! 修飾は外側から順に並びます（`int *[3]` なら `[Array(3), Pointer]`）。

use crate::primitive::{PrimitiveClass, PrimitiveInfo, MINIMAL_SCALAR_TYPE_NAME};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 型の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// スカラー型（void を含む）
    Primitive,
    /// 構造体
    Struct,
    /// 共用体
    Union,
    /// 列挙型
    Enum,
    /// 固定長配列
    Array,
    /// オブジェクトへのポインタ
    ObjectPointer,
    /// 関数ポインタ
    FunctionPointer,
    /// 不明な型
    Unknown,
}

/// ポインタ/配列の修飾
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// ポインタ
    Pointer,
    /// 要素数つきの配列
    Array(usize),
}

/// ポインタの用途
///
/// バッファ長だけではポインタの先の要素数が決まらないため、
/// 用途ごとに想定する要素数を切り替えます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerUsage {
    /// 関数の引数
    Parameter,
    /// 関数の戻り値
    Return,
    /// 遅延オブジェクト（他のオブジェクトから参照されて初めて見つかったもの）
    Lazy,
    /// 要素数が明示されている
    KnownSize(usize),
}

impl PointerUsage {
    /// 1次元ポインタの想定要素数
    pub fn one_dim_elements(self) -> usize {
        match self {
            PointerUsage::Parameter => 10,
            PointerUsage::Return => 1,
            PointerUsage::Lazy => 1,
            PointerUsage::KnownSize(n) => n,
        }
    }

    /// 多次元ポインタの各段の想定要素数
    pub fn multi_dim_elements(self) -> usize {
        match self {
            PointerUsage::Parameter => 2,
            PointerUsage::Return => 2,
            PointerUsage::Lazy => 1,
            PointerUsage::KnownSize(n) => n,
        }
    }

    /// 明示された要素数
    pub fn known_size(self) -> Option<usize> {
        match self {
            PointerUsage::KnownSize(n) => Some(n),
            _ => None,
        }
    }
}

/// 型記述子
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Type {
    /// 基底型名（`int`, `struct Node`, `const char` など）
    pub name: String,
    /// ポインタ/配列の修飾（外側から順）
    #[serde(default)]
    pub levels: Vec<Level>,
    /// 基底が関数（関数ポインタ）かどうか
    #[serde(default)]
    pub function: bool,
    /// ポインタが配列として使われている可能性があるか
    #[serde(default)]
    pub maybe_array: bool,
}

impl Type {
    /// 修飾なしの型を作成する
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            levels: Vec::new(),
            function: false,
            maybe_array: false,
        }
    }

    /// 関数ポインタ型を作成する
    pub fn function_pointer(signature: impl Into<String>) -> Self {
        Self {
            function: true,
            ..Self::simple(signature)
        }
    }

    /// `const char *` 型
    pub fn c_string() -> Self {
        Self {
            maybe_array: true,
            ..Self::simple("const char").pointer()
        }
    }

    /// `int` 型
    pub fn int() -> Self {
        Self::simple("int")
    }

    /// `long long` 型
    pub fn long_long() -> Self {
        Self::simple("long long")
    }

    /// voidの代わりに読み取る最小スカラー型
    pub fn minimal_scalar() -> Self {
        Self::simple(MINIMAL_SCALAR_TYPE_NAME)
    }

    /// この型へのポインタ型を作成する
    pub fn pointer(mut self) -> Self {
        self.levels.insert(0, Level::Pointer);
        self
    }

    /// この型を要素とする配列型を作成する
    pub fn array(mut self, len: usize) -> Self {
        self.levels.insert(0, Level::Array(len));
        self
    }

    /// 引数用の要素数を持つ配列として包む（スタブの戻り値の記録用）
    pub fn create_array(&self) -> Self {
        let mut res = self.clone().array(PointerUsage::Parameter.one_dim_elements());
        res.maybe_array = true;
        res
    }

    /// 配列とみなす
    pub fn with_maybe_array(mut self) -> Self {
        self.maybe_array = true;
        self
    }

    /// `const` を除いた基底型名
    pub fn base_name(&self) -> &str {
        self.name
            .strip_prefix("const ")
            .map(str::trim_start)
            .unwrap_or(&self.name)
    }

    /// 基底型が const 修飾されているか
    pub fn is_const(&self) -> bool {
        self.name.starts_with("const ")
    }

    /// 修飾が無いか
    pub fn is_simple(&self) -> bool {
        self.levels.is_empty() && !self.function
    }

    /// 基底型のプリミティブ情報
    pub fn primitive(&self) -> Option<PrimitiveInfo> {
        if self.function {
            return None;
        }
        PrimitiveInfo::lookup(self.base_name())
    }

    /// 先頭がポインタかどうか
    pub fn is_object_pointer(&self) -> bool {
        matches!(self.levels.first(), Some(Level::Pointer))
    }

    /// 先頭が配列かどうか
    pub fn is_array(&self) -> bool {
        matches!(self.levels.first(), Some(Level::Array(_)))
    }

    /// 関数ポインタそのものかどうか
    pub fn is_function_pointer(&self) -> bool {
        self.function && self.levels.is_empty()
    }

    /// 関数ポインタへのポインタ（関数ポインタの配列）かどうか
    pub fn is_array_of_function_pointers(&self) -> bool {
        self.function && self.is_object_pointer()
    }

    /// 1段だけのポインタかどうか
    pub fn is_one_dimension_pointer(&self) -> bool {
        self.levels.len() == 1 && self.is_object_pointer()
    }

    /// void 型かどうか
    pub fn is_void(&self) -> bool {
        self.is_simple() && self.base_is_void()
    }

    /// 基底型が void かどうか
    pub fn base_is_void(&self) -> bool {
        !self.function && self.base_name() == "void"
    }

    /// 真偽値型かどうか
    pub fn is_boolean(&self) -> bool {
        self.is_simple() && self.base_class() == Some(PrimitiveClass::Bool)
    }

    /// 文字型かどうか
    pub fn is_character(&self) -> bool {
        self.is_simple() && self.base_class() == Some(PrimitiveClass::Char)
    }

    /// C文字列（文字への1段ポインタ）かどうか
    pub fn is_c_string(&self) -> bool {
        self.is_one_dimension_pointer() && self.base_class() == Some(PrimitiveClass::Char)
    }

    fn base_class(&self) -> Option<PrimitiveClass> {
        self.primitive().map(|p| p.class)
    }

    /// ポインタ/配列の段数
    pub fn dimension(&self) -> usize {
        self.levels.len()
    }

    /// 先頭から `depth` 段の修飾を外した型
    pub fn base_type_at(&self, depth: usize) -> Type {
        let mut ty = self.clone();
        let depth = depth.min(ty.levels.len());
        ty.levels.drain(..depth);
        ty
    }

    /// 全ての修飾を外した型
    pub fn base_type(&self) -> Type {
        self.base_type_at(self.dimension())
    }

    /// 1段だけ外した型（ポインタの指す先）
    pub fn pointee(&self) -> Type {
        self.base_type_at(1)
    }

    /// 配列ではなく単一オブジェクトへのポインタとみなせるか
    pub fn maybe_just_pointer(&self) -> bool {
        self.is_object_pointer() && !self.maybe_array && self.levels.len() < 2
    }

    /// 戻り値を配列として扱うべきか
    pub fn maybe_return_array(&self) -> bool {
        self.is_object_pointer()
            && !self.maybe_just_pointer()
            && !self.is_array_of_function_pointers()
            && self.levels.len() < 2
            && !self.base_is_void()
    }

    /// 戻り値の検査を省略する型か（void、関数ポインタ、関数ポインタの配列）
    pub fn skip_in_return(&self) -> bool {
        self.is_void() || self.is_function_pointer() || self.is_array_of_function_pointers()
    }

    /// 戻り値・事後値として検査する型
    pub fn type_to_check(&self) -> Type {
        if self.is_object_pointer() {
            let base = self.base_type();
            if base.skip_in_return() {
                return Type::minimal_scalar();
            }
            return base;
        }
        self.clone()
    }

    /// 各段の要素数
    ///
    /// 配列はその長さ、ポインタは用途ごとの想定要素数になります。
    /// 遅延オブジェクトの場合は最初のポインタで打ち切ります。
    pub fn arrays_sizes(&self, usage: PointerUsage) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.levels.len());
        for level in &self.levels {
            match level {
                Level::Array(len) => sizes.push(*len),
                Level::Pointer => {
                    if self.levels.len() <= 1 {
                        sizes.push(usage.one_dim_elements());
                    } else {
                        sizes.push(usage.multi_dim_elements());
                    }
                    if usage == PointerUsage::Lazy {
                        return sizes;
                    }
                }
            }
        }
        sizes
    }

    /// ポインタの段を想定要素数の配列に置き換えた型
    pub fn array_clone_multi_dim(&self, usage: PointerUsage) -> Type {
        if self.maybe_just_pointer() {
            return self.base_type();
        }
        let sizes = self.arrays_sizes(usage);
        let mut ty = self.clone();
        if sizes.len() == 1 {
            if let Some(first) = ty.levels.first_mut() {
                *first = Level::Array(usage.one_dim_elements());
            }
            return ty;
        }
        for (level, size) in ty.levels.iter_mut().zip(sizes) {
            if *level == Level::Pointer {
                *level = Level::Array(size);
            }
        }
        ty
    }

    /// 型名（C風の表記）
    pub fn type_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)?;
        let pointers = self
            .levels
            .iter()
            .filter(|level| **level == Level::Pointer)
            .count();
        if pointers > 0 {
            write!(f, " {}", "*".repeat(pointers))?;
        }
        for level in &self.levels {
            if let Level::Array(len) = level {
                write!(f, "[{}]", len)?;
            }
        }
        Ok(())
    }
}
