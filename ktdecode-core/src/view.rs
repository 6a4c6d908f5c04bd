//! 値ビュー
//!
//! デコード結果の木。各ノードは自分のリテラル（`entry_value`）と
//! 直下の子のリテラルを生成できます。子は親が所有し、別名関係は
//! `InitReference` として木の外で表します。

use crate::literal::{from_bytes_literal, is_fp_special_literal};
use serde::Serialize;
use std::fmt;

/// 値ビュー
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueView {
    /// スカラー値
    Primitive { literal: String },
    /// 文字列リテラル
    String { literal: String },
    /// 関数ポインタ（スタブ関数名）
    FunctionPointer { literal: String },
    /// 列挙値
    Enum { literal: String },
    /// 値なし
    Void,
    /// 配列
    Array { elements: Vec<ValueView> },
    /// 構造体
    Struct(StructView),
    /// 共用体
    Union(UnionView),
}

/// 名前付きの子ビュー
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldView {
    /// フィールド名（無名メンバは空）
    pub name: String,
    pub view: ValueView,
}

/// 構造体のビュー
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructView {
    /// 型名
    pub name: String,
    /// 宣言順のフィールド
    pub fields: Vec<FieldView>,
    /// 指示付き初期化子を使うか
    pub c_like: bool,
    /// リテラルの上書き（無名メンバを含む構造体の生バイト復元式）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_literal: Option<String>,
}

/// 共用体のビュー
///
/// どのメンバが有効かはバイト列からは決まらないため、リテラルは常に
/// 生バイトからの復元式です。メンバごとの解釈は子として保持します。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnionView {
    pub name: String,
    /// `utbot_byte` の配列
    pub bytes: Box<ValueView>,
    /// 同じバイト列を各メンバの型で読んだもの
    pub members: Vec<FieldView>,
}

impl ValueView {
    /// スカラー値のビュー
    pub fn primitive(literal: impl Into<String>) -> Self {
        ValueView::Primitive {
            literal: literal.into(),
        }
    }

    /// 配列のビュー
    pub fn array(elements: Vec<ValueView>) -> Self {
        ValueView::Array { elements }
    }

    /// このノードのリテラル
    pub fn entry_value(&self) -> String {
        match self {
            ValueView::Primitive { literal }
            | ValueView::String { literal }
            | ValueView::FunctionPointer { literal }
            | ValueView::Enum { literal } => literal.clone(),
            ValueView::Void => String::new(),
            ValueView::Array { elements } => {
                let items: Vec<String> = elements.iter().map(|e| e.entry_value()).collect();
                format!("{{{}}}", items.join(", "))
            }
            ValueView::Struct(view) => view.entry_value(),
            ValueView::Union(view) => view.entry_value(),
        }
    }

    /// 直下の子
    pub fn children(&self) -> Vec<&ValueView> {
        match self {
            ValueView::Array { elements } => elements.iter().collect(),
            ValueView::Struct(view) => view.fields.iter().map(|f| &f.view).collect(),
            ValueView::Union(view) => view.members.iter().map(|f| &f.view).collect(),
            _ => Vec::new(),
        }
    }

    /// 直下の子のリテラル
    pub fn child_entries(&self) -> Vec<String> {
        self.children().iter().map(|c| c.entry_value()).collect()
    }

    /// 部分木に NaN/無限大が含まれるか
    pub fn contains_fp_special_value(&self) -> bool {
        match self {
            ValueView::Primitive { literal } => is_fp_special_literal(literal),
            ValueView::Union(view) => view.members.iter().any(|m| m.view.contains_fp_special_value()),
            _ => self.children().iter().any(|c| c.contains_fp_special_value()),
        }
    }

    /// 子を持たないノードか
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            ValueView::Primitive { .. }
                | ValueView::String { .. }
                | ValueView::FunctionPointer { .. }
                | ValueView::Enum { .. }
                | ValueView::Void
        )
    }

    /// 配列の入れ子の深さ
    pub fn array_depth(&self) -> usize {
        match self {
            ValueView::Array { elements } => {
                1 + elements.first().map(|e| e.array_depth()).unwrap_or(0)
            }
            _ => 0,
        }
    }

    /// 配列以外の葉の数
    pub fn array_leaf_count(&self) -> usize {
        match self {
            ValueView::Array { elements } => elements.iter().map(|e| e.array_leaf_count()).sum(),
            _ => 1,
        }
    }
}

impl StructView {
    /// 構造体のリテラル
    pub fn entry_value(&self) -> String {
        if let Some(literal) = &self.override_literal {
            return literal.clone();
        }
        let items: Vec<String> = self
            .fields
            .iter()
            .map(|f| {
                let value = f.view.entry_value();
                if f.name.is_empty() {
                    value
                } else if self.c_like {
                    format!(".{} = {}", f.name, value)
                } else {
                    format!("/*.{} = */{}", f.name, value)
                }
            })
            .collect();
        format!("{{{}}}", items.join(", "))
    }

    /// 名前でフィールドを引く
    pub fn field(&self, name: &str) -> Option<&ValueView> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.view)
    }
}

impl UnionView {
    /// 共用体のリテラル
    pub fn entry_value(&self) -> String {
        from_bytes_literal(&self.name, &self.bytes.entry_value())
    }

    /// 名前でメンバを引く
    pub fn member(&self, name: &str) -> Option<&ValueView> {
        self.members.iter().find(|f| f.name == name).map(|f| &f.view)
    }
}

impl fmt::Display for ValueView {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.entry_value())
    }
}
