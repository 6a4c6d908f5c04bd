//! 型情報の問い合わせ（Type Oracle）
//!
//! デコーダは型のレイアウトを自分では解析せず、`TypeOracle` を介して
//! 構造体・共用体・列挙型の情報を問い合わせます。

use crate::type_info::{Level, Type, TypeKind};
use crate::{Result, TypeError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 構造体か共用体か
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Struct,
    Union,
}

/// フィールド情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// フィールド名（無名メンバは空文字列）
    #[serde(default)]
    pub name: String,
    /// 型
    #[serde(rename = "type")]
    pub ty: Type,
    /// オフセット（バイト）
    pub offset: usize,
    /// ビット幅（ビットフィールドのみ）
    #[serde(default)]
    pub bit_size: Option<usize>,
    /// バイトオフセット内のビット位置
    #[serde(default)]
    pub bit_offset: usize,
}

impl Field {
    /// ビットフィールドかどうか
    pub fn is_bitfield(&self, type_size: usize) -> bool {
        match self.bit_size {
            Some(bits) => bits < type_size.saturating_mul(8) || self.bit_offset != 0,
            None => false,
        }
    }

    /// 無名メンバかどうか
    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }
}

fn default_true() -> bool {
    true
}

/// 構造体/共用体のレイアウト
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordInfo {
    /// 型名
    pub name: String,
    /// 構造体か共用体か
    pub kind: RecordKind,
    /// サイズ（バイト）
    pub size: usize,
    /// 宣言順のフィールド
    #[serde(default)]
    pub fields: Vec<Field>,
    /// C言語の集成体か（指示付き初期化子が使えるか）
    #[serde(default = "default_true")]
    pub c_like: bool,
    /// 無名の構造体/共用体メンバを含むか
    #[serde(default)]
    pub has_anonymous_member: bool,
}

impl RecordInfo {
    /// オフセット順に並べたフィールド
    ///
    /// 同じオフセットのフィールドは宣言順を保ちます。
    pub fn fields_by_offset(&self) -> Vec<&Field> {
        let mut fields: Vec<&Field> = self.fields.iter().collect();
        fields.sort_by_key(|f| f.offset);
        fields
    }

    /// 名前でフィールドを探す
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// 列挙子
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumEntry {
    pub name: String,
    pub value: i64,
}

fn default_enum_size() -> usize {
    4
}

/// 列挙型の情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumInfo {
    /// 型名
    pub name: String,
    /// サイズ（バイト）
    #[serde(default = "default_enum_size")]
    pub size: usize,
    /// 列挙子
    #[serde(default)]
    pub entries: Vec<EnumEntry>,
    /// スコープ（`enum class` の場合の修飾名）
    #[serde(default)]
    pub access: Option<String>,
}

impl EnumInfo {
    /// 値から列挙子名を引く
    pub fn name_of(&self, value: i64) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.value == value)
            .map(|e| e.name.as_str())
    }

    /// 列挙子名から値を引く
    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.value)
    }

    /// 修飾済みの列挙子名
    pub fn qualified_name(&self, value: i64) -> Option<String> {
        let name = self.name_of(value)?;
        Some(match &self.access {
            Some(access) if !access.is_empty() => format!("{}::{}", access, name),
            _ => name.to_string(),
        })
    }
}

/// 型情報の問い合わせインターフェース
///
/// 実装は副作用を持たない読み取り専用の問い合わせでなければなりません。
pub trait TypeOracle {
    /// 構造体/共用体を名前で引く
    fn record(&self, name: &str) -> Option<&RecordInfo>;

    /// 列挙型を名前で引く
    fn enumeration(&self, name: &str) -> Option<&EnumInfo>;

    /// ポインタのサイズ
    fn pointer_size(&self) -> usize {
        8
    }

    /// 構造体の入れ子の上限
    fn max_nesting_depth(&self) -> usize {
        32
    }

    /// 型の種別
    fn kind_of(&self, ty: &Type) -> TypeKind {
        match ty.levels.first() {
            Some(Level::Pointer) => return TypeKind::ObjectPointer,
            Some(Level::Array(_)) => return TypeKind::Array,
            None => {}
        }
        if ty.function {
            return TypeKind::FunctionPointer;
        }
        if ty.primitive().is_some() {
            return TypeKind::Primitive;
        }
        if let Some(record) = self.record(ty.base_name()) {
            return match record.kind {
                RecordKind::Struct => TypeKind::Struct,
                RecordKind::Union => TypeKind::Union,
            };
        }
        if self.enumeration(ty.base_name()).is_some() {
            return TypeKind::Enum;
        }
        TypeKind::Unknown
    }

    /// 型のサイズ（バイト）
    fn size_of(&self, ty: &Type) -> Result<usize> {
        match ty.levels.first() {
            Some(Level::Pointer) => return Ok(self.pointer_size()),
            Some(Level::Array(len)) => {
                return len
                    .checked_mul(self.size_of(&ty.pointee())?)
                    .ok_or_else(|| TypeError::SizeOverflow(ty.type_name()));
            }
            None => {}
        }
        if ty.function {
            return Ok(self.pointer_size());
        }
        if let Some(primitive) = ty.primitive() {
            return Ok(primitive.size);
        }
        if let Some(record) = self.record(ty.base_name()) {
            return Ok(record.size);
        }
        if let Some(enumeration) = self.enumeration(ty.base_name()) {
            return Ok(enumeration.size);
        }
        Err(TypeError::UnknownType(ty.type_name()))
    }

    /// 構造体/共用体の宣言順のフィールド
    fn fields_of(&self, ty: &Type) -> Result<&[Field]> {
        self.record_of(ty).map(|r| r.fields.as_slice())
    }

    /// 構造体/共用体のレイアウト
    fn record_of(&self, ty: &Type) -> Result<&RecordInfo> {
        if !ty.is_simple() {
            return Err(TypeError::NotARecord(ty.type_name()));
        }
        self.record(ty.base_name())
            .ok_or_else(|| TypeError::NotARecord(ty.type_name()))
    }

    /// 列挙型の情報
    fn enum_entries(&self, ty: &Type) -> Result<&EnumInfo> {
        if !ty.is_simple() {
            return Err(TypeError::NotAnEnum(ty.type_name()));
        }
        self.enumeration(ty.base_name())
            .ok_or_else(|| TypeError::NotAnEnum(ty.type_name()))
    }
}

fn default_pointer_size() -> usize {
    8
}

/// JSON上の表現
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    records: Vec<RecordInfo>,
    #[serde(default)]
    enums: Vec<EnumInfo>,
    #[serde(default = "default_pointer_size")]
    pointer_size: usize,
}

/// メモリ上の型情報レジストリ
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RegistryFile", into = "RegistryFile")]
pub struct TypeRegistry {
    records: HashMap<String, RecordInfo>,
    enums: HashMap<String, EnumInfo>,
    pointer_size: usize,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// 空のレジストリを作成する
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            enums: HashMap::new(),
            pointer_size: default_pointer_size(),
        }
    }

    /// ポインタサイズを指定する
    pub fn with_pointer_size(mut self, pointer_size: usize) -> Self {
        self.pointer_size = pointer_size;
        self
    }

    /// 構造体/共用体を登録する
    pub fn add_record(&mut self, record: RecordInfo) {
        self.records.insert(record.name.clone(), record);
    }

    /// 列挙型を登録する
    pub fn add_enum(&mut self, info: EnumInfo) {
        self.enums.insert(info.name.clone(), info);
    }

    /// 登録済みの構造体/共用体（名前順）
    pub fn records(&self) -> Vec<&RecordInfo> {
        let mut records: Vec<&RecordInfo> = self.records.values().collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }

    /// 登録済みの列挙型（名前順）
    pub fn enums(&self) -> Vec<&EnumInfo> {
        let mut enums: Vec<&EnumInfo> = self.enums.values().collect();
        enums.sort_by(|a, b| a.name.cmp(&b.name));
        enums
    }
}

/// `struct Node` と `Node` のどちらでも引けるようにする
fn strip_tag(name: &str) -> &str {
    for tag in ["struct ", "union ", "enum ", "class "] {
        if let Some(rest) = name.strip_prefix(tag) {
            return rest.trim_start();
        }
    }
    name
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, name: &str) -> Option<&'a T> {
    map.get(name).or_else(|| map.get(strip_tag(name)))
}

impl TypeOracle for TypeRegistry {
    fn record(&self, name: &str) -> Option<&RecordInfo> {
        lookup(&self.records, name)
    }

    fn enumeration(&self, name: &str) -> Option<&EnumInfo> {
        lookup(&self.enums, name)
    }

    fn pointer_size(&self) -> usize {
        self.pointer_size
    }

    /// 値として入れ子にできる構造体の数は登録数を超えない
    fn max_nesting_depth(&self) -> usize {
        self.records.len() + 1
    }
}

impl From<RegistryFile> for TypeRegistry {
    fn from(file: RegistryFile) -> Self {
        let mut registry = TypeRegistry::new().with_pointer_size(file.pointer_size);
        for record in file.records {
            registry.add_record(record);
        }
        for info in file.enums {
            registry.add_enum(info);
        }
        registry
    }
}

impl From<TypeRegistry> for RegistryFile {
    fn from(registry: TypeRegistry) -> Self {
        let records = registry.records().into_iter().cloned().collect();
        let enums = registry.enums().into_iter().cloned().collect();
        Self {
            records,
            enums,
            pointer_size: registry.pointer_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.add_record(RecordInfo {
            name: "Point".to_string(),
            kind: RecordKind::Struct,
            size: 8,
            fields: vec![
                Field {
                    name: "x".to_string(),
                    ty: Type::int(),
                    offset: 0,
                    bit_size: None,
                    bit_offset: 0,
                },
                Field {
                    name: "y".to_string(),
                    ty: Type::int(),
                    offset: 4,
                    bit_size: None,
                    bit_offset: 0,
                },
            ],
            c_like: true,
            has_anonymous_member: false,
        });
        registry.add_enum(EnumInfo {
            name: "Color".to_string(),
            size: 4,
            entries: vec![
                EnumEntry { name: "RED".to_string(), value: 0 },
                EnumEntry { name: "GREEN".to_string(), value: 1 },
            ],
            access: Some("Color".to_string()),
        });
        registry
    }

    #[test]
    fn test_kind_of() {
        let registry = point_registry();
        assert_eq!(registry.kind_of(&Type::int()), TypeKind::Primitive);
        assert_eq!(registry.kind_of(&Type::simple("struct Point")), TypeKind::Struct);
        assert_eq!(registry.kind_of(&Type::simple("Color")), TypeKind::Enum);
        assert_eq!(
            registry.kind_of(&Type::simple("Point").pointer()),
            TypeKind::ObjectPointer
        );
        assert_eq!(registry.kind_of(&Type::int().array(3)), TypeKind::Array);
        assert_eq!(
            registry.kind_of(&Type::function_pointer("void (*)(void)")),
            TypeKind::FunctionPointer
        );
        assert_eq!(registry.kind_of(&Type::simple("Missing")), TypeKind::Unknown);
    }

    #[test]
    fn test_size_of() {
        let registry = point_registry();
        assert_eq!(registry.size_of(&Type::simple("Point")).unwrap(), 8);
        assert_eq!(registry.size_of(&Type::simple("Point").array(3)).unwrap(), 24);
        assert_eq!(registry.size_of(&Type::int().pointer()).unwrap(), 8);
        assert!(matches!(
            registry.size_of(&Type::simple("Missing")),
            Err(TypeError::UnknownType(_))
        ));
    }

    #[test]
    fn test_huge_array_size_overflows() {
        let registry = point_registry();
        assert!(matches!(
            registry.size_of(&Type::int().array(usize::MAX)),
            Err(TypeError::SizeOverflow(_))
        ));
        assert!(matches!(
            registry.size_of(&Type::simple("Point").array(usize::MAX / 4)),
            Err(TypeError::SizeOverflow(_))
        ));
    }

    #[test]
    fn test_enum_lookup() {
        let registry = point_registry();
        let info = registry.enum_entries(&Type::simple("Color")).unwrap();
        assert_eq!(info.name_of(1), Some("GREEN"));
        assert_eq!(info.value_of("RED"), Some(0));
        assert_eq!(info.qualified_name(1).as_deref(), Some("Color::GREEN"));
        assert_eq!(info.name_of(7), None);
    }

    #[test]
    fn test_registry_json() {
        let json = r#"{
            "records": [{"name": "Pair", "kind": "struct", "size": 2,
                         "fields": [{"name": "a", "type": {"name": "char"}, "offset": 0},
                                    {"name": "b", "type": {"name": "char"}, "offset": 1}]}],
            "enums": []
        }"#;
        let registry: TypeRegistry = serde_json::from_str(json).unwrap();
        let pair = registry.record("Pair").unwrap();
        assert!(pair.c_like);
        assert_eq!(pair.fields.len(), 2);
        assert_eq!(registry.pointer_size(), 8);
    }
}
