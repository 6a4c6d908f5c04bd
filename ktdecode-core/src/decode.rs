//! 値デコード機能
//!
//! テストベクタのバイト列を、型情報に基づいて値ビューにデコードします。
//! 型の種別ごとの振り分けは `TypeKind` に対する網羅的な `match` で行います。

use crate::graph::AddressTable;
use crate::literal::{
    bool_literal, char_literal, enum_cast_literal, field_stub_name, float_literal,
    from_bytes_literal, parameter_stub_name, pointer_literal, reference_cast, signed_literal,
    string_literal, unsigned_literal, NULL_LITERAL,
};
use crate::view::{FieldView, StructView, UnionView, ValueView};
use crate::{DecodeError, Result};
use ktdecode_types::primitive::BYTE_TYPE_NAME;
use ktdecode_types::{
    Field, Level, PointerUsage, PrimitiveClass, PrimitiveInfo, RecordInfo, Type, TypeKind,
    TypeOracle,
};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::{trace, warn};

/// デコード設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// 最大深さ（再帰制限）
    pub max_depth: usize,
    /// シンボリック標準入力の容量（バイト）
    pub symbolic_stdin_size: usize,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            max_depth: 32,
            symbolic_stdin_size: 64,
        }
    }
}

/// 名前付きオブジェクトへの参照
///
/// `variable` の値は `referenced` と同じオブジェクトを指すため、
/// リテラルを複製せずに `(T *) &referenced` として出力します。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitReference {
    /// 参照を持つ変数（`node.next` のようなアクセスパス）
    pub variable: String,
    /// 参照先の名前
    pub referenced: String,
    /// 参照に付けるキャスト
    pub cast: String,
}

impl InitReference {
    /// 代入の右辺
    pub fn literal(&self) -> String {
        format!("{} &{}", self.cast, self.referenced)
    }
}

/// テストケース1つ分のデコード状態
#[derive(Debug)]
pub struct DecodeContext<'t> {
    table: &'t AddressTable,
    scope: Option<String>,
    method: String,
    references: Vec<InitReference>,
}

impl<'t> DecodeContext<'t> {
    /// 新しいデコード状態を作成する
    pub fn new(table: &'t AddressTable, method: impl Into<String>, scope: Option<String>) -> Self {
        Self {
            table,
            scope,
            method: method.into(),
            references: Vec::new(),
        }
    }

    /// アドレス表
    pub fn table(&self) -> &AddressTable {
        self.table
    }

    /// 記録した参照
    pub fn references(&self) -> &[InitReference] {
        &self.references
    }

    /// 記録した参照を取り出す
    pub fn into_references(self) -> Vec<InitReference> {
        self.references
    }
}

/// 読み取り中のバッファと用途
#[derive(Clone, Copy)]
struct Cursor<'b> {
    bytes: &'b [u8],
    usage: PointerUsage,
    depth: usize,
}

impl<'b> Cursor<'b> {
    fn deeper(&self, max_depth: usize) -> Result<Self> {
        if self.depth + 1 > max_depth {
            return Err(DecodeError::DepthExceeded(max_depth));
        }
        Ok(Self {
            depth: self.depth + 1,
            ..*self
        })
    }
}

fn slice(bytes: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| bytes.get(offset..end))
        .ok_or(DecodeError::OutOfBounds {
            offset,
            len,
            size: bytes.len(),
        })
}

/// リトルエンディアンで最大8バイトを読む
fn read_le(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .take(8)
        .rev()
        .fold(0u64, |acc, b| (acc << 8) | *b as u64)
}

fn sign_extend(raw: u64, bits: usize) -> i64 {
    if bits == 0 || bits >= 64 {
        return raw as i64;
    }
    let shift = 64 - bits;
    ((raw << shift) as i64) >> shift
}

/// 構造体タグを除いた識別子
fn identifier(name: &str) -> &str {
    name.rsplit(' ').next().unwrap_or(name)
}

/// 値デコーダー
pub struct ValueDecoder<'a> {
    oracle: &'a dyn TypeOracle,
    config: DecodeConfig,
}

impl<'a> ValueDecoder<'a> {
    /// 新しい値デコーダーを作成する
    pub fn new(oracle: &'a dyn TypeOracle, config: DecodeConfig) -> Self {
        Self { oracle, config }
    }

    /// 設定
    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    /// 型情報
    pub fn oracle(&self) -> &'a dyn TypeOracle {
        self.oracle
    }

    /// バッファ全体を `ty` としてデコードする
    ///
    /// `name` は参照のアクセスパスと関数ポインタのスタブ名に使われます。
    pub fn decode(
        &self,
        bytes: &[u8],
        ty: &Type,
        usage: PointerUsage,
        name: &str,
        ctx: &mut DecodeContext,
    ) -> Result<ValueView> {
        let cur = Cursor {
            bytes,
            usage,
            depth: 0,
        };
        let length = bytes.len();
        trace!(name, ty = %ty, ?usage, length, "decoding object");

        match self.oracle.kind_of(ty) {
            TypeKind::Primitive => self.primitive_view(bytes, ty, 0),
            TypeKind::Struct => self.struct_view(&cur, ty, 0, name, ctx),
            TypeKind::ObjectPointer => {
                if usage == PointerUsage::Lazy {
                    return self.pointer_view(bytes, ty, 0, name, ctx);
                }
                if ty.is_c_string() {
                    return Ok(ValueView::String {
                        literal: string_literal(bytes, None),
                    });
                }
                if ty.dimension() > 1 {
                    return self.multi_array_view(&cur, ty, 0, length, name, ctx);
                }
                let elem = ty.pointee();
                let length = self.capped_length(&elem, length, usage)?;
                self.array_view(&cur, &elem, 0, length, name, ctx)
            }
            TypeKind::FunctionPointer => Ok(ValueView::FunctionPointer {
                literal: parameter_stub_name(ctx.scope.as_deref(), &ctx.method, name),
            }),
            TypeKind::Enum => self.enum_view(bytes, ty, 0),
            TypeKind::Union => self.union_view(&cur, ty, 0, name, ctx),
            TypeKind::Array => {
                if ty.dimension() > 1 {
                    return self.multi_array_view(&cur, ty, 0, length, name, ctx);
                }
                let elem = ty.pointee();
                let length = self.capped_length(&elem, length, usage)?;
                self.array_view(&cur, &elem, 0, length, name, ctx)
            }
            TypeKind::Unknown => Err(DecodeError::Unsupported(ty.type_name())),
        }
    }

    /// バッファの一部を `ty` としてデコードする
    pub fn decode_range(
        &self,
        bytes: &[u8],
        range: Range<usize>,
        ty: &Type,
        usage: PointerUsage,
        name: &str,
        ctx: &mut DecodeContext,
    ) -> Result<ValueView> {
        let len = range.end.saturating_sub(range.start);
        let bytes = slice(bytes, range.start, len)?;
        self.decode(bytes, ty, usage, name, ctx)
    }

    fn element_size(&self, elem: &Type) -> Result<usize> {
        if elem.is_simple() && elem.base_is_void() {
            return Ok(1);
        }
        Ok(self.oracle.size_of(elem)?)
    }

    fn capped_length(&self, elem: &Type, length: usize, usage: PointerUsage) -> Result<usize> {
        match usage.known_size() {
            Some(n) => Ok(length.min(n.saturating_mul(self.element_size(elem)?))),
            None => Ok(length),
        }
    }

    fn primitive_view(&self, bytes: &[u8], ty: &Type, offset: usize) -> Result<ValueView> {
        let info = ty
            .primitive()
            .ok_or_else(|| DecodeError::Unsupported(ty.type_name()))?;
        let raw = read_le(slice(bytes, offset, info.size)?);
        Ok(ValueView::primitive(format_scalar(
            raw,
            info.size * 8,
            info,
            ty.base_name(),
        )))
    }

    fn bitfield_view(
        &self,
        bytes: &[u8],
        field: &Field,
        info: PrimitiveInfo,
        offset: usize,
    ) -> Result<ValueView> {
        let bits = field.bit_size.unwrap_or(info.size * 8);
        let needed = field.bit_offset.saturating_add(bits).div_ceil(8);
        let word = read_le(slice(bytes, offset, needed)?);
        let raw = u32::try_from(field.bit_offset)
            .ok()
            .and_then(|shift| word.checked_shr(shift))
            .unwrap_or(0);
        let raw = if bits >= 64 { raw } else { raw & ((1u64 << bits) - 1) };
        Ok(ValueView::primitive(format_scalar(
            raw,
            bits,
            info,
            field.ty.base_name(),
        )))
    }

    fn enum_view(&self, bytes: &[u8], ty: &Type, offset: usize) -> Result<ValueView> {
        let info = self.oracle.enum_entries(ty)?;
        let raw = read_le(slice(bytes, offset, info.size)?);
        let value = sign_extend(raw, info.size.saturating_mul(8));
        let literal = match info.qualified_name(value) {
            Some(name) => name,
            None => {
                warn!(enumeration = %info.name, value, "enum value is out of range");
                enum_cast_literal(identifier(&info.name), value)
            }
        };
        Ok(ValueView::Enum { literal })
    }

    fn raw_bytes_view(
        &self,
        cur: &Cursor,
        offset: usize,
        size: usize,
        ctx: &mut DecodeContext,
    ) -> Result<ValueView> {
        let byte_ty = Type::simple(BYTE_TYPE_NAME);
        self.array_view(cur, &byte_ty, offset, size, "", ctx)
    }

    fn union_view(
        &self,
        cur: &Cursor,
        ty: &Type,
        offset: usize,
        access: &str,
        ctx: &mut DecodeContext,
    ) -> Result<ValueView> {
        let cur = cur.deeper(self.config.max_depth)?;
        let record = self.oracle.record_of(ty)?;
        let bytes = self.raw_bytes_view(&cur, offset, record.size, ctx)?;

        let mut members = Vec::with_capacity(record.fields.len());
        for field in &record.fields {
            let view = match self.oracle.kind_of(&field.ty) {
                // どのメンバが有効か分からないのでポインタは辿らない
                TypeKind::ObjectPointer => ValueView::primitive(NULL_LITERAL),
                _ => self.field_view(&cur, record, field, offset, access, ctx)?,
            };
            members.push(FieldView {
                name: field.name.clone(),
                view,
            });
        }

        Ok(ValueView::Union(UnionView {
            name: identifier(&record.name).to_string(),
            bytes: Box::new(bytes),
            members,
        }))
    }

    fn struct_view(
        &self,
        cur: &Cursor,
        ty: &Type,
        offset: usize,
        access: &str,
        ctx: &mut DecodeContext,
    ) -> Result<ValueView> {
        let cur = cur.deeper(self.config.max_depth)?;
        let record = self.oracle.record_of(ty)?;

        let mut fields = Vec::with_capacity(record.fields.len());
        for field in &record.fields {
            let view = self.field_view(&cur, record, field, offset, access, ctx)?;
            fields.push(FieldView {
                name: field.name.clone(),
                view,
            });
        }

        let override_literal = if record.has_anonymous_member {
            let bytes = self.raw_bytes_view(&cur, offset, record.size, ctx)?;
            Some(from_bytes_literal(
                identifier(&record.name),
                &bytes.entry_value(),
            ))
        } else {
            None
        };

        Ok(ValueView::Struct(StructView {
            name: identifier(&record.name).to_string(),
            fields,
            c_like: record.c_like,
            override_literal,
        }))
    }

    fn field_view(
        &self,
        cur: &Cursor,
        record: &RecordInfo,
        field: &Field,
        base: usize,
        access: &str,
        ctx: &mut DecodeContext,
    ) -> Result<ValueView> {
        let offset = base
            .checked_add(field.offset)
            .ok_or(DecodeError::OutOfBounds {
                offset: base,
                len: field.offset,
                size: cur.bytes.len(),
            })?;
        let field_access = if field.is_anonymous() {
            access.to_string()
        } else {
            format!("{}.{}", access, field.name)
        };

        match self.oracle.kind_of(&field.ty) {
            TypeKind::Primitive => {
                let info = field
                    .ty
                    .primitive()
                    .ok_or_else(|| DecodeError::Unsupported(field.ty.type_name()))?;
                if field.is_bitfield(info.size) {
                    self.bitfield_view(cur.bytes, field, info, offset)
                } else {
                    self.primitive_view(cur.bytes, &field.ty, offset)
                }
            }
            TypeKind::Struct => self.struct_view(cur, &field.ty, offset, &field_access, ctx),
            TypeKind::Enum => self.enum_view(cur.bytes, &field.ty, offset),
            TypeKind::Union => self.union_view(cur, &field.ty, offset, &field_access, ctx),
            TypeKind::Array => {
                let size = self.oracle.size_of(&field.ty)?;
                if field.ty.dimension() == 1 {
                    return self.array_view(cur, &field.ty.pointee(), offset, size, &field_access, ctx);
                }
                if field.ty.levels.iter().all(|l| matches!(l, Level::Array(_))) {
                    return self.multi_array_view(cur, &field.ty, offset, size, &field_access, ctx);
                }
                // ポインタを含む入れ子の配列は辿らない
                let count = match field.ty.levels.first() {
                    Some(Level::Array(n)) => *n,
                    _ => 0,
                };
                Ok(ValueView::array(vec![ValueView::primitive(NULL_LITERAL); count]))
            }
            TypeKind::ObjectPointer => {
                self.pointer_view(cur.bytes, &field.ty, offset, &field_access, ctx)
            }
            TypeKind::FunctionPointer => Ok(ValueView::FunctionPointer {
                literal: field_stub_name(identifier(&record.name), &field.name),
            }),
            TypeKind::Unknown => Err(DecodeError::Unsupported(field.ty.type_name())),
        }
    }

    /// 格納されたポインタ値を読み、名前付きオブジェクトなら参照として記録する
    fn pointer_view(
        &self,
        bytes: &[u8],
        ty: &Type,
        offset: usize,
        access: &str,
        ctx: &mut DecodeContext,
    ) -> Result<ValueView> {
        let address = read_le(slice(bytes, offset, self.oracle.pointer_size())?);
        let table = ctx.table;
        if let Some(name) = table.get(address) {
            trace!(variable = access, referenced = name, "pointer refers to named object");
            ctx.references.push(InitReference {
                variable: access.to_string(),
                referenced: name.to_string(),
                cast: reference_cast(&ty.name, ty.dimension()),
            });
            return Ok(ValueView::primitive(NULL_LITERAL));
        }
        Ok(ValueView::primitive(pointer_literal(
            address,
            &ty.name,
            ty.dimension(),
        )))
    }

    fn array_view(
        &self,
        cur: &Cursor,
        elem: &Type,
        offset: usize,
        length: usize,
        access: &str,
        ctx: &mut DecodeContext,
    ) -> Result<ValueView> {
        let elements = self.array_elements(cur, elem, offset, length, access, ctx)?;
        Ok(ValueView::array(elements))
    }

    fn array_elements(
        &self,
        cur: &Cursor,
        elem: &Type,
        offset: usize,
        length: usize,
        access: &str,
        ctx: &mut DecodeContext,
    ) -> Result<Vec<ValueView>> {
        let kind = self.oracle.kind_of(elem);
        match kind {
            TypeKind::ObjectPointer | TypeKind::Array | TypeKind::Unknown => {
                return Err(DecodeError::Unsupported(elem.type_name()));
            }
            _ => {}
        }
        let elem_size = self.element_size(elem)?;
        if elem_size == 0 {
            return Err(DecodeError::Unsupported(elem.type_name()));
        }

        let count = length / elem_size;
        let mut elements = Vec::with_capacity(count);
        for i in 0..count {
            let at = i
                .checked_mul(elem_size)
                .and_then(|step| offset.checked_add(step))
                .ok_or(DecodeError::OutOfBounds {
                    offset,
                    len: length,
                    size: cur.bytes.len(),
                })?;
            let view = match kind {
                TypeKind::Primitive => self.primitive_view(cur.bytes, elem, at)?,
                TypeKind::Struct => {
                    let access = format!("{}[{}]", access, i);
                    self.struct_view(cur, elem, at, &access, ctx)?
                }
                TypeKind::Enum => self.enum_view(cur.bytes, elem, at)?,
                TypeKind::Union => {
                    let access = format!("{}[{}]", access, i);
                    self.union_view(cur, elem, at, &access, ctx)?
                }
                TypeKind::FunctionPointer => ValueView::primitive(NULL_LITERAL),
                TypeKind::ObjectPointer | TypeKind::Array | TypeKind::Unknown => {
                    return Err(DecodeError::Unsupported(elem.type_name()));
                }
            };
            elements.push(view);
        }
        Ok(elements)
    }

    /// 多次元配列
    ///
    /// 平坦に読んだ要素を、内側の次元から順にまとめ直します。
    fn multi_array_view(
        &self,
        cur: &Cursor,
        ty: &Type,
        offset: usize,
        length: usize,
        access: &str,
        ctx: &mut DecodeContext,
    ) -> Result<ValueView> {
        let sizes = ty.arrays_sizes(cur.usage);
        let base = ty.base_type();
        let mut current = self.array_elements(cur, &base, offset, length, access, ctx)?;

        for &size in sizes.iter().skip(1).rev() {
            if size == 0 {
                break;
            }
            let mut grouped = Vec::with_capacity(current.len() / size + 1);
            let mut iter = current.into_iter().peekable();
            while iter.peek().is_some() {
                grouped.push(ValueView::array(iter.by_ref().take(size).collect()));
            }
            current = grouped;
        }
        Ok(ValueView::array(current))
    }
}

/// 読み取った生の値をリテラルにする
fn format_scalar(raw: u64, bits: usize, info: PrimitiveInfo, type_name: &str) -> String {
    match info.class {
        PrimitiveClass::Bool => bool_literal(raw != 0),
        PrimitiveClass::Char => {
            let code = if info.signed {
                sign_extend(raw, bits)
            } else {
                raw as i64
            };
            char_literal(code)
        }
        PrimitiveClass::Byte => sign_extend(raw, bits).to_string(),
        PrimitiveClass::Void => raw.to_string(),
        PrimitiveClass::Integer => {
            if info.signed {
                signed_literal(sign_extend(raw, bits), type_name)
            } else {
                unsigned_literal(raw, type_name)
            }
        }
        PrimitiveClass::Float => {
            if info.size == 4 {
                float_literal(f32::from_bits(raw as u32) as f64, true)
            } else {
                float_literal(f64::from_bits(raw), false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ktdecode_types::{EnumEntry, EnumInfo, RecordKind, TypeRegistry};

    fn decode(registry: &TypeRegistry, bytes: &[u8], ty: &Type) -> Result<ValueView> {
        let table = AddressTable::new();
        let decoder = ValueDecoder::new(registry, DecodeConfig::default());
        let mut ctx = DecodeContext::new(&table, "f", None);
        decoder.decode(bytes, ty, PointerUsage::Parameter, "x", &mut ctx)
    }

    #[test]
    fn test_decode_int() {
        let registry = TypeRegistry::new();
        let view = decode(&registry, &[5, 0, 0, 0], &Type::int()).unwrap();
        assert_eq!(view.entry_value(), "5");

        let view = decode(&registry, &[0xff; 4], &Type::int()).unwrap();
        assert_eq!(view.entry_value(), "-1");

        let view = decode(&registry, &[0xff; 4], &Type::simple("unsigned int")).unwrap();
        assert_eq!(view.entry_value(), "4294967295U");
    }

    #[test]
    fn test_decode_scalars() {
        let registry = TypeRegistry::new();
        assert_eq!(
            decode(&registry, &[2], &Type::simple("bool")).unwrap().entry_value(),
            "true"
        );
        assert_eq!(
            decode(&registry, &[b'z'], &Type::simple("char")).unwrap().entry_value(),
            "'z'"
        );
        assert_eq!(
            decode(&registry, &2.5f64.to_le_bytes(), &Type::simple("double"))
                .unwrap()
                .entry_value(),
            "2.5"
        );
        assert_eq!(
            decode(&registry, &f32::NAN.to_le_bytes(), &Type::simple("float"))
                .unwrap()
                .entry_value(),
            "NAN"
        );
        assert_eq!(
            decode(&registry, &i64::MIN.to_le_bytes(), &Type::simple("long"))
                .unwrap()
                .entry_value(),
            "(-9223372036854775807L - 1)"
        );
        // void は最小のスカラーとして数値で読む
        assert_eq!(
            decode(&registry, &[65], &Type::simple("void")).unwrap().entry_value(),
            "65"
        );
    }

    #[test]
    fn test_short_buffer_is_out_of_bounds() {
        let registry = TypeRegistry::new();
        let err = decode(&registry, &[1, 2], &Type::int()).unwrap_err();
        assert_eq!(
            err,
            DecodeError::OutOfBounds {
                offset: 0,
                len: 4,
                size: 2
            }
        );
    }

    #[test]
    fn test_unknown_type_is_unsupported() {
        let registry = TypeRegistry::new();
        let err = decode(&registry, &[0; 16], &Type::simple("long double")).unwrap_err();
        assert!(matches!(err, DecodeError::Unsupported(_)));
    }

    #[test]
    fn test_scoped_enum() {
        let mut registry = TypeRegistry::new();
        registry.add_enum(EnumInfo {
            name: "Mode".to_string(),
            size: 4,
            entries: vec![EnumEntry {
                name: "FAST".to_string(),
                value: 2,
            }],
            access: Some("Mode".to_string()),
        });
        let view = decode(&registry, &[2, 0, 0, 0], &Type::simple("Mode")).unwrap();
        assert_eq!(view, ValueView::Enum { literal: "Mode::FAST".to_string() });
    }

    fn byte_enum_registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        let entry = |name: &str, value: i64| EnumEntry {
            name: name.to_string(),
            value,
        };
        registry.add_enum(EnumInfo {
            name: "Small".to_string(),
            size: 1,
            entries: vec![entry("NEG", -1), entry("A", 0), entry("B", 1)],
            access: None,
        });
        registry
    }

    #[test]
    fn test_one_byte_enum() {
        let registry = byte_enum_registry();
        let view = decode(&registry, &[1], &Type::simple("Small")).unwrap();
        assert_eq!(view, ValueView::Enum { literal: "B".to_string() });
        // 1バイト幅で符号拡張する
        let view = decode(&registry, &[0xff], &Type::simple("Small")).unwrap();
        assert_eq!(view, ValueView::Enum { literal: "NEG".to_string() });
    }

    #[test]
    fn test_array_of_one_byte_enums() {
        let registry = byte_enum_registry();
        let view = decode(&registry, &[0, 1, 0, 1], &Type::simple("Small").array(4)).unwrap();
        assert_eq!(view.entry_value(), "{A, B, A, B}");
    }

    #[test]
    fn test_field_offset_overflow_is_out_of_bounds() {
        let mut registry = TypeRegistry::new();
        registry.add_record(RecordInfo {
            name: "Wide".to_string(),
            kind: RecordKind::Struct,
            size: 8,
            fields: vec![Field {
                name: "far".to_string(),
                ty: Type::int(),
                offset: usize::MAX - 2,
                bit_size: None,
                bit_offset: 0,
            }],
            c_like: true,
            has_anonymous_member: false,
        });
        let err = decode(&registry, &[0; 16], &Type::simple("Wide").array(2)).unwrap_err();
        assert!(matches!(err, DecodeError::OutOfBounds { .. }));
    }

    #[test]
    fn test_bitfields() {
        let mut registry = TypeRegistry::new();
        registry.add_record(RecordInfo {
            name: "Flags".to_string(),
            kind: RecordKind::Struct,
            size: 4,
            fields: vec![
                Field {
                    name: "lo".to_string(),
                    ty: Type::simple("unsigned int"),
                    offset: 0,
                    bit_size: Some(3),
                    bit_offset: 0,
                },
                Field {
                    name: "hi".to_string(),
                    ty: Type::int(),
                    offset: 0,
                    bit_size: Some(4),
                    bit_offset: 3,
                },
            ],
            c_like: true,
            has_anonymous_member: false,
        });
        // lo = 0b101, hi = 0b1111 (-1)
        let view = decode(&registry, &[0b0111_1101, 0, 0, 0], &Type::simple("Flags")).unwrap();
        assert_eq!(view.entry_value(), "{.lo = 5U, .hi = -1}");
    }

    #[test]
    fn test_function_pointer_stub_name() {
        let registry = TypeRegistry::new();
        let table = AddressTable::new();
        let decoder = ValueDecoder::new(&registry, DecodeConfig::default());
        let mut ctx = DecodeContext::new(&table, "apply", Some("Calc".to_string()));
        let view = decoder
            .decode(
                &[],
                &Type::function_pointer("int (*)(int)"),
                PointerUsage::Parameter,
                "op",
                &mut ctx,
            )
            .unwrap();
        assert_eq!(view.entry_value(), "Calc_apply_op_stub");
    }

    #[test]
    fn test_known_size_caps_elements() {
        let registry = TypeRegistry::new();
        let table = AddressTable::new();
        let decoder = ValueDecoder::new(&registry, DecodeConfig::default());
        let mut ctx = DecodeContext::new(&table, "f", None);
        let ty = Type::int().pointer().with_maybe_array();
        let bytes: Vec<u8> = [1i32, 2, 3, 4].iter().flat_map(|v| v.to_le_bytes()).collect();
        let view = decoder
            .decode(&bytes, &ty, PointerUsage::KnownSize(2), "p", &mut ctx)
            .unwrap();
        assert_eq!(view.entry_value(), "{1, 2}");

        let view = decoder
            .decode(&bytes, &ty, PointerUsage::Parameter, "p", &mut ctx)
            .unwrap();
        assert_eq!(view.entry_value(), "{1, 2, 3, 4}");
    }

    #[test]
    fn test_decode_range() {
        let registry = TypeRegistry::new();
        let table = AddressTable::new();
        let decoder = ValueDecoder::new(&registry, DecodeConfig::default());
        let mut ctx = DecodeContext::new(&table, "f", None);
        let view = decoder
            .decode_range(&[9, 9, 7, 0, 0, 0], 2..6, &Type::int(), PointerUsage::Parameter, "x", &mut ctx)
            .unwrap();
        assert_eq!(view.entry_value(), "7");
    }
}
