//! オフセットから構造体フィールドを特定する
//!
//! ポインタ値がどのフィールドに格納されているかは、オブジェクト内の
//! バイトオフセットでしか分からないため、そこから型を逆引きします。

use crate::registry::TypeOracle;
use crate::type_info::{Type, TypeKind};
use crate::{Result, TypeError};
use tracing::trace;

/// `offset` を含むフィールドの型を返す
///
/// フィールドが構造体ならオフセットを差し引いて再帰します。
/// ポインタ型のフィールドでは再帰しないため、自己参照構造体でも停止します。
pub fn field_owning(oracle: &dyn TypeOracle, ty: &Type, offset: usize) -> Result<Type> {
    field_owning_inner(oracle, ty, offset, 0)
}

fn field_owning_inner(
    oracle: &dyn TypeOracle,
    ty: &Type,
    offset: usize,
    depth: usize,
) -> Result<Type> {
    let limit = oracle.max_nesting_depth();
    if depth >= limit {
        return Err(TypeError::DepthExceeded(limit));
    }

    let record = oracle.record_of(ty)?;
    let wrong_offset = || TypeError::WrongOffset {
        type_name: ty.type_name(),
        offset,
    };
    if record.size > 0 && offset >= record.size {
        return Err(wrong_offset());
    }

    let fields = record.fields_by_offset();
    // offset 以下で最後のフィールド
    let idx = fields.partition_point(|f| f.offset <= offset);
    if idx == 0 {
        return Err(wrong_offset());
    }
    let field = fields[idx - 1];
    trace!(
        record = %record.name,
        field = %field.name,
        offset,
        "resolved field owning offset"
    );

    match oracle.kind_of(&field.ty) {
        TypeKind::Struct => field_owning_inner(oracle, &field.ty, offset - field.offset, depth + 1),
        _ => Ok(field.ty.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Field, RecordInfo, RecordKind, TypeRegistry};

    fn field(name: &str, ty: Type, offset: usize) -> Field {
        Field {
            name: name.to_string(),
            ty,
            offset,
            bit_size: None,
            bit_offset: 0,
        }
    }

    #[test]
    fn test_offset_before_first_field() {
        let mut registry = TypeRegistry::new();
        registry.add_record(RecordInfo {
            name: "Padded".to_string(),
            kind: RecordKind::Struct,
            size: 8,
            fields: vec![field("v", Type::int(), 4)],
            c_like: true,
            has_anonymous_member: false,
        });
        let err = field_owning(&registry, &Type::simple("Padded"), 2).unwrap_err();
        assert_eq!(
            err,
            TypeError::WrongOffset {
                type_name: "Padded".to_string(),
                offset: 2
            }
        );
    }

    #[test]
    fn test_cyclic_by_value_is_bounded() {
        // 壊れた型情報（値として自分自身を含む構造体）
        let mut registry = TypeRegistry::new();
        registry.add_record(RecordInfo {
            name: "Loop".to_string(),
            kind: RecordKind::Struct,
            size: 0,
            fields: vec![field("inner", Type::simple("Loop"), 0)],
            c_like: true,
            has_anonymous_member: false,
        });
        let err = field_owning(&registry, &Type::simple("Loop"), 0).unwrap_err();
        assert!(matches!(err, TypeError::DepthExceeded(_)));
    }
}
