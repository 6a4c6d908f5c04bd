//! ktdecode 型情報
//!
//! このクレートは、KTestデコーダが参照する型情報（Type Oracle）を提供します。
//! 型記述子、プリミティブ型の表、構造体・共用体・列挙型のレイアウト、
//! バイトオフセットから構造体フィールドを特定するナビゲータを含みます。

pub mod errors;
pub mod primitive;
pub mod type_info;
pub mod registry;
pub mod navigator;

pub use errors::TypeError;
pub use primitive::{PrimitiveClass, PrimitiveInfo};
pub use type_info::{Level, PointerUsage, Type, TypeKind};
pub use registry::{EnumEntry, EnumInfo, Field, RecordInfo, RecordKind, TypeOracle, TypeRegistry};
pub use navigator::field_owning;

/// 型情報の結果型
pub type Result<T> = std::result::Result<T, TypeError>;
