//! ktdecode コア
//!
//! シンボリック実行エンジンが出力したテストベクタ（名前付きバイト列と
//! オブジェクト間のポインタ表）を、型情報に基づいて C/C++ のリテラルを持つ
//! 値ビューの木にデコードします。

pub mod errors;
pub mod ktest;
pub mod literal;
pub mod view;
pub mod decode;
pub mod graph;
pub mod predicate;
pub mod assemble;

pub use errors::DecodeError;
pub use ktest::{ConcretizedObject, PointerOffset, Status, TestVector};
pub use view::{FieldView, StructView, UnionView, ValueView};
pub use decode::{DecodeConfig, DecodeContext, InitReference, ValueDecoder};
pub use graph::{resolve_lazy_objects, AddressTable, Edge, LazyDeclaration, ObjectGraph, Root};
pub use predicate::{matches, CompareOp, Predicate, ValidationType};
pub use assemble::{
    Assembler, CaseFilters, DecodedTestCase, MethodDescription, MethodParam, ParamValue,
    PredicateFilter, Suite,
};

/// デコードの結果型
pub type Result<T> = std::result::Result<T, DecodeError>;
