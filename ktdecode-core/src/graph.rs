//! 遅延オブジェクトのグラフ
//!
//! テストベクタのオブジェクトをアリーナの番号で扱い、ポインタ表から
//! `(持ち主, オフセット) -> 参照先` の辺を作ります。宣言された引数と戻り値を
//! 根として幅優先で辿り、記号に対応しないオブジェクトに名前と型を与えます。

use crate::decode::{DecodeContext, ValueDecoder};
use crate::ktest::{TestVector, LAZY_NAME_PREFIX};
use crate::view::ValueView;
use crate::{DecodeError, Result};
use ktdecode_types::{field_owning, Level, PointerUsage, Type, TypeKind, TypeOracle};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, trace, warn};

/// アドレスから名前への表
///
/// テストケースごとに一度だけ作り、以降は読み取り専用です。
#[derive(Debug, Clone, Default)]
pub struct AddressTable {
    names: HashMap<u64, String>,
}

impl AddressTable {
    /// 空の表を作成する
    pub fn new() -> Self {
        Self::default()
    }

    /// 名前を登録する（NULL は登録しない、先に登録された名前を優先する）
    pub fn insert(&mut self, address: u64, name: impl Into<String>) {
        if address == 0 {
            return;
        }
        self.names.entry(address).or_insert_with(|| name.into());
    }

    /// アドレスの名前
    pub fn get(&self, address: u64) -> Option<&str> {
        self.names.get(&address).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// ポインタの辺
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// ポインタを持つオブジェクト
    pub owner: usize,
    /// 持ち主の中のバイトオフセット
    pub offset: usize,
    /// 参照先のオブジェクト
    pub target: usize,
}

/// テストケースのオブジェクトグラフ
#[derive(Debug, Clone)]
pub struct ObjectGraph {
    names: Vec<String>,
    edges: Vec<Edge>,
    table: AddressTable,
}

impl ObjectGraph {
    /// テストベクタからグラフとアドレス表を作る
    ///
    /// 宣言されたオブジェクトは自分のアドレスで登録します。遅延オブジェクトは
    /// 最初に参照された順に `utbotInnerVar{n}` と名付け、参照元に格納された
    /// ポインタ値で登録します。
    pub fn build(vector: &TestVector, pointer_size: usize) -> Result<Self> {
        let mut names: Vec<String> = vector.objects.iter().map(|o| o.name.clone()).collect();
        let mut named = vec![false; names.len()];
        let mut table = AddressTable::new();

        for (idx, object) in vector.objects.iter().enumerate() {
            if !object.is_lazy() {
                table.insert(object.address, object.name.as_str());
                named[idx] = true;
            }
        }

        let mut edges = Vec::new();
        let mut counter = 0usize;
        for (owner, object) in vector.objects.iter().enumerate() {
            for pointer in &object.offsets {
                let target = pointer.index;
                if target >= names.len() {
                    return Err(DecodeError::Malformed(format!(
                        "object {} points to missing object {}",
                        object.name, target
                    )));
                }
                edges.push(Edge {
                    owner,
                    offset: pointer.offset,
                    target,
                });
                if named[target] {
                    continue;
                }
                counter += 1;
                names[target] = format!("{}{}", LAZY_NAME_PREFIX, counter);
                named[target] = true;

                let raw = pointer
                    .offset
                    .checked_add(pointer_size)
                    .and_then(|end| object.bytes.get(pointer.offset..end));
                let address = match raw {
                    Some(raw) => raw
                        .iter()
                        .rev()
                        .fold(0u64, |acc, b| (acc << 8) | *b as u64),
                    None => {
                        return Err(DecodeError::OutOfBounds {
                            offset: pointer.offset,
                            len: pointer_size,
                            size: object.bytes.len(),
                        })
                    }
                };
                table.insert(address, names[target].clone());
                table.insert(vector.objects[target].address, names[target].clone());
            }
        }

        debug!(
            objects = names.len(),
            edges = edges.len(),
            generated = counter,
            "built object graph"
        );
        Ok(Self {
            names,
            edges,
            table,
        })
    }

    /// オブジェクトの名前（遅延オブジェクトは生成された名前）
    pub fn name(&self, idx: usize) -> &str {
        self.names.get(idx).map(String::as_str).unwrap_or("")
    }

    /// アドレス表
    pub fn table(&self) -> &AddressTable {
        &self.table
    }

    /// 全ての辺
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// `owner` から出る辺
    pub fn edges_from(&self, owner: usize) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.owner == owner)
    }
}

/// 幅優先探索の根
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Root {
    /// オブジェクト名
    pub name: String,
    /// 宣言された型
    pub ty: Type,
}

impl Root {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// 独立した宣言として出力する遅延オブジェクト
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LazyDeclaration {
    /// 生成された名前
    pub name: String,
    /// 型
    #[serde(rename = "type")]
    pub ty: Type,
    pub view: ValueView,
    /// 辿り着いた根の名前
    pub root: String,
}

/// 根から到達できる遅延オブジェクトを幅優先で型付けし、デコードする
///
/// 結果の順序はそのまま宣言順として使えます。
pub fn resolve_lazy_objects(
    vector: &TestVector,
    graph: &ObjectGraph,
    roots: &[Root],
    decoder: &ValueDecoder,
    ctx: &mut DecodeContext,
) -> Result<Vec<LazyDeclaration>> {
    let oracle = decoder.oracle();
    let mut visited = vec![false; vector.objects.len()];
    let mut queue: VecDeque<(usize, Type, usize)> = VecDeque::new();

    for (root_idx, root) in roots.iter().enumerate() {
        let Some((idx, _)) = vector.find(&root.name) else {
            warn!(root = %root.name, "root object is missing from test case");
            continue;
        };
        if visited[idx] {
            continue;
        }
        let ty = if root.ty.is_object_pointer() {
            root.ty.base_type()
        } else {
            root.ty.clone()
        };
        visited[idx] = true;
        queue.push_back((idx, ty, root_idx));
    }

    let mut declarations = Vec::new();
    while let Some((idx, ty, root_idx)) = queue.pop_front() {
        let object = &vector.objects[idx];
        if object.is_lazy() {
            if ty.base_is_void() {
                return Err(DecodeError::Unsupported(format!(
                    "lazy object {} of type {}",
                    graph.name(idx),
                    ty
                )));
            }
            let name = graph.name(idx).to_string();
            let view = decoder.decode(&object.bytes, &ty, PointerUsage::Lazy, &name, ctx)?;
            trace!(name = %name, ty = %ty, literal = %view, "decoded lazy object");
            declarations.push(LazyDeclaration {
                name,
                ty: ty.clone(),
                view,
                root: roots[root_idx].name.clone(),
            });
        }

        for edge in graph.edges_from(idx) {
            if visited[edge.target] {
                continue;
            }
            let target_ty = pointee_at(oracle, &ty, edge.offset)?;
            visited[edge.target] = true;
            queue.push_back((edge.target, target_ty, root_idx));
        }
    }

    debug!(count = declarations.len(), "resolved lazy objects");
    Ok(declarations)
}

/// `ty` のオブジェクトの `offset` に格納されたポインタが指す型
fn pointee_at(oracle: &dyn TypeOracle, ty: &Type, offset: usize) -> Result<Type> {
    match oracle.kind_of(ty) {
        TypeKind::Struct => {
            let size = oracle.size_of(ty)?;
            // 構造体の配列を持つバッファでは要素内のオフセットに直す
            let rebased = if size > 0 { offset % size } else { offset };
            let field_ty = field_owning(oracle, ty, rebased)?;
            pointer_target(oracle, &field_ty).ok_or_else(|| {
                DecodeError::Malformed(format!(
                    "offset {} in {} does not hold a pointer",
                    offset, ty
                ))
            })
        }
        TypeKind::ObjectPointer => Ok(ty.pointee()),
        TypeKind::Primitive => Ok(ty.clone()),
        _ => Err(DecodeError::Malformed(format!(
            "offset {} in {} cannot hold a pointer",
            offset, ty
        ))),
    }
}

/// ポインタ（またはポインタの配列）のフィールドが指す型
fn pointer_target(oracle: &dyn TypeOracle, field_ty: &Type) -> Option<Type> {
    match oracle.kind_of(field_ty) {
        TypeKind::ObjectPointer => Some(field_ty.pointee()),
        TypeKind::Primitive => Some(field_ty.clone()),
        TypeKind::Array => {
            let arrays = field_ty
                .levels
                .iter()
                .take_while(|l| matches!(l, Level::Array(_)))
                .count();
            let elem = field_ty.base_type_at(arrays);
            if elem.is_object_pointer() {
                Some(elem.pointee())
            } else {
                None
            }
        }
        _ => None,
    }
}
