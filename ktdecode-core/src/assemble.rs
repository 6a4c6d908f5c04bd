//! テストケースの組み立て
//!
//! テストベクタごとに、引数・呼び出し後の値・グローバル変数・スタブ・標準入力・
//! 戻り値をデコードし、絞り込みを適用して1つのテストケースにまとめます。

use crate::decode::{DecodeConfig, DecodeContext, InitReference, ValueDecoder};
use crate::graph::{resolve_lazy_objects, LazyDeclaration, ObjectGraph, Root};
use crate::ktest::{
    Status, TestVector, NOT_NULL_VARIABLE_NAME, PATH_FLAG_VARIABLE_NAME, POST_VALUE_SUFFIX,
    RESULT_VARIABLE_NAME, STDIN_OBJECT_NAME, STDIN_READ_OBJECT_NAME, STDIN_VARIABLE_NAME,
    SYMBOLIC_SUFFIX,
};
use crate::literal::{string_literal, NULL_LITERAL};
use crate::predicate::{Predicate, ValidationType};
use crate::view::ValueView;
use crate::{DecodeError, Result};
use ktdecode_types::{PointerUsage, Type, TypeOracle};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, trace, warn};

fn void_type() -> Type {
    Type::simple("void")
}

/// 関数の引数（またはグローバル変数、レシーバ）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodParam {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
    /// `alignas` の指定
    #[serde(default)]
    pub alignment: Option<usize>,
}

impl MethodParam {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            alignment: None,
        }
    }

    /// 呼び出しで書き換えられうる引数か（const でないオブジェクトへのポインタ）
    pub fn is_changeable(&self) -> bool {
        self.ty.is_object_pointer() && !self.ty.is_const() && !self.ty.function
    }

    fn is_function_pointer(&self) -> bool {
        self.ty.is_function_pointer() || self.ty.is_array_of_function_pointers()
    }

    /// デコードに使う型（単一オブジェクトへのポインタは指す先の型）
    fn decode_type(&self) -> Type {
        if self.ty.maybe_just_pointer() {
            self.ty.base_type()
        } else {
            self.ty.clone()
        }
    }
}

/// テスト対象の関数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescription {
    pub name: String,
    /// クラス名（メンバ関数の場合）
    #[serde(default)]
    pub scope: Option<String>,
    /// レシーバ（`this` が指すオブジェクト）
    #[serde(default)]
    pub class_object: Option<MethodParam>,
    #[serde(default)]
    pub params: Vec<MethodParam>,
    #[serde(default = "void_type")]
    pub return_type: Type,
    #[serde(default)]
    pub globals: Vec<MethodParam>,
    /// スタブ関数名から戻り値の型
    #[serde(default)]
    pub stubs: HashMap<String, Type>,
    /// 関数ポインタ引数名から、その関数の戻り値の型
    #[serde(default)]
    pub function_pointers: HashMap<String, Type>,
    /// 標準入力をシンボリックにしたか
    #[serde(default)]
    pub symbolic_stdin: bool,
}

impl MethodDescription {
    pub fn new(name: impl Into<String>, return_type: Type) -> Self {
        Self {
            name: name.into(),
            scope: None,
            class_object: None,
            params: Vec::new(),
            return_type,
            globals: Vec::new(),
            stubs: HashMap::new(),
            function_pointers: HashMap::new(),
            symbolic_stdin: false,
        }
    }
}

/// 戻り値の述語（未検証）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateFilter {
    /// `==`, `!=`, `<`, `>`, `<=`, `>=`
    pub op: String,
    pub expected: String,
    /// `int32_t`, `char`, `string` など
    pub validation: String,
}

/// テストケースの絞り込み
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseFilters {
    /// パスフラグが立ったケースだけを残す
    pub path_flag: bool,
    /// アサーション用のテストとして出力する
    pub for_assert: bool,
    pub predicate: Option<PredicateFilter>,
}

/// テストスイート
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suite {
    Regression,
    Error,
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Suite::Regression => write!(f, "regression"),
            Suite::Error => write!(f, "error"),
        }
    }
}

/// デコードした名前付きの値
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamValue {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<usize>,
    pub view: ValueView,
}

/// デコード済みのテストケース
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedTestCase {
    /// 出力したテストケースの通し番号
    pub index: usize,
    pub suite: Suite,
    pub params: Vec<ParamValue>,
    pub param_post_values: Vec<ParamValue>,
    pub globals_pre: Vec<ParamValue>,
    pub globals_post: Vec<ParamValue>,
    pub class_pre: Option<ParamValue>,
    pub class_post: Option<ParamValue>,
    pub return_value: ParamValue,
    /// スタブの戻り値
    pub stubs: Vec<ParamValue>,
    /// 関数ポインタ引数のスタブの戻り値
    pub stub_params: Vec<ParamValue>,
    pub stdin: Option<ParamValue>,
    pub references: Vec<InitReference>,
    /// 引数より前に宣言する遅延オブジェクト
    pub lazy: Vec<LazyDeclaration>,
    pub error_descriptors: Vec<String>,
}

impl DecodedTestCase {
    /// 名前で引数を引く
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// 名前のオブジェクトがあればデコードする
fn decode_named(
    decoder: &ValueDecoder,
    vector: &TestVector,
    name: &str,
    ty: &Type,
    alignment: Option<usize>,
    usage: PointerUsage,
    ctx: &mut DecodeContext,
) -> Result<Option<ParamValue>> {
    let Some(object) = vector.get(name) else {
        return Ok(None);
    };
    let view = decoder.decode(&object.bytes, ty, usage, name, ctx)?;
    Ok(Some(ParamValue {
        name: name.to_string(),
        ty: ty.clone(),
        alignment,
        view,
    }))
}

/// 必ず記録されているはずのオブジェクトをデコードする
fn required(
    decoder: &ValueDecoder,
    vector: &TestVector,
    name: &str,
    ty: &Type,
    alignment: Option<usize>,
    ctx: &mut DecodeContext,
) -> Result<ParamValue> {
    decode_named(decoder, vector, name, ty, alignment, PointerUsage::Parameter, ctx)?
        .ok_or_else(|| DecodeError::MissingObject(name.to_string()))
}

fn post_name(name: &str) -> String {
    format!("{}{}", name, POST_VALUE_SUFFIX)
}

/// テストケースの組み立て器
pub struct Assembler<'a> {
    oracle: &'a dyn TypeOracle,
    config: DecodeConfig,
}

impl<'a> Assembler<'a> {
    /// 新しい組み立て器を作成する
    pub fn new(oracle: &'a dyn TypeOracle, config: DecodeConfig) -> Self {
        Self { oracle, config }
    }

    /// テストベクタをテストケースにする
    ///
    /// 1つのテストケースに閉じたエラーはそのケースを捨てて続行し、
    /// 設定エラーだけを呼び出し元に返します。
    pub fn assemble(
        &self,
        vectors: &[TestVector],
        method: &MethodDescription,
        filters: &CaseFilters,
    ) -> Result<Vec<DecodedTestCase>> {
        let predicate = filters
            .predicate
            .as_ref()
            .map(|p| Predicate::new(&p.op, &p.expected, &p.validation))
            .transpose()?;
        let return_type = match &predicate {
            Some(p) if p.validation() == ValidationType::String => Type::c_string(),
            _ => method.return_type.clone(),
        };
        debug!(method = %method.name, vectors = vectors.len(), "assembling test cases");

        let mut cases = Vec::new();
        for (i, vector) in vectors.iter().enumerate() {
            match self.assemble_case(vector, method, &return_type, filters, predicate.as_ref()) {
                Ok(Some(mut case)) => {
                    case.index = cases.len();
                    trace!(
                        method = %method.name,
                        index = case.index,
                        suite = %case.suite,
                        params = case.params.len(),
                        lazy = case.lazy.len(),
                        "decoded test case"
                    );
                    cases.push(case);
                }
                Ok(None) => {
                    trace!(method = %method.name, vector = i, "test case filtered out");
                }
                Err(e) if e.is_case_local() => {
                    warn!(method = %method.name, vector = i, error = %e, "skipping test case");
                }
                Err(e) => return Err(e),
            }
        }

        debug!(method = %method.name, cases = cases.len(), "assembled test cases");
        Ok(cases)
    }

    fn assemble_case(
        &self,
        vector: &TestVector,
        method: &MethodDescription,
        return_type: &Type,
        filters: &CaseFilters,
        predicate: Option<&Predicate>,
    ) -> Result<Option<DecodedTestCase>> {
        let objects = vector.objects.len();
        let no_return = return_type.skip_in_return();
        if !((no_return && objects > 0) || (!no_return && objects > 1) || method.params.is_empty())
        {
            debug!(method = %method.name, objects, "test case carries no values");
            return Ok(None);
        }

        let graph = ObjectGraph::build(vector, self.oracle.pointer_size())?;
        let decoder = ValueDecoder::new(self.oracle, self.config.clone());
        let mut ctx = DecodeContext::new(graph.table(), method.name.clone(), method.scope.clone());

        let (class_pre, class_post) = match &method.class_object {
            Some(this) => {
                let ty = this.decode_type();
                let pre = required(&decoder, vector, &this.name, &ty, this.alignment, &mut ctx)?;
                let post = decode_named(
                    &decoder,
                    vector,
                    &post_name(&this.name),
                    &ty,
                    this.alignment,
                    PointerUsage::Parameter,
                    &mut ctx,
                )?;
                (Some(pre), post)
            }
            None => (None, None),
        };

        let mut params = Vec::with_capacity(method.params.len());
        let mut param_post_values = Vec::new();
        for param in &method.params {
            if param.is_function_pointer() {
                let ty = param.ty.base_type();
                let view =
                    decoder.decode(&[], &ty, PointerUsage::Parameter, &param.name, &mut ctx)?;
                params.push(ParamValue {
                    name: param.name.clone(),
                    ty: param.ty.clone(),
                    alignment: param.alignment,
                    view,
                });
                continue;
            }
            let ty = param.decode_type();
            params.push(required(
                &decoder,
                vector,
                &param.name,
                &ty,
                param.alignment,
                &mut ctx,
            )?);

            if param.is_changeable() {
                // 呼び出し後の値は無くてもよい
                let post = post_name(&param.name);
                match decode_named(
                    &decoder,
                    vector,
                    &post,
                    &ty,
                    param.alignment,
                    PointerUsage::Parameter,
                    &mut ctx,
                )? {
                    Some(value) => param_post_values.push(value),
                    None => trace!(param = %param.name, "no post value recorded"),
                }
            }
        }

        let mut globals_pre = Vec::new();
        let mut globals_post = Vec::new();
        for global in &method.globals {
            globals_pre.push(required(
                &decoder,
                vector,
                &global.name,
                &global.ty,
                global.alignment,
                &mut ctx,
            )?);
            let post_ty = global.ty.type_to_check();
            globals_post.push(required(
                &decoder,
                vector,
                &post_name(&global.name),
                &post_ty,
                global.alignment,
                &mut ctx,
            )?);
        }

        let stdin = if method.symbolic_stdin {
            self.decode_stdin(&decoder, vector, &mut ctx)?
        } else {
            None
        };

        let mut stubs = Vec::new();
        for object in &vector.objects {
            let Some(stub) = object.name.strip_suffix(SYMBOLIC_SUFFIX) else {
                continue;
            };
            if method
                .params
                .iter()
                .any(|p| p.name == stub && p.is_function_pointer())
            {
                continue;
            }
            match method.stubs.get(stub) {
                Some(ret) => {
                    let ty = ret.type_to_check();
                    let view = decoder.decode(
                        &object.bytes,
                        &ty,
                        PointerUsage::Parameter,
                        &object.name,
                        &mut ctx,
                    )?;
                    stubs.push(ParamValue {
                        name: object.name.clone(),
                        ty,
                        alignment: None,
                        view,
                    });
                }
                None => warn!(
                    method = %method.name,
                    stub,
                    "symbolic object does not belong to a known stub"
                ),
            }
        }

        let mut return_value = if return_type.skip_in_return() {
            ParamValue {
                name: RESULT_VARIABLE_NAME.to_string(),
                ty: return_type.clone(),
                alignment: None,
                view: ValueView::Void,
            }
        } else {
            let ty = if return_type.maybe_return_array() {
                return_type.clone()
            } else {
                return_type.type_to_check()
            };
            decode_named(
                &decoder,
                vector,
                RESULT_VARIABLE_NAME,
                &ty,
                None,
                PointerUsage::Return,
                &mut ctx,
            )?
            .ok_or_else(|| DecodeError::MissingObject(RESULT_VARIABLE_NAME.to_string()))?
        };

        let int = Type::int();
        let path_flag = decode_named(
            &decoder,
            vector,
            PATH_FLAG_VARIABLE_NAME,
            &int,
            None,
            PointerUsage::Parameter,
            &mut ctx,
        )?;
        let not_null = decode_named(
            &decoder,
            vector,
            NOT_NULL_VARIABLE_NAME,
            &int,
            None,
            PointerUsage::Parameter,
            &mut ctx,
        )?;

        if filters.path_flag {
            let reached = path_flag
                .as_ref()
                .map(|flag| flag.view.entry_value() == "1")
                .unwrap_or(false);
            if !reached {
                return Ok(None);
            }
        }

        if let Some(predicate) = predicate {
            if !predicate.matches(&return_value.view.entry_value())? {
                return Ok(None);
            }
            if predicate.validation() != ValidationType::String {
                return_value.view = ValueView::primitive(predicate.wrapped_expected());
            }
        }

        let proven_null = not_null
            .as_ref()
            .map(|v| v.view.entry_value() == "0")
            .unwrap_or(false);
        if proven_null && return_type.is_object_pointer() && !return_type.maybe_return_array() {
            return_value.view = ValueView::primitive(NULL_LITERAL);
        }

        let mut roots: Vec<Root> = method
            .params
            .iter()
            .filter(|p| !p.is_function_pointer())
            .map(|p| Root::new(p.name.clone(), p.ty.clone()))
            .collect();
        if !return_type.skip_in_return() {
            roots.push(Root::new(RESULT_VARIABLE_NAME, return_type.clone()));
        }
        let lazy = resolve_lazy_objects(vector, &graph, &roots, &decoder, &mut ctx)?;

        let mut stub_params = Vec::new();
        for param in method.params.iter().filter(|p| p.is_function_pointer()) {
            let Some(ret) = method.function_pointers.get(&param.name) else {
                debug!(param = %param.name, "function pointer return type is unknown");
                continue;
            };
            let name = format!("{}{}", param.name, SYMBOLIC_SUFFIX);
            let ty = ret.create_array();
            if let Some(value) = decode_named(
                &decoder,
                vector,
                &name,
                &ty,
                None,
                PointerUsage::Parameter,
                &mut ctx,
            )? {
                stub_params.push(value);
            }
        }

        let suite = if vector.status == Status::Failed || filters.for_assert {
            Suite::Error
        } else {
            Suite::Regression
        };

        Ok(Some(DecodedTestCase {
            index: 0,
            suite,
            params,
            param_post_values,
            globals_pre,
            globals_post,
            class_pre,
            class_post,
            return_value,
            stubs,
            stub_params,
            stdin,
            references: ctx.into_references(),
            lazy,
            error_descriptors: vector.error_descriptors.clone(),
        }))
    }

    /// シンボリック標準入力を文字列リテラルにする
    fn decode_stdin(
        &self,
        decoder: &ValueDecoder,
        vector: &TestVector,
        ctx: &mut DecodeContext,
    ) -> Result<Option<ParamValue>> {
        let count_ty = Type::long_long();
        let Some(read) = decode_named(
            decoder,
            vector,
            STDIN_READ_OBJECT_NAME,
            &count_ty,
            None,
            PointerUsage::Parameter,
            ctx,
        )? else {
            return Ok(None);
        };
        let literal = read.view.entry_value();
        let count: i64 = literal
            .trim_end_matches("LL")
            .parse()
            .map_err(|_| DecodeError::Malformed(format!("stdin read count {}", literal)))?;
        if count == 0 {
            return Ok(None);
        }
        let capacity = self.config.symbolic_stdin_size;
        if count < 0 || count as usize > capacity {
            return Err(DecodeError::StdinBudget {
                read: count,
                capacity,
            });
        }

        let count = count as usize;
        let buffer = vector
            .get(STDIN_OBJECT_NAME)
            .ok_or_else(|| DecodeError::MissingObject(STDIN_OBJECT_NAME.to_string()))?;
        if count > buffer.bytes.len() {
            return Err(DecodeError::OutOfBounds {
                offset: 0,
                len: count,
                size: buffer.bytes.len(),
            });
        }
        Ok(Some(ParamValue {
            name: STDIN_VARIABLE_NAME.to_string(),
            ty: Type::simple("char").array(capacity),
            alignment: None,
            view: ValueView::String {
                literal: string_literal(&buffer.bytes, Some(count)),
            },
        }))
    }
}
