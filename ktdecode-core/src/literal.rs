//! C/C++ リテラルの整形
//!
//! デコードしたスカラー値を、テストコードにそのまま埋め込めるリテラル文字列に変換します。

/// NULL ポインタのリテラル
pub const NULL_LITERAL: &str = "NULL";

/// 整数リテラルのサフィックス
///
/// 宣言された型名で決まります（`long` は `L`、`unsigned int` は `U` など）。
pub fn integer_suffix(type_name: &str) -> &'static str {
    match type_name {
        "long" | "long int" | "int64_t" | "ssize_t" | "intptr_t" => "L",
        "long long" | "long long int" => "LL",
        "unsigned int" | "unsigned" | "uint32_t" => "U",
        "unsigned long" | "unsigned long int" | "uint64_t" | "size_t" | "uintptr_t"
        | "std::uintptr_t" => "UL",
        "unsigned long long" | "unsigned long long int" => "ULL",
        _ => "",
    }
}

/// 符号付き整数のリテラル
pub fn signed_literal(value: i64, type_name: &str) -> String {
    let suffix = integer_suffix(type_name);
    // -9223372036854775808L は正の定数の符号反転として解釈され、表現できない
    if value == i64::MIN && !suffix.is_empty() {
        return format!("(-9223372036854775807{} - 1)", suffix);
    }
    format!("{}{}", value, suffix)
}

/// 符号なし整数のリテラル
pub fn unsigned_literal(value: u64, type_name: &str) -> String {
    format!("{}{}", value, integer_suffix(type_name))
}

/// 浮動小数点のリテラル
///
/// NaN と無限大は `<math.h>` のマクロ名で表します。
pub fn float_literal(value: f64, single: bool) -> String {
    if value.is_nan() {
        return if value.is_sign_negative() { "-NAN" } else { "NAN" }.to_string();
    }
    if value.is_infinite() {
        return if value.is_sign_negative() { "-INFINITY" } else { "INFINITY" }.to_string();
    }
    if single {
        format!("{:?}", value as f32)
    } else {
        format!("{:?}", value)
    }
}

/// NaN/無限大のリテラルかどうか
pub fn is_fp_special_literal(literal: &str) -> bool {
    matches!(literal, "NAN" | "-NAN" | "INFINITY" | "-INFINITY")
}

/// 真偽値のリテラル
pub fn bool_literal(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

fn escape_sequence(code: u8) -> Option<&'static str> {
    let escaped = match code {
        0x07 => "\\a",
        0x08 => "\\b",
        b'\t' => "\\t",
        b'\n' => "\\n",
        0x0b => "\\v",
        0x0c => "\\f",
        b'\r' => "\\r",
        b'"' => "\\\"",
        b'\'' => "\\'",
        b'\\' => "\\\\",
        _ => return None,
    };
    Some(escaped)
}

/// そのまま書ける文字か（エスケープ対象は除く）
pub fn is_printable(code: u8) -> bool {
    escape_sequence(code).is_none() && (0x20..0x7f).contains(&code)
}

/// 文字コードを引用符なしのリテラル表記にする
pub fn char_code_to_literal(code: u8) -> String {
    if let Some(escaped) = escape_sequence(code) {
        return escaped.to_string();
    }
    if is_printable(code) {
        return (code as char).to_string();
    }
    format!("\\x{:02x}", code)
}

/// 文字リテラル
///
/// 負の文字コード（符号付き char）は 256 を足して扱います。
pub fn char_literal(code: i64) -> String {
    let code = if code < 0 { code + 256 } else { code };
    format!("'{}'", char_code_to_literal(code as u8))
}

/// 文字列リテラル
///
/// `length` が無い場合は最初の NUL で打ち切ります。
/// 16進エスケープが後続の文字を取り込まないよう、印字できない文字の後に
/// 続きがあれば `""` で区切ります。
pub fn string_literal(bytes: &[u8], length: Option<usize>) -> String {
    let end = match length {
        Some(len) => len.min(bytes.len()),
        None => bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len()),
    };
    let mut res = String::with_capacity(end + 2);
    res.push('"');
    for (i, &c) in bytes[..end].iter().enumerate() {
        res.push_str(&char_code_to_literal(c));
        if !is_printable(c) && i + 1 < end {
            res.push_str("\"\"");
        }
    }
    res.push('"');
    res
}

/// 生ポインタ値のリテラル
///
/// `(int **) 0x7ffd1000` の形式。0 は `NULL` になります。
pub fn pointer_literal(address: u64, base_type: &str, dimension: usize) -> String {
    if address == 0 {
        return NULL_LITERAL.to_string();
    }
    format!("({} {}) 0x{:x}", base_type, "*".repeat(dimension.max(1)), address)
}

/// 名前付きオブジェクトへの参照のキャスト
pub fn reference_cast(base_type: &str, dimension: usize) -> String {
    format!("({} {})", base_type, "*".repeat(dimension.max(1)))
}

/// 生バイト列から値を復元する式
pub fn from_bytes_literal(type_name: &str, bytes_literal: &str) -> String {
    format!("from_bytes<{}>({})", type_name, bytes_literal)
}

/// 範囲外の列挙値のキャスト
pub fn enum_cast_literal(enum_name: &str, value: i64) -> String {
    format!("(enum {})({})", enum_name, value)
}

/// 関数ポインタ引数のスタブ名
pub fn parameter_stub_name(scope: Option<&str>, method: &str, param: &str) -> String {
    match scope {
        Some(scope) if !scope.is_empty() => format!("{}_{}_{}_stub", scope, method, param),
        _ => format!("{}_{}_stub", method, param),
    }
}

/// 関数ポインタフィールドのスタブ名
pub fn field_stub_name(struct_name: &str, field: &str) -> String {
    format!("{}_{}_stub", struct_name, field)
}
