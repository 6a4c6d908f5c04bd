//! 入力バンドル
//!
//! 型情報・テスト対象の関数・テストベクタを1つの JSON にまとめたもの。

use anyhow::{Context, Result};
use ktdecode_core::{DecodeConfig, MethodDescription, TestVector};
use ktdecode_types::TypeRegistry;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// デコードの入力一式
#[derive(Debug, Deserialize)]
pub struct Bundle {
    #[serde(default)]
    pub types: TypeRegistry,
    pub method: MethodDescription,
    #[serde(default)]
    pub vectors: Vec<TestVector>,
    /// 省略時は既定値
    #[serde(default)]
    pub config: Option<DecodeConfig>,
}

impl Bundle {
    /// JSON ファイルから読み込む
    pub fn load(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parse {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let bundle: Bundle = serde_json::from_str(text)?;
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ktdecode_types::{Type, TypeOracle};

    const BUNDLE: &str = r#"{
        "types": {
            "records": [{
                "name": "Point",
                "kind": "struct",
                "size": 8,
                "fields": [
                    {"name": "x", "type": {"name": "int"}, "offset": 0},
                    {"name": "y", "type": {"name": "int"}, "offset": 4}
                ]
            }]
        },
        "method": {
            "name": "norm",
            "params": [{"name": "p", "type": {"name": "struct Point", "levels": ["pointer"]}}],
            "return_type": {"name": "int"}
        },
        "vectors": [{
            "objects": [
                {"name": "p", "bytes": [3, 0, 0, 0, 4, 0, 0, 0]},
                {"name": "utbot_result", "bytes": [7, 0, 0, 0]}
            ]
        }]
    }"#;

    #[test]
    fn test_parse_bundle() {
        let bundle = Bundle::parse(BUNDLE).unwrap();
        assert_eq!(bundle.method.name, "norm");
        assert_eq!(bundle.method.params[0].ty, Type::simple("struct Point").pointer());
        assert_eq!(bundle.vectors.len(), 1);
        assert!(bundle.config.is_none());
        assert_eq!(bundle.types.size_of(&Type::simple("struct Point")).unwrap(), 8);
    }

    #[test]
    fn test_missing_method_is_error() {
        assert!(Bundle::parse(r#"{"vectors": []}"#).is_err());
    }
}
