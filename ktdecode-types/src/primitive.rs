//! プリミティブ型の表
//!
//! LP64を前提としたC/C++のスカラー型のサイズと分類。

/// プリミティブ型の分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveClass {
    /// 整数
    Integer,
    /// 浮動小数点
    Float,
    /// 真偽値
    Bool,
    /// 文字（文字リテラルとして表示する）
    Char,
    /// 生バイト（文字リテラル化しない `utbot_byte`）
    Byte,
    /// void
    Void,
}

/// プリミティブ型の情報
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveInfo {
    /// サイズ（バイト）
    pub size: usize,
    /// 分類
    pub class: PrimitiveClass,
    /// 符号付きかどうか
    pub signed: bool,
}

/// 生バイト型の名前
pub const BYTE_TYPE_NAME: &str = "utbot_byte";

/// voidの代わりに読み取る最小スカラー型
pub const MINIMAL_SCALAR_TYPE_NAME: &str = "unsigned char";

impl PrimitiveInfo {
    const fn new(size: usize, class: PrimitiveClass, signed: bool) -> Self {
        Self { size, class, signed }
    }

    /// 型名からプリミティブ型を引く
    pub fn lookup(name: &str) -> Option<Self> {
        use PrimitiveClass::*;

        let info = match name {
            "bool" | "_Bool" => Self::new(1, Bool, false),
            "char" | "signed char" => Self::new(1, Char, true),
            "unsigned char" => Self::new(1, Char, false),
            BYTE_TYPE_NAME => Self::new(1, Byte, true),
            "short" | "short int" | "int16_t" => Self::new(2, Integer, true),
            "unsigned short" | "unsigned short int" | "uint16_t" => Self::new(2, Integer, false),
            "int" | "int32_t" => Self::new(4, Integer, true),
            "unsigned int" | "unsigned" | "uint32_t" => Self::new(4, Integer, false),
            "long" | "long int" | "int64_t" | "ssize_t" | "intptr_t" => {
                Self::new(8, Integer, true)
            }
            "unsigned long" | "unsigned long int" | "uint64_t" | "size_t" | "uintptr_t"
            | "std::uintptr_t" => Self::new(8, Integer, false),
            "long long" | "long long int" => Self::new(8, Integer, true),
            "unsigned long long" | "unsigned long long int" => Self::new(8, Integer, false),
            "int8_t" => Self::new(1, Integer, true),
            "uint8_t" => Self::new(1, Integer, false),
            "float" => Self::new(4, Float, true),
            "double" => Self::new(8, Float, true),
            "void" => Self::new(1, Void, false),
            _ => return None,
        };
        Some(info)
    }

    /// 浮動小数点かどうか
    pub fn is_float(&self) -> bool {
        self.class == PrimitiveClass::Float
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_sizes() {
        assert_eq!(PrimitiveInfo::lookup("int").map(|p| p.size), Some(4));
        assert_eq!(PrimitiveInfo::lookup("long long").map(|p| p.size), Some(8));
        assert_eq!(PrimitiveInfo::lookup("unsigned short").map(|p| p.signed), Some(false));
        assert!(PrimitiveInfo::lookup("double").map(|p| p.is_float()).unwrap_or(false));
        assert!(PrimitiveInfo::lookup("struct Node").is_none());
    }

    #[test]
    fn test_byte_is_not_char() {
        // utbot_byte は文字リテラル化しない
        let byte = PrimitiveInfo::lookup(BYTE_TYPE_NAME).unwrap();
        assert_eq!(byte.class, PrimitiveClass::Byte);
        let ch = PrimitiveInfo::lookup("char").unwrap();
        assert_eq!(ch.class, PrimitiveClass::Char);
    }
}
