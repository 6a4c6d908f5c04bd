//! テストケースのテキスト表示

use ktdecode_core::{DecodedTestCase, ParamValue, ValueView};
use ktdecode_types::{RecordKind, TypeRegistry};
use std::fmt::{self, Write};

fn declaration(out: &mut String, value: &ParamValue) -> fmt::Result {
    let align = value
        .alignment
        .map(|a| format!("alignas({}) ", a))
        .unwrap_or_default();
    writeln!(
        out,
        "    {}{} {} = {};",
        align,
        value.ty,
        value.name,
        value.view.entry_value()
    )
}

fn section(out: &mut String, title: &str, values: &[ParamValue]) -> fmt::Result {
    if values.is_empty() {
        return Ok(());
    }
    writeln!(out, "  {}:", title)?;
    for value in values {
        declaration(out, value)?;
    }
    Ok(())
}

fn write_case(out: &mut String, case: &DecodedTestCase) -> fmt::Result {
    writeln!(out, "test case #{} ({})", case.index, case.suite)?;

    if !case.lazy.is_empty() {
        writeln!(out, "  lazy objects:")?;
        for lazy in &case.lazy {
            writeln!(
                out,
                "    {} {} = {};  // reached from {}",
                lazy.ty,
                lazy.name,
                lazy.view.entry_value(),
                lazy.root
            )?;
        }
    }

    if let Some(class) = &case.class_pre {
        section(out, "this", std::slice::from_ref(class))?;
    }
    section(out, "params", &case.params)?;
    section(out, "globals", &case.globals_pre)?;
    if let Some(stdin) = &case.stdin {
        section(out, "stdin", std::slice::from_ref(stdin))?;
    }
    section(out, "stubs", &case.stubs)?;
    section(out, "function pointer stubs", &case.stub_params)?;

    if !case.references.is_empty() {
        writeln!(out, "  references:")?;
        for reference in &case.references {
            writeln!(out, "    {} = {};", reference.variable, reference.literal())?;
        }
    }

    match &case.return_value.view {
        ValueView::Void => {}
        view => writeln!(out, "  expected: {}", view.entry_value())?,
    }

    section(out, "params after call", &case.param_post_values)?;
    section(out, "globals after call", &case.globals_post)?;
    if let Some(class) = &case.class_post {
        section(out, "this after call", std::slice::from_ref(class))?;
    }

    for descriptor in &case.error_descriptors {
        writeln!(out, "  error: {}", descriptor)?;
    }
    Ok(())
}

/// 1つのテストケースを読みやすい形にする
pub fn render_case(case: &DecodedTestCase) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write_case(&mut out, case)?;
    Ok(out)
}

fn write_types(out: &mut String, registry: &TypeRegistry) -> fmt::Result {
    for record in registry.records() {
        let keyword = match record.kind {
            RecordKind::Struct => "struct",
            RecordKind::Union => "union",
        };
        writeln!(out, "{} {} (size {})", keyword, record.name, record.size)?;
        for field in record.fields_by_offset() {
            let name = if field.is_anonymous() {
                "<anonymous>"
            } else {
                field.name.as_str()
            };
            match field.bit_size {
                Some(bits) => writeln!(
                    out,
                    "  +{:<4} {} {} : {} (bit {})",
                    field.offset, field.ty, name, bits, field.bit_offset
                )?,
                None => writeln!(out, "  +{:<4} {} {}", field.offset, field.ty, name)?,
            }
        }
    }
    for info in registry.enums() {
        writeln!(out, "enum {} (size {})", info.name, info.size)?;
        for entry in &info.entries {
            writeln!(out, "  {} = {}", entry.name, entry.value)?;
        }
    }
    Ok(())
}

/// 型情報の一覧
pub fn render_types(registry: &TypeRegistry) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write_types(&mut out, registry)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ktdecode_core::{InitReference, LazyDeclaration, Suite};
    use ktdecode_types::{EnumEntry, EnumInfo, Field, RecordInfo, Type};

    fn value(name: &str, ty: Type, literal: &str) -> ParamValue {
        ParamValue {
            name: name.to_string(),
            ty,
            alignment: None,
            view: ValueView::primitive(literal),
        }
    }

    #[test]
    fn test_render_case() {
        let case = DecodedTestCase {
            index: 2,
            suite: Suite::Regression,
            params: vec![value("x", Type::int(), "4")],
            param_post_values: Vec::new(),
            globals_pre: Vec::new(),
            globals_post: Vec::new(),
            class_pre: None,
            class_post: None,
            return_value: value("utbot_result", Type::int(), "5"),
            stubs: Vec::new(),
            stub_params: Vec::new(),
            stdin: None,
            references: vec![InitReference {
                variable: "node.next".to_string(),
                referenced: "head".to_string(),
                cast: "(struct Node *)".to_string(),
            }],
            lazy: Vec::new(),
            error_descriptors: Vec::new(),
        };
        let text = render_case(&case).unwrap();
        assert!(text.starts_with("test case #2 (regression)\n"));
        assert!(text.contains("    int x = 4;\n"));
        assert!(text.contains("    node.next = (struct Node *) &head;\n"));
        assert!(text.contains("  expected: 5\n"));
    }

    #[test]
    fn test_render_lazy_objects_and_errors() {
        let case = DecodedTestCase {
            index: 0,
            suite: Suite::Error,
            params: Vec::new(),
            param_post_values: Vec::new(),
            globals_pre: Vec::new(),
            globals_post: Vec::new(),
            class_pre: None,
            class_post: Some(value("self", Type::simple("Counter"), "{.n = 1}")),
            return_value: value("utbot_result", Type::simple("void"), "0"),
            stubs: Vec::new(),
            stub_params: Vec::new(),
            stdin: None,
            references: Vec::new(),
            lazy: vec![LazyDeclaration {
                name: "utbotInnerVar1".to_string(),
                ty: Type::int(),
                view: ValueView::primitive("3"),
                root: "p".to_string(),
            }],
            error_descriptors: vec!["null pointer dereference".to_string()],
        };
        let text = render_case(&case).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "test case #0 (error)",
                "  lazy objects:",
                "    int utbotInnerVar1 = 3;  // reached from p",
                "  expected: 0",
                "  this after call:",
                "    Counter self = {.n = 1};",
                "  error: null pointer dereference",
            ]
        );
    }

    #[test]
    fn test_render_types() {
        let mut registry = TypeRegistry::new();
        registry.add_record(RecordInfo {
            name: "Point".to_string(),
            kind: RecordKind::Struct,
            size: 8,
            fields: vec![
                Field {
                    name: "y".to_string(),
                    ty: Type::int(),
                    offset: 4,
                    bit_size: None,
                    bit_offset: 0,
                },
                Field {
                    name: "x".to_string(),
                    ty: Type::int(),
                    offset: 0,
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
            entries: vec![EnumEntry {
                name: "RED".to_string(),
                value: 0,
            }],
            access: None,
        });
        let text = render_types(&registry).unwrap();
        assert_eq!(
            text,
            "struct Point (size 8)\n  +0    int x\n  +4    int y\nenum Color (size 4)\n  RED = 0\n"
        );
    }
}
