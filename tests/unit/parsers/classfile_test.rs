use crate::fixtures::class_writer::ClassWriter;
use classimport::{
    models::{
        descriptor::{ClassKind, DependencyKind},
        types::{JavaType, Primitive},
    },
    parse_class, ClassParseError,
};

#[test]
fn test_parse_written_class() {
    let bytes = ClassWriter::new("com.example.Invoice")
        .implements("java.io.Serializable")
        .field("total", "J")
        .field("lines", "[Lcom/example/Line;")
        .method_throwing("print", "(Ljava/io/Writer;I)Z", &["java.io.IOException"])
        .annotated("com.example.Audited")
        .to_bytes();

    let class = parse_class(&bytes).expect("valid class file");

    assert_eq!(class.name, "com.example.Invoice");
    assert_eq!(class.package_name(), "com.example");
    assert_eq!(class.simple_name(), "Invoice");
    assert_eq!(class.kind(), ClassKind::Class);
    assert_eq!(class.interfaces, vec!["java.io.Serializable".to_string()]);
    assert_eq!(class.major_version, 61);

    assert_eq!(
        class.field("total").unwrap().field_type,
        JavaType::Primitive(Primitive::Long)
    );
    let print = class.methods_named("print").next().unwrap();
    assert_eq!(print.parameters.len(), 2);
    assert_eq!(print.exceptions, vec!["java.io.IOException".to_string()]);
    assert!(class.annotation("com.example.Audited").unwrap().visible);

    let references = class.referenced_class_names();
    let has = |target: &str, kind: DependencyKind| {
        references
            .iter()
            .any(|reference| reference.target == target && reference.kind == kind)
    };
    assert!(has("java.lang.Object", DependencyKind::Extends));
    assert!(has("java.io.Serializable", DependencyKind::Implements));
    // Array element types count as field types
    assert!(has("com.example.Line", DependencyKind::FieldType));
    assert!(has("java.io.Writer", DependencyKind::ParameterType));
    assert!(has("java.io.IOException", DependencyKind::ThrowsType));
    assert!(has("com.example.Audited", DependencyKind::AnnotationType));
}

#[test]
fn test_parse_interface() {
    let bytes = ClassWriter::new("com.example.Repository").interface().to_bytes();
    let class = parse_class(&bytes).unwrap();
    assert_eq!(class.kind(), ClassKind::Interface);
    assert!(class.access.is_abstract());
}

#[test]
fn test_reject_unsupported_version() {
    let bytes = ClassWriter::new("p.Old").version(44).to_bytes();
    assert!(matches!(
        parse_class(&bytes),
        Err(ClassParseError::UnsupportedVersion { major: 44 })
    ));

    let bytes = ClassWriter::new("p.Newest").version(69).to_bytes();
    assert!(parse_class(&bytes).is_ok());
}

#[test]
fn test_reject_truncated_class() {
    let bytes = ClassWriter::new("p.Cut").to_bytes();
    for len in [0, 4, 9, bytes.len() - 1] {
        assert!(parse_class(&bytes[..len]).is_err(), "length {}", len);
    }
}
