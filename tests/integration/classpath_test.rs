use crate::fixtures::class_writer::{write_jar, write_module, ClassWriter};
use classimport::{
    error::{ImportError, Result},
    ClassFileImporter, ImportFilter, ImportFilters, ModuleFilter, Settings,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// A fake runtime image with a base module and one other module
fn create_runtime(java_home: &Path) {
    write_module(
        java_home,
        "java.base",
        &[
            ClassWriter::new("java.lang.Object").root(),
            ClassWriter::new("java.lang.String").implements("java.lang.CharSequence"),
            ClassWriter::new("java.lang.CharSequence").interface(),
        ],
    );
    write_module(
        java_home,
        "java.sql",
        &[ClassWriter::new("java.sql.Driver").interface()],
    );
}

/// Application classes in a directory plus a library jar
fn create_application(root: &Path) -> (PathBuf, PathBuf) {
    let classes = root.join("app/classes");
    ClassWriter::new("com.shop.Cart")
        .field("owner", "Ljava/lang/String;")
        .field("codec", "Lorg/lib/Codec;")
        .write_to(&classes);
    ClassWriter::new("com.shop.web.Controller")
        .field("cart", "Lcom/shop/Cart;")
        .write_to(&classes);
    ClassWriter::new("com.shopping.Other").write_to(&classes);
    let jar = write_jar(
        &root.join("app/lib/codec.jar"),
        &[ClassWriter::new("org.lib.Codec")],
    );
    (classes, jar)
}

fn settings(classpath: Vec<PathBuf>, java_home: Option<&Path>) -> Settings {
    Settings {
        classpath,
        java_home: java_home.map(Path::to_path_buf),
        ..Default::default()
    }
}

#[test]
fn test_import_classpath_skips_archives() -> Result<()> {
    let temp_dir = tempdir()?;
    let (classes, jar) = create_application(temp_dir.path());

    let importer = ClassFileImporter::with_settings(settings(vec![classes, jar], None))?;
    let graph = importer.import_classpath()?;

    assert_eq!(
        graph.class_names(),
        vec!["com.shop.Cart", "com.shop.web.Controller", "com.shopping.Other"]
    );
    assert!(!graph.get("com.shop.Cart").unwrap().source().unwrap().is_archive());
    assert!(graph.external("org.lib.Codec").is_some());

    Ok(())
}

#[test]
fn test_import_entire_classpath_includes_archives_and_runtime() -> Result<()> {
    let temp_dir = tempdir()?;
    let (classes, jar) = create_application(temp_dir.path());
    let java_home = temp_dir.path().join("jdk");
    create_runtime(&java_home);

    let importer = ClassFileImporter::with_settings(settings(
        vec![classes.clone(), jar.clone()],
        Some(&java_home),
    ))?;
    let graph = importer.import_entire_classpath()?;

    assert!(graph.contains("org.lib.Codec"));
    assert!(graph.contains("java.lang.String"));
    assert!(graph.contains("java.sql.Driver"));
    let cart = graph.get("com.shop.Cart").unwrap();
    let owner_type = cart
        .direct_dependencies()
        .into_iter()
        .find(|dependency| dependency.target.name() == "java.lang.String")
        .unwrap();
    assert!(owner_type.target.is_resolved());
    assert_eq!(
        owner_type.target.source().unwrap().uri(),
        "jrt:/java.base/java/lang/String.class"
    );
    assert!(graph
        .get("java.lang.Object")
        .unwrap()
        .superclass()
        .is_none());

    // Extra filters replace the default archive exclusion
    let without_runtime = importer.import_classpath_with(
        &ImportFilters::new().with(ImportFilter::DoNotIncludeRuntimeModules),
    )?;
    assert!(without_runtime.contains("org.lib.Codec"));
    assert!(!without_runtime.contains("java.lang.String"));

    Ok(())
}

#[test]
fn test_import_runtime_base_module_only() -> Result<()> {
    let temp_dir = tempdir()?;
    let (classes, _) = create_application(temp_dir.path());
    let java_home = temp_dir.path().join("jdk");
    create_runtime(&java_home);

    let importer = ClassFileImporter::with_settings(settings(vec![classes], Some(&java_home)))?;

    let graph = importer.import_runtime_modules(&ModuleFilter::base_only())?;
    assert_eq!(
        graph.class_names(),
        vec!["java.lang.CharSequence", "java.lang.Object", "java.lang.String"]
    );
    assert!(!graph.contains("com.shop.Cart"));
    assert!(!graph.contains("java.sql.Driver"));
    assert!(graph
        .classes()
        .iter()
        .all(|class| class.source().unwrap().module() == Some("java.base")));

    // The same restriction expressed as a location filter over everything
    let filtered = importer
        .clone()
        .with_filter(ImportFilter::only_base_module())
        .import_entire_classpath()?;
    assert_eq!(graph.class_names(), filtered.class_names());

    Ok(())
}

#[test]
fn test_import_packages_and_classes_of() -> Result<()> {
    let temp_dir = tempdir()?;
    let (classes, jar) = create_application(temp_dir.path());
    let java_home = temp_dir.path().join("jdk");
    create_runtime(&java_home);

    let importer = ClassFileImporter::with_settings(settings(vec![classes, jar], Some(&java_home)))?;

    let graph = importer.import_packages(&["com.shop"])?;
    // Subpackages are included, sibling prefixes are not
    assert_eq!(graph.class_names(), vec!["com.shop.Cart", "com.shop.web.Controller"]);
    let controller = graph.get("com.shop.web.Controller").unwrap();
    assert_eq!(
        controller.package().unwrap().parent().unwrap().full_name(),
        "com.shop"
    );

    let graph = importer.import_packages(&["org.lib", "java.lang"])?;
    assert!(graph.contains("org.lib.Codec"));
    assert!(graph.contains("java.lang.Object"));
    assert!(!graph.contains("com.shop.Cart"));

    let graph = importer.import_classes_of(["com.shop.web.Controller", "java.sql.Driver"])?;
    assert_eq!(graph.class_names(), vec!["com.shop.web.Controller", "java.sql.Driver"]);

    Ok(())
}

#[test]
fn test_overlapping_packages_parse_each_class_once() -> Result<()> {
    let temp_dir = tempdir()?;
    let (classes, _) = create_application(temp_dir.path());
    let empty_jdk = temp_dir.path().join("empty-jdk");
    fs::create_dir_all(&empty_jdk)?;
    let importer =
        ClassFileImporter::with_settings(settings(vec![classes.clone()], Some(&empty_jdk)))?;

    let graph = importer.import_packages(&["com.shop", "com.shop.web"])?;
    assert_eq!(graph.class_names(), vec!["com.shop.Cart", "com.shop.web.Controller"]);
    let summary = &graph.report().summary;
    assert_eq!(summary.locations_enumerated, 2);
    assert_eq!(summary.classes_parsed, 2);
    assert_eq!(summary.duplicates_ignored, 0);
    assert!(graph.report().duplicates().is_empty());

    let graph = importer.import_classes_of(["com.shop.Cart", "com.shop.web.Controller"])?;
    assert_eq!(graph.report().summary.classes_parsed, 2);
    assert!(graph.report().duplicates().is_empty());

    // A root and one of its subdirectories
    let graph = importer.import_roots(&[classes.clone(), classes.join("com/shop/web")])?;
    assert_eq!(graph.classes().len(), 3);
    assert!(graph.report().duplicates().is_empty());

    Ok(())
}

#[test]
fn test_classpath_wildcard_entries() -> Result<()> {
    let temp_dir = tempdir()?;
    let (_, jar) = create_application(temp_dir.path());
    let lib = jar.parent().unwrap();
    write_jar(&lib.join("extra.jar"), &[ClassWriter::new("org.extra.Plugin")]);
    // A runtime without modules keeps an ambient JAVA_HOME out of the picture
    let empty_jdk = temp_dir.path().join("empty-jdk");
    fs::create_dir_all(&empty_jdk)?;

    let importer =
        ClassFileImporter::with_settings(settings(vec![lib.join("*")], Some(&empty_jdk)))?;
    let graph = importer.import_entire_classpath()?;
    assert_eq!(graph.class_names(), vec!["org.extra.Plugin", "org.lib.Codec"]);

    Ok(())
}

#[test]
fn test_empty_classpath_is_fatal() -> Result<()> {
    let temp_dir = tempdir()?;
    let missing = temp_dir.path().join("missing");
    let importer = ClassFileImporter::with_settings(settings(vec![missing], None))?;

    assert!(matches!(
        importer.import_classpath(),
        Err(ImportError::NoImportableLocations { .. })
    ));

    Ok(())
}
