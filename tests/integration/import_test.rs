use crate::fixtures::class_writer::{write_jar, ClassWriter};
use classimport::{
    error::{ImportError, Result},
    models::{descriptor::DependencyKind, report::IssueKind},
    CancellationToken, ClassFileImporter, ImportFilter, ImportedGraph,
};
use parking_lot::Mutex;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn create_sample_classes(root: &Path) {
    ClassWriter::new("com.example.Service")
        .interface()
        .method("handle", "(Lcom/example/model/Order;)V")
        .write_to(root);
    ClassWriter::new("com.example.OrderService")
        .implements("com.example.Service")
        .field("repository", "Lcom/example/model/Repository;")
        .method_throwing("load", "(J)Lcom/example/model/Order;", &["java.io.IOException"])
        .annotated("javax.inject.Singleton")
        .write_to(root);
    ClassWriter::new("com.example.model.Order").write_to(root);
    ClassWriter::new("com.example.model.Repository")
        .interface()
        .write_to(root);
}

fn names(graph: &ImportedGraph) -> Vec<String> {
    graph.class_names().into_iter().map(str::to_string).collect()
}

#[test]
fn test_import_directory_resolves_references() -> Result<()> {
    let temp_dir = tempdir()?;
    create_sample_classes(temp_dir.path());

    let graph = ClassFileImporter::new().import_path(temp_dir.path())?;

    assert_eq!(
        names(&graph),
        vec![
            "com.example.OrderService",
            "com.example.Service",
            "com.example.model.Order",
            "com.example.model.Repository",
        ]
    );

    let service = graph.get("com.example.OrderService").unwrap();
    assert_eq!(service.interfaces(), vec![graph.get("com.example.Service").unwrap()]);
    assert!(service.descriptor().unwrap().annotation("javax.inject.Singleton").is_some());

    let kinds: Vec<(&str, DependencyKind)> = service
        .direct_dependencies()
        .iter()
        .map(|dependency| (dependency.target.name(), dependency.kind))
        .collect();
    assert!(kinds.contains(&("com.example.model.Repository", DependencyKind::FieldType)));
    assert!(kinds.contains(&("com.example.model.Order", DependencyKind::ReturnType)));
    assert!(kinds.contains(&("java.io.IOException", DependencyKind::ThrowsType)));
    assert!(kinds.contains(&("javax.inject.Singleton", DependencyKind::AnnotationType)));

    // Resolved targets know who depends on them
    let order = graph.get("com.example.model.Order").unwrap();
    let dependents: Vec<&str> = order.dependents().iter().map(|d| d.origin.name()).collect();
    assert!(dependents.contains(&"com.example.OrderService"));
    assert!(dependents.contains(&"com.example.Service"));

    let report = graph.report();
    assert_eq!(report.summary.locations_enumerated, 4);
    assert_eq!(report.summary.classes_parsed, 4);
    assert_eq!(report.summary.classes_imported, 4);
    assert!(report.issues.is_empty());
    assert!(graph.is_complete());

    Ok(())
}

#[test]
fn test_import_is_idempotent() -> Result<()> {
    let temp_dir = tempdir()?;
    create_sample_classes(temp_dir.path());
    let importer = ClassFileImporter::new();

    let first = importer.import_path(temp_dir.path())?;
    let second = importer.import_path(temp_dir.path())?;

    assert_eq!(names(&first), names(&second));
    assert_eq!(
        first.root_package().all_classes().len(),
        second.root_package().all_classes().len()
    );
    let first_packages: Vec<String> = first
        .package("com.example")?
        .subpackages()
        .iter()
        .map(|package| package.full_name().to_string())
        .collect();
    let second_packages: Vec<String> = second
        .package("com.example")?
        .subpackages()
        .iter()
        .map(|package| package.full_name().to_string())
        .collect();
    assert_eq!(first_packages, second_packages);
    assert_eq!(first.edge_count(), second.edge_count());

    Ok(())
}

#[test]
fn test_sequential_and_parallel_imports_agree() -> Result<()> {
    let temp_dir = tempdir()?;
    for i in 0..40 {
        ClassWriter::new(&format!("p.C{:02}", i))
            .extends(&format!("p.C{:02}", (i + 1) % 40))
            .write_to(temp_dir.path());
    }

    let sequential = ClassFileImporter::with_settings(classimport::Settings {
        parallel: false,
        ..Default::default()
    })?
    .import_path(temp_dir.path())?;
    let parallel = ClassFileImporter::with_settings(classimport::Settings {
        worker_threads: Some(4),
        ..Default::default()
    })?
    .import_path(temp_dir.path())?;

    assert_eq!(names(&sequential), names(&parallel));
    assert_eq!(sequential.len(), 40);
    assert!(sequential.external_classes().is_empty());
    // A cycle of superclasses resolves without recursion
    let c00 = parallel.get("p.C00").unwrap();
    assert_eq!(c00.superclass().unwrap().name(), "p.C01");
    assert_eq!(c00.subclasses(), vec![parallel.get("p.C39").unwrap()]);

    Ok(())
}

#[test]
fn test_duplicate_classes_keep_first_seen() -> Result<()> {
    let temp_dir = tempdir()?;
    let jar = write_jar(
        &temp_dir.path().join("libs/first.jar"),
        &[
            ClassWriter::new("dup.A").field("origin", "Ldup/FromJar;"),
            ClassWriter::new("dup.B"),
        ],
    );
    let dir = temp_dir.path().join("classes");
    ClassWriter::new("dup.A")
        .field("origin", "Ldup/FromDir;")
        .write_to(&dir);
    ClassWriter::new("dup.C").write_to(&dir);

    let graph = ClassFileImporter::new().import_roots(&[jar.as_path(), dir.as_path()])?;

    assert_eq!(names(&graph), vec!["dup.A", "dup.B", "dup.C"]);
    let a = graph.get("dup.A").unwrap();
    assert!(a.source().unwrap().is_jar());
    assert!(graph.external("dup.FromJar").is_some());
    assert!(graph.lookup("dup.FromDir").is_none());

    let duplicates = graph.report().duplicates();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].kind, IssueKind::DuplicateClassIgnored);
    assert_eq!(duplicates[0].locations.len(), 2);
    assert!(duplicates[0].locations[0].starts_with("jar:file://"));
    assert!(duplicates[0].locations[1].starts_with("file://"));
    assert_eq!(graph.report().summary.duplicates_ignored, 1);
    assert!(!graph.report().has_failures());

    // Reversing the root order flips which copy wins
    let graph = ClassFileImporter::new().import_roots(&[dir.as_path(), jar.as_path()])?;
    assert!(!graph.get("dup.A").unwrap().source().unwrap().is_jar());

    Ok(())
}

#[test]
fn test_exclude_archives_keeps_loose_classes_only() -> Result<()> {
    let temp_dir = tempdir()?;
    ClassWriter::new("loose.Only").write_to(temp_dir.path());
    write_jar(
        &temp_dir.path().join("bundle.jar"),
        &[ClassWriter::new("packed.One"), ClassWriter::new("packed.Two")],
    );

    let all = ClassFileImporter::new().import_path(temp_dir.path())?;
    assert_eq!(all.len(), 3);

    let graph = ClassFileImporter::new()
        .with_filter(ImportFilter::DoNotIncludeArchives)
        .import_path(temp_dir.path())?;
    assert_eq!(names(&graph), vec!["loose.Only"]);
    assert_eq!(graph.report().summary.locations_enumerated, 1);

    Ok(())
}

#[test]
fn test_filtered_locations_never_reach_the_graph() -> Result<()> {
    let temp_dir = tempdir()?;
    let main = temp_dir.path().join("target/classes");
    let tests = temp_dir.path().join("target/test-classes");
    ClassWriter::new("app.Main").write_to(&main);
    ClassWriter::new("app.generated.Stub").write_to(&main);
    ClassWriter::new("app.MainTest")
        .field("subject", "Lapp/Main;")
        .write_to(&tests);
    ClassWriter::new("app.package-info").interface().write_to(&main);

    let settings = classimport::Settings {
        exclude_tests: true,
        exclude_package_infos: true,
        exclude_patterns: vec!["*/generated/*".to_string()],
        ..Default::default()
    };
    let graph = ClassFileImporter::with_settings(settings)?.import_path(temp_dir.path())?;
    assert_eq!(names(&graph), vec!["app.Main"]);
    assert!(graph.package("app")?.package_info().is_none());

    let only_tests = ClassFileImporter::new()
        .with_filter(ImportFilter::OnlyIncludeTests)
        .import_path(temp_dir.path())?;
    assert_eq!(names(&only_tests), vec!["app.MainTest"]);
    // The production class is referenced but not imported
    assert!(only_tests.get("app.MainTest").unwrap().is_resolved());
    assert!(only_tests.external("app.Main").is_some());

    let custom = ClassFileImporter::new()
        .with_filter(|location: &classimport::Location| !location.uri().contains("Stub"))
        .import_path(&main)?;
    assert_eq!(names(&custom), vec!["app.Main", "app.package-info"]);
    assert!(custom.package("app")?.package_info().is_some());

    Ok(())
}

#[test]
fn test_package_containment() -> Result<()> {
    let temp_dir = tempdir()?;
    ClassWriter::new("p.q.R").write_to(temp_dir.path());
    ClassWriter::new("p.q.R$Inner").write_to(temp_dir.path());
    ClassWriter::new("p.S").write_to(temp_dir.path());

    let graph = ClassFileImporter::new().import_path(temp_dir.path())?;
    let root = graph.root_package();
    let r = graph.get("p.q.R").unwrap();

    let q = root.get_package("p.q")?;
    assert!(q.classes().contains(&r));
    assert!(q.contains_class("R"));
    assert!(root.get_package("p")?.all_classes().contains(&r));
    assert!(!root.get_package("p")?.classes().contains(&r));
    assert_eq!(q.parent().unwrap().full_name(), "p");
    assert_eq!(r.package().unwrap(), q);

    assert!(matches!(
        root.get_package("p.missing"),
        Err(ImportError::PackageNotFound { name }) if name == "p.missing"
    ));

    Ok(())
}

#[test]
fn test_external_references_become_stubs() -> Result<()> {
    let temp_dir = tempdir()?;
    ClassWriter::new("p.Child")
        .extends("q.Parent")
        .implements("q.Contract")
        .write_to(temp_dir.path());

    let graph = ClassFileImporter::new().import_path(temp_dir.path())?;
    let child = graph.get("p.Child").unwrap();
    let parent = child.superclass().unwrap();

    assert_eq!(parent.name(), "q.Parent");
    assert!(!parent.is_resolved());
    assert!(parent.descriptor().is_none());
    assert!(!graph.contains("q.Parent"));
    assert!(!graph.contains_package("q"));
    assert_eq!(graph.report().summary.external_classes, 2);
    assert!(graph.report().issues.is_empty());

    Ok(())
}

#[test]
fn test_malformed_and_unreadable_locations_are_recorded() -> Result<()> {
    let temp_dir = tempdir()?;
    ClassWriter::new("ok.Good").write_to(temp_dir.path());
    fs::create_dir_all(temp_dir.path().join("ok"))?;
    fs::write(temp_dir.path().join("ok/Bad.class"), b"\xCA\xFE\xBA\xBE\x00")?;
    fs::write(
        temp_dir.path().join("ok/Future.class"),
        ClassWriter::new("ok.Future").version(99).to_bytes(),
    )?;
    fs::write(temp_dir.path().join("broken.jar"), b"not a zip")?;

    let graph = ClassFileImporter::new().import_path(temp_dir.path())?;

    assert_eq!(names(&graph), vec!["ok.Good"]);
    let report = graph.report();
    assert_eq!(report.summary.failures, 3);
    let malformed = report
        .failures()
        .iter()
        .filter(|issue| issue.kind == IssueKind::MalformedClassFile)
        .count();
    assert_eq!(malformed, 2);
    assert!(report
        .failures()
        .iter()
        .any(|issue| issue.kind == IssueKind::UnreadableLocation
            && issue.locations[0].ends_with("broken.jar")));

    let json = report.to_json()?;
    assert!(json.contains("\"MalformedClassFile\""));

    Ok(())
}

#[test]
fn test_cancelled_import_is_partial() -> Result<()> {
    let temp_dir = tempdir()?;
    create_sample_classes(temp_dir.path());

    let token = CancellationToken::new();
    token.cancel();
    let graph = ClassFileImporter::new()
        .with_cancellation(token)
        .import_path(temp_dir.path())?;

    assert!(graph.is_empty());
    assert!(!graph.is_complete());
    assert_eq!(graph.report().summary.locations_enumerated, 4);

    Ok(())
}

#[test]
fn test_progress_reaches_total() -> Result<()> {
    let temp_dir = tempdir()?;
    create_sample_classes(temp_dir.path());

    let updates = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&updates);
    ClassFileImporter::new()
        .with_progress(move |update| sink.lock().push((update.current, update.total)))
        .import_path(temp_dir.path())?;

    let updates = updates.lock();
    assert!(!updates.is_empty());
    assert!(updates.iter().all(|&(_, total)| total == 4));
    assert_eq!(updates.iter().map(|&(current, _)| current).max(), Some(4));

    Ok(())
}

#[test]
fn test_import_archives() -> Result<()> {
    let temp_dir = tempdir()?;
    let first = write_jar(
        &temp_dir.path().join("a.jar"),
        &[ClassWriter::new("lib.a.First")],
    );
    let second = write_jar(
        &temp_dir.path().join("b.zip"),
        &[ClassWriter::new("lib.b.Second").extends("lib.a.First")],
    );

    let graph = ClassFileImporter::new().import_archives(&[first.as_path(), second.as_path()])?;
    assert_eq!(names(&graph), vec!["lib.a.First", "lib.b.Second"]);
    assert_eq!(
        graph.get("lib.b.Second").unwrap().source().unwrap().uri(),
        format!("jar:{}!/lib/b/Second.class", classimport::models::location::file_uri(&second))
    );

    let single = ClassFileImporter::new().import_archive(&first)?;
    assert_eq!(single.len(), 1);

    Ok(())
}
