use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const ACC_PUBLIC: u16 = 0x0001;
const ACC_SUPER: u16 = 0x0020;
const ACC_INTERFACE: u16 = 0x0200;
const ACC_ABSTRACT: u16 = 0x0400;

/// Emits minimal but valid class files for import tests
///
/// Names are given in dotted form (`com.example.Foo`); descriptors in
/// class-file form (`Ljava/lang/String;`).
#[derive(Debug, Clone)]
pub struct ClassWriter {
    name: String,
    super_name: Option<String>,
    interfaces: Vec<String>,
    access: u16,
    major_version: u16,
    fields: Vec<(String, String)>,
    methods: Vec<(String, String, Vec<String>)>,
    annotations: Vec<String>,
}

impl ClassWriter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            super_name: Some("java.lang.Object".to_string()),
            interfaces: Vec::new(),
            access: ACC_PUBLIC | ACC_SUPER,
            major_version: 61,
            fields: Vec::new(),
            methods: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extends(mut self, super_name: &str) -> Self {
        self.super_name = Some(super_name.to_string());
        self
    }

    /// No superclass at all, as for `java.lang.Object`
    pub fn root(mut self) -> Self {
        self.super_name = None;
        self
    }

    pub fn implements(mut self, interface: &str) -> Self {
        self.interfaces.push(interface.to_string());
        self
    }

    pub fn interface(mut self) -> Self {
        self.access = ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT;
        self
    }

    pub fn version(mut self, major: u16) -> Self {
        self.major_version = major;
        self
    }

    pub fn field(mut self, name: &str, descriptor: &str) -> Self {
        self.fields.push((name.to_string(), descriptor.to_string()));
        self
    }

    pub fn method(mut self, name: &str, descriptor: &str) -> Self {
        self.methods
            .push((name.to_string(), descriptor.to_string(), Vec::new()));
        self
    }

    pub fn method_throwing(mut self, name: &str, descriptor: &str, exceptions: &[&str]) -> Self {
        self.methods.push((
            name.to_string(),
            descriptor.to_string(),
            exceptions.iter().map(|e| e.to_string()).collect(),
        ));
        self
    }

    pub fn annotated(mut self, annotation: &str) -> Self {
        self.annotations.push(annotation.to_string());
        self
    }

    /// Entry path relative to a class root, e.g. `com/example/Foo.class`
    pub fn entry_name(&self) -> String {
        format!("{}.class", internal(&self.name))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut pool = Pool::default();
        let this_class = pool.class(&self.name);
        let super_class = self
            .super_name
            .as_ref()
            .map(|name| pool.class(name))
            .unwrap_or(0);
        let interfaces: Vec<u16> = self.interfaces.iter().map(|i| pool.class(i)).collect();

        let mut body = Vec::new();
        put_u2(&mut body, self.access);
        put_u2(&mut body, this_class);
        put_u2(&mut body, super_class);
        put_u2(&mut body, interfaces.len() as u16);
        for interface in interfaces {
            put_u2(&mut body, interface);
        }

        put_u2(&mut body, self.fields.len() as u16);
        for (name, descriptor) in &self.fields {
            put_u2(&mut body, ACC_PUBLIC);
            put_u2(&mut body, pool.utf8(name));
            put_u2(&mut body, pool.utf8(descriptor));
            put_u2(&mut body, 0);
        }

        put_u2(&mut body, self.methods.len() as u16);
        for (name, descriptor, exceptions) in &self.methods {
            put_u2(&mut body, ACC_PUBLIC);
            put_u2(&mut body, pool.utf8(name));
            put_u2(&mut body, pool.utf8(descriptor));
            if exceptions.is_empty() {
                put_u2(&mut body, 0);
            } else {
                put_u2(&mut body, 1);
                put_u2(&mut body, pool.utf8("Exceptions"));
                put_u4(&mut body, 2 + 2 * exceptions.len() as u32);
                put_u2(&mut body, exceptions.len() as u16);
                for exception in exceptions {
                    let index = pool.class(exception);
                    put_u2(&mut body, index);
                }
            }
        }

        if self.annotations.is_empty() {
            put_u2(&mut body, 0);
        } else {
            put_u2(&mut body, 1);
            put_u2(&mut body, pool.utf8("RuntimeVisibleAnnotations"));
            put_u4(&mut body, 2 + 4 * self.annotations.len() as u32);
            put_u2(&mut body, self.annotations.len() as u16);
            for annotation in &self.annotations {
                let type_index = pool.utf8(&format!("L{};", internal(annotation)));
                put_u2(&mut body, type_index);
                put_u2(&mut body, 0);
            }
        }

        let mut out = Vec::with_capacity(body.len() + pool.bytes.len() + 10);
        put_u4(&mut out, 0xCAFE_BABE);
        put_u2(&mut out, 0);
        put_u2(&mut out, self.major_version);
        put_u2(&mut out, pool.count);
        out.extend(pool.bytes);
        out.extend(body);
        out
    }

    /// Write the class below `root` following its package layout
    pub fn write_to(&self, root: &Path) -> PathBuf {
        let path = root.join(self.entry_name());
        fs::create_dir_all(path.parent().expect("class path has a parent")).expect("create dirs");
        fs::write(&path, self.to_bytes()).expect("write class file");
        path
    }
}

/// Write a jar holding `classes` (plus a manifest)
pub fn write_jar(path: &Path, classes: &[ClassWriter]) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create jar dir");
    }
    let mut writer = ZipWriter::new(File::create(path).expect("create jar"));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    writer
        .start_file("META-INF/MANIFEST.MF", options)
        .expect("start manifest");
    writer
        .write_all(b"Manifest-Version: 1.0\n")
        .expect("write manifest");
    for class in classes {
        writer
            .start_file(class.entry_name(), options)
            .expect("start entry");
        writer.write_all(&class.to_bytes()).expect("write entry");
    }
    writer.finish().expect("finish jar");
    path.to_path_buf()
}

/// Lay out an exploded runtime image module: `<java_home>/modules/<module>/...`
pub fn write_module(java_home: &Path, module: &str, classes: &[ClassWriter]) {
    let root = java_home.join("modules").join(module);
    fs::create_dir_all(&root).expect("create module dir");
    for class in classes {
        class.write_to(&root);
    }
}

#[derive(Default)]
struct Pool {
    bytes: Vec<u8>,
    count: u16,
    utf8: HashMap<String, u16>,
    classes: HashMap<String, u16>,
}

impl Pool {
    fn next(&mut self) -> u16 {
        if self.count == 0 {
            self.count = 1;
        }
        let index = self.count;
        self.count += 1;
        index
    }

    fn utf8(&mut self, value: &str) -> u16 {
        if let Some(&index) = self.utf8.get(value) {
            return index;
        }
        self.bytes.push(1);
        put_u2(&mut self.bytes, value.len() as u16);
        self.bytes.extend(value.as_bytes());
        let index = self.next();
        self.utf8.insert(value.to_string(), index);
        index
    }

    fn class(&mut self, dotted: &str) -> u16 {
        if let Some(&index) = self.classes.get(dotted) {
            return index;
        }
        let name = self.utf8(&internal(dotted));
        self.bytes.push(7);
        put_u2(&mut self.bytes, name);
        let index = self.next();
        self.classes.insert(dotted.to_string(), index);
        index
    }
}

fn internal(dotted: &str) -> String {
    dotted.replace('.', "/")
}

fn put_u2(out: &mut Vec<u8>, value: u16) {
    out.extend(value.to_be_bytes());
}

fn put_u4(out: &mut Vec<u8>, value: u32) {
    out.extend(value.to_be_bytes());
}
