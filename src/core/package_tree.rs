//! Package tree construction

use crate::models::descriptor::package_of;
use crate::models::package::Package;

/// Build the package tree for the given fully-qualified class names. Each
/// class becomes a direct member of its innermost package; intermediate
/// packages are created on the way.
pub fn build_package_tree<'a, I>(class_names: I) -> Package
where
    I: IntoIterator<Item = &'a str>,
{
    let mut root = Package::root();
    for class_name in class_names {
        let package = package_of(class_name);
        let node = if package.is_empty() {
            &mut root
        } else {
            package
                .split('.')
                .fold(&mut root, |node, segment| node.subpackage_mut(segment))
        };
        node.add_class(class_name);
    }
    root
}
