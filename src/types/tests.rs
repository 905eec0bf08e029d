//! Type registry and descriptor tests

use super::*;
use crate::config::RegistryConfig;
use crate::error::{clear_last_error, last_error, ErrorKind};
use crate::name::Name;
use core::ptr::NonNull;

unsafe fn noop_destructor(_: NonNull<u8>) {}

fn shape_hierarchy(registry: &mut TypeRegistry) -> (TypeRef, TypeRef) {
    let shape = registry
        .declare(TypeDecl::composite("shape").size(8).destructor(noop_destructor))
        .unwrap();
    let circle = registry
        .declare(TypeDecl::composite("circle").parent(&shape).size(16))
        .unwrap();
    (shape, circle)
}

mod registration_tests {
    use super::*;

    #[test]
    fn open_declares_root() {
        let registry = TypeRegistry::open().unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.root().name(), &Name::from("object"));
        assert!(registry.root().parent().is_none());
        assert!(registry.root().is_composite());
        assert!(registry.contains("object"));
    }

    #[test]
    fn register_returns_new_descriptor() {
        let mut registry = TypeRegistry::open().unwrap();
        let shape = registry
            .register("shape", TypeKind::Composite, 8, None, Some(noop_destructor))
            .unwrap();

        assert_eq!(shape.name(), &Name::from("shape"));
        assert_eq!(shape.size(), 8);
        assert!(shape.destructor().is_some());
        assert!(TypeRef::ptr_eq(&registry.lookup("shape").unwrap(), &shape));
    }

    #[test]
    fn parentless_composite_hangs_off_root() {
        let mut registry = TypeRegistry::open().unwrap();
        let (shape, circle) = shape_hierarchy(&mut registry);

        assert!(TypeRef::ptr_eq(shape.parent().unwrap(), registry.root()));
        assert!(TypeRef::ptr_eq(circle.parent().unwrap(), &shape));
        assert_eq!(circle.depth(), 2);
    }

    #[test]
    fn duplicate_name_is_exists_and_first_wins() {
        let mut registry = TypeRegistry::open().unwrap();
        let (shape, _) = shape_hierarchy(&mut registry);

        clear_last_error();
        let err = registry
            .declare(TypeDecl::composite("circle").parent(&shape).size(64))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Exists);
        assert_eq!(last_error(), Some(ErrorKind::Exists));

        let err = registry.declare(TypeDecl::primitive("circle", 4)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Exists);

        let visible = registry.lookup("circle").unwrap();
        assert_eq!(visible.size(), 16);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn root_name_cannot_be_redeclared() {
        let mut registry = TypeRegistry::open().unwrap();
        let err = registry.declare(TypeDecl::composite("object")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Exists);
    }

    #[test]
    fn invalid_declarations_leave_registry_unchanged() {
        let mut registry = TypeRegistry::open().unwrap();
        let (shape, _) = shape_hierarchy(&mut registry);
        let int = registry.declare(TypeDecl::primitive("int", 4)).unwrap();
        let before = registry.len();

        let cases = [
            TypeDecl::composite(""),
            TypeDecl::primitive("float", 4).parent(&shape),
            TypeDecl::composite("bad_parent").parent(&int),
            TypeDecl::composite("too_small").parent(&shape).size(4),
        ];
        for decl in cases {
            let err = registry.declare(decl).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }

        assert_eq!(registry.len(), before);
        assert!(!registry.contains("float"));
        assert!(!registry.contains("too_small"));
    }

    #[test]
    fn foreign_parent_rejected() {
        let mut first = TypeRegistry::open().unwrap();
        let mut second = TypeRegistry::open().unwrap();
        let (shape, _) = shape_hierarchy(&mut first);

        let err = second
            .declare(TypeDecl::composite("circle").parent(&shape).size(16))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn lookup_missing_is_not_found() {
        let registry = TypeRegistry::open().unwrap();
        let err = registry.lookup("mesh").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn names_lists_everything() {
        let mut registry = TypeRegistry::open().unwrap();
        shape_hierarchy(&mut registry);
        registry.declare(TypeDecl::enumeration("blend_mode", 4)).unwrap();

        let mut names: Vec<String> = registry.names().map(|n| n.to_string()).collect();
        names.sort();
        assert_eq!(names, ["blend_mode", "circle", "object", "shape"]);
        assert_eq!(registry.types().len(), 4);
    }

    #[test]
    fn custom_root_from_config() {
        let config = RegistryConfig {
            initial_capacity: 2,
            root_name: "node".to_string(),
        };
        let registry = TypeRegistry::open_with(&config).unwrap();
        assert_eq!(registry.root().name(), &Name::from("node"));
        assert!(registry.lookup("object").is_err());
    }

    #[test]
    fn empty_root_name_rejected() {
        let config = RegistryConfig {
            initial_capacity: 2,
            root_name: String::new(),
        };
        let err = TypeRegistry::open_with(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn registry_grows_past_initial_capacity() {
        let config = RegistryConfig {
            initial_capacity: 1,
            ..RegistryConfig::default()
        };
        let mut registry = TypeRegistry::open_with(&config).unwrap();
        for i in 0..100 {
            registry.declare(TypeDecl::primitive(format!("p{}", i), 4)).unwrap();
        }
        assert_eq!(registry.len(), 101);
        assert_eq!(registry.lookup("p57").unwrap().size(), 4);
    }
}

mod hierarchy_tests {
    use super::*;

    #[test]
    fn descendant_relation() {
        let mut registry = TypeRegistry::open().unwrap();
        let (shape, circle) = shape_hierarchy(&mut registry);

        assert!(is_descendant_or_equal(&circle, &shape));
        assert!(!is_descendant_or_equal(&shape, &circle));
        assert!(is_descendant_or_equal(&circle, &circle));
        assert!(is_descendant_or_equal(&circle, registry.root()));
        assert!(!is_descendant_or_equal(registry.root(), &circle));
    }

    #[test]
    fn primitives_only_match_themselves() {
        let mut registry = TypeRegistry::open().unwrap();
        let int = registry.declare(TypeDecl::primitive("int", 4)).unwrap();
        let uint = registry.declare(TypeDecl::primitive("uint", 4)).unwrap();
        let mode = registry.declare(TypeDecl::enumeration("mode", 4)).unwrap();

        assert!(is_descendant_or_equal(&int, &int));
        assert!(!is_descendant_or_equal(&int, &uint));
        assert!(!is_descendant_or_equal(&mode, &int));
        assert!(!is_descendant_or_equal(&int, registry.root()));
    }

    #[test]
    fn sibling_types_are_unrelated() {
        let mut registry = TypeRegistry::open().unwrap();
        let (shape, circle) = shape_hierarchy(&mut registry);
        let square = registry
            .declare(TypeDecl::composite("square").parent(&shape).size(12))
            .unwrap();

        assert!(!is_descendant_or_equal(&square, &circle));
        assert!(!is_descendant_or_equal(&circle, &square));
        assert!(is_descendant_or_equal(&square, &shape));
    }

    #[test]
    fn ancestors_walk_to_root() {
        let mut registry = TypeRegistry::open().unwrap();
        let (_, circle) = shape_hierarchy(&mut registry);
        let chain: Vec<String> = circle.ancestors().map(|t| t.name().to_string()).collect();
        assert_eq!(chain, ["circle", "shape", "object"]);
    }
}

mod lifecycle_tests {
    use super::*;

    #[test]
    fn close_drops_registry_shares() {
        let mut registry = TypeRegistry::open().unwrap();
        let (shape, circle) = shape_hierarchy(&mut registry);

        // registry + circle's parent link + local
        assert_eq!(TypeRef::strong_count(&shape), 3);
        assert_eq!(TypeRef::strong_count(&circle), 2);

        registry.close();
        assert_eq!(TypeRef::strong_count(&circle), 1);
        assert_eq!(TypeRef::strong_count(&shape), 2);

        drop(circle);
        assert_eq!(TypeRef::strong_count(&shape), 1);
    }

    #[test]
    fn close_finalizes_unheld_types() {
        let mut registry = TypeRegistry::open().unwrap();
        let weak = {
            let (shape, _) = shape_hierarchy(&mut registry);
            TypeRef::downgrade(&shape)
        };
        assert!(weak.upgrade().is_some());

        registry.close();
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn reopen_starts_empty() {
        let mut registry = TypeRegistry::open().unwrap();
        shape_hierarchy(&mut registry);
        registry.close();

        let mut registry = TypeRegistry::open().unwrap();
        assert_eq!(registry.len(), 1);
        let (shape, _) = shape_hierarchy(&mut registry);
        assert_eq!(shape.size(), 8);
    }

    /// The only test touching the process-wide registry
    #[test]
    fn global_registry_window() {
        assert_eq!(
            global::lookup("shape").unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert!(global::close().is_err());

        global::open().unwrap();
        assert!(global::is_open());
        assert_eq!(global::open().unwrap_err().kind(), ErrorKind::Exists);

        let shape = global::declare(TypeDecl::composite("shape").size(8)).unwrap();
        let circle = global::register("circle", TypeKind::Composite, 16, Some(&shape), None).unwrap();
        assert!(is_descendant_or_equal(&circle, &global::root().unwrap()));
        assert!(TypeRef::ptr_eq(&global::lookup("circle").unwrap(), &circle));
        assert_eq!(
            global::register("circle", TypeKind::Composite, 16, Some(&shape), None)
                .unwrap_err()
                .kind(),
            ErrorKind::Exists
        );

        global::close().unwrap();
        assert!(!global::is_open());
        assert!(global::declare(TypeDecl::composite("shape")).is_err());

        global::open().unwrap();
        global::declare(TypeDecl::composite("shape").size(8)).unwrap();
        global::close().unwrap();
    }
}
