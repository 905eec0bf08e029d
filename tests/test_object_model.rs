use objcore::error::{clear_last_error, last_error};
use objcore::object::HEADER_SIZE;
use objcore::types::global;
use objcore::{
    is_descendant_or_equal, ErrorKind, HashContainer, Name, NameInterner, Object, RuntimeConfig,
    TypeDecl, TypeKind, TypeRegistry,
};
use std::cell::RefCell;
use std::ptr::NonNull;

thread_local! {
    static EVENTS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

fn events() -> Vec<String> {
    EVENTS.with(|log| std::mem::take(&mut *log.borrow_mut()))
}

unsafe fn destructor_a(data: NonNull<u8>) {
    let id = data.cast::<u64>().as_ptr().read();
    EVENTS.with(|log| log.borrow_mut().push(format!("A:{}", id)));
}

unsafe fn destructor_b(data: NonNull<u8>) {
    let id = data.cast::<u64>().as_ptr().read();
    EVENTS.with(|log| log.borrow_mut().push(format!("B:{}", id)));
}

#[test]
fn test_shape_circle_destructor_order() {
    let mut registry = TypeRegistry::open().unwrap();
    let shape = registry
        .register("shape", TypeKind::Composite, 8, None, Some(destructor_a))
        .unwrap();
    let circle = registry
        .register("circle", TypeKind::Composite, 16, Some(&shape), Some(destructor_b))
        .unwrap();

    let first = Object::with_value(&circle, 1u64).unwrap();
    assert_eq!(first.refcount(), 1);
    first.release();
    assert_eq!(events(), ["B:1", "A:1"]);

    let second = Object::with_value(&circle, 2u64).unwrap();
    assert_eq!(second.refcount(), 1);
    assert!(events().is_empty());
    assert!(second.is_instance_of(&shape));

    drop(second);
    assert_eq!(events(), ["B:2", "A:2"]);
    registry.close();
}

#[test]
fn test_retain_release_balance() {
    let registry = TypeRegistry::open().unwrap();
    let obj = Object::new(registry.root()).unwrap();

    let mut shares = Vec::new();
    for i in 1..=10u32 {
        shares.push(obj.retain());
        assert_eq!(obj.refcount(), 1 + i);
    }
    for i in (0..10u32).rev() {
        shares.pop().unwrap().release();
        assert_eq!(obj.refcount(), 1 + i);
    }
}

#[test]
fn test_duplicate_registration_keeps_first() {
    let mut registry = TypeRegistry::open().unwrap();
    let first = registry.declare(TypeDecl::composite("mesh").size(32)).unwrap();
    let other = registry.declare(TypeDecl::composite("node").size(64)).unwrap();

    clear_last_error();
    let err = registry
        .declare(TypeDecl::composite("mesh").parent(&other).size(128))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Exists);
    assert_eq!(last_error(), Some(ErrorKind::Exists));

    let visible = registry.lookup("mesh").unwrap();
    assert!(std::sync::Arc::ptr_eq(&visible, &first));
    assert_eq!(visible.size(), 32);
}

#[test]
fn test_descendant_relation() {
    let mut registry = TypeRegistry::open().unwrap();
    let b = registry.declare(TypeDecl::composite("B").size(8)).unwrap();
    let d = registry.declare(TypeDecl::composite("D").parent(&b).size(8)).unwrap();

    assert!(is_descendant_or_equal(&d, &b));
    assert!(!is_descendant_or_equal(&b, &d));
    assert!(is_descendant_or_equal(&d, &d));
}

#[test]
fn test_container_scenario() {
    let mut map: HashContainer<u32, String> = HashContainer::with_capacity(8).unwrap();
    for k in 1..=1000u32 {
        map.set(k, format!("v{}", k), false).unwrap();
    }
    assert_eq!(map.get(&500).unwrap(), "v500");

    for k in 1..=500u32 {
        let (key, value) = map.remove(&k).unwrap();
        assert_eq!(key, k);
        assert_eq!(value, format!("v{}", k));
    }

    let mut seen: Vec<u32> = map.iter().map(|(k, _)| *k).collect();
    assert_eq!(seen.len(), 500);
    seen.sort_unstable();
    assert_eq!(seen, (501..=1000).collect::<Vec<_>>());

    assert_eq!(map.get(&42).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn test_cursor_removal_visits_rest_once() {
    let mut map: HashContainer<u32, u32> = HashContainer::with_capacity(4).unwrap();
    for k in 0..64u32 {
        map.set(k, k * 10, false).unwrap();
    }

    let mut visited = Vec::new();
    let mut cursor = map.cursor();
    while let Some((k, v)) = cursor.current() {
        let k = *k;
        assert_eq!(*v, k * 10);
        visited.push(k);
        if k % 3 == 0 {
            cursor.remove_current();
        } else {
            cursor.advance();
        }
    }

    visited.sort_unstable();
    assert_eq!(visited, (0..64).collect::<Vec<_>>());
    assert_eq!(map.len(), 64 - 22);
    assert!(map.iter().all(|(k, _)| k % 3 != 0));
}

#[test]
fn test_interned_names_share_storage() {
    let mut interner = NameInterner::new();
    let a = interner.intern("circle");
    let b = interner.intern(String::from("circle"));
    assert!(a.ptr_eq(&b));
    assert_eq!(a, Name::from("circle"));
    assert_eq!(interner.len(), 1);
}

#[test]
fn test_registry_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("objcore.toml");
    std::fs::write(
        &path,
        "[registry]\ninitial_capacity = 4\nroot_name = \"entity\"\n\n[logging]\nlevel = \"warn\"\n",
    )
    .unwrap();

    let config = RuntimeConfig::load(&path).unwrap();
    let mut registry = TypeRegistry::open_with(&config.registry).unwrap();
    assert_eq!(registry.root().name().as_str(), Some("entity"));

    let light = registry.declare(TypeDecl::composite("light").size(16)).unwrap();
    let obj = Object::allocate(HEADER_SIZE + 16, &light).unwrap();
    assert!(obj.is_instance_of(registry.root()));
}

#[test]
fn test_runtime_lifecycle() {
    let config = RuntimeConfig::default();
    objcore::init_with_config(&config).unwrap();
    assert!(global::is_open());

    let ty = global::declare(TypeDecl::composite("camera").size(8)).unwrap();
    let obj = Object::new(&ty).unwrap();
    assert!(obj.is_instance_of(&global::root().unwrap()));

    objcore::shutdown().unwrap();
    assert_eq!(obj.type_descriptor().name().as_str(), Some("camera"));
    assert_eq!(
        global::lookup("camera").unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
}
