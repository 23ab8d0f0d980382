use criterion::{black_box, criterion_group, criterion_main, Criterion};
use foundation_store::{DynamicValue, MemoryProperties, PersistentStore, Selector, VolatileStore};

fn bench_volatile_set_get(c: &mut Criterion) {
    c.bench_function("VolatileStore::set+get x1000", |b| {
        b.iter(|| {
            let mut store = VolatileStore::new();
            for i in 0..1000 {
                store.set(format!("key-{i}"), i);
            }
            black_box(store.get("key-500").into_one())
        })
    });
}

fn bench_volatile_dispatch(c: &mut Criterion) {
    let mut store = VolatileStore::new();
    for i in 0..10 {
        store.watch(Selector::pattern(&format!("^key-{i}")).unwrap());
    }
    store.subscribe(|event| {
        black_box(&event.key);
    });

    c.bench_function("VolatileStore::set with 10 watches", |b| {
        let mut n = 0i64;
        b.iter(|| {
            n += 1;
            store.set("key-1", n);
        })
    });
}

fn bench_persistent_round_trip(c: &mut Criterion) {
    let values = [
        ("bool", DynamicValue::Bool(true)),
        ("int", DynamicValue::Int(42)),
        ("double", DynamicValue::Double(12.5)),
        ("list", DynamicValue::from(vec![1, 2, 3, 4, 5])),
        (
            "object",
            DynamicValue::from_json(serde_json::json!({"a": 1, "b": [true, "x"]})).unwrap(),
        ),
    ];

    for (name, value) in values {
        c.bench_function(&format!("PersistentStore::set+get {name}"), |b| {
            let mut store = PersistentStore::new(MemoryProperties::new());
            b.iter(|| {
                store.set("k", value.clone()).unwrap();
                black_box(store.get("k").unwrap().into_one())
            })
        });
    }
}

fn bench_persistent_pattern_get(c: &mut Criterion) {
    let mut store = PersistentStore::new(MemoryProperties::new());
    for i in 0..1000 {
        store.set(format!("user.{i}"), i).unwrap();
        store.set(format!("item.{i}"), i).unwrap();
    }
    let selector = Selector::pattern("^user\\.").unwrap();

    c.bench_function("PersistentStore::get pattern over 2000 keys", |b| {
        b.iter(|| black_box(store.get(&selector).unwrap().len()))
    });
}

criterion_group!(
    benches,
    bench_volatile_set_get,
    bench_volatile_dispatch,
    bench_persistent_round_trip,
    bench_persistent_pattern_get,
);
criterion_main!(benches);
