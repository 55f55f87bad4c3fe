use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use straps::{FieldSource, Realm, Value};

fn wide_source(realm: &mut Realm, fields: usize) -> FieldSource {
    let mut source = FieldSource::new();
    for i in 0..fields {
        let method = realm.define_function(&format!("method{}", i), 0, |_, _| Ok(Value::Undefined));
        source = source.field(&format!("method{}", i), method);
        source = source.field(&format!("value{}", i), i as f64);
    }
    source
}

fn bench_inject(c: &mut Criterion) {
    let mut group = c.benchmark_group("inject");

    for fields in [4usize, 32, 128] {
        group.bench_with_input(BenchmarkId::new("object", fields), &fields, |b, &fields| {
            let mut realm = Realm::new();
            let source = wide_source(&mut realm, fields);
            b.iter(|| {
                let obj = realm.record();
                realm.inject(obj, black_box(&[source.clone()])).unwrap()
            });
        });
    }

    group.finish();
}

fn bench_beans(c: &mut Criterion) {
    c.bench_function("inject_bean_pairs", |b| {
        let mut realm = Realm::new();
        let mut source = FieldSource::new();
        for name in ["Width", "Height", "Depth", "Color"] {
            let get = realm.define_function(&format!("get{}", name), 0, |_, _| Ok(Value::Null));
            let set = realm.define_function(&format!("set{}", name), 1, |_, _| Ok(Value::Undefined));
            source = source
                .field(&format!("get{}", name), get)
                .field(&format!("set{}", name), set);
        }
        b.iter(|| {
            let obj = realm.record();
            realm.inject(obj, black_box(&[source.clone()])).unwrap()
        });
    });
}

fn bench_extend_chain(c: &mut Criterion) {
    c.bench_function("extend_chain_depth_8", |b| {
        let mut realm = Realm::new();
        let source = wide_source(&mut realm, 8);
        b.iter(|| {
            let mut class = realm.base_class();
            for _ in 0..8 {
                class = realm.extend(class, black_box(&[source.clone()])).unwrap();
            }
            realm.construct(class, Vec::new()).unwrap()
        });
    });
}

criterion_group!(benches, bench_inject, bench_beans, bench_extend_chain);
criterion_main!(benches);
