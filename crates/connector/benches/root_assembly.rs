//! Performance benchmarks for root assembly.
//!
//! These benchmarks measure the per-request hot paths:
//! - Merging one driver configuration over the default policy
//! - Resolving attributes against a compiled rule set
//! - Building the full operations structure

use std::sync::Arc;

use connector::context::{
    Course, IdentityTranslator, NoEntities, PathTable, RequestContext, RoleSet, StaticUrlGenerator,
    User, PATH_COURSES, PATH_TEMP, PATH_USERS,
};
use connector::roots::{
    Attribute, AttributeRule, AttributeSet, ConfigMerger, DefaultPolicy, PartialConfiguration,
};
use connector::{Connector, ConnectorSettings};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn full_context() -> Arc<RequestContext> {
    let paths = PathTable::new()
        .with(PATH_TEMP, "/srv/lms/tmp")
        .with(PATH_COURSES, "/srv/lms/courses")
        .with(PATH_USERS, "/srv/lms/users");

    let context = RequestContext::builder(paths)
        .user(Some(User {
            id: 42,
            username: "jdoe".to_string(),
        }))
        .course(Some(Course {
            id: 7,
            code: "PHYS101".to_string(),
            title: "Physics 101".to_string(),
            directory: None,
        }))
        .url_generator(Arc::new(StaticUrlGenerator::new("https://lms.test")))
        .translator(Arc::new(IdentityTranslator))
        .security(Arc::new(RoleSet::new(["ROLE_STUDENT"])))
        .entities(Arc::new(NoEntities))
        .build()
        .unwrap();
    Arc::new(context)
}

/// Benchmark merging a single driver configuration.
fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    let merger = ConfigMerger::default();
    let defaults = DefaultPolicy::builtin().defaults();
    let mut home = PartialConfiguration::for_driver("HomeDriver");
    home.push_attribute(AttributeRule::hidden("/^secret/"));

    group.bench_function("home_with_rule", |b| {
        b.iter(|| merger.merge(black_box(&defaults), black_box(&home)).unwrap());
    });

    group.bench_function("pass_through", |b| {
        b.iter(|| merger.pass_through(black_box(&home)).unwrap());
    });

    group.finish();
}

/// Benchmark attribute resolution over the default rules.
fn bench_attribute_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("attribute_resolution");

    let rules = AttributeSet::compile(&DefaultPolicy::builtin().attributes).unwrap();

    group.bench_function("no_match", |b| {
        b.iter(|| rules.resolve(Attribute::Hidden, black_box("/docs/lecture-01.pdf")));
    });

    group.bench_function("script_match", |b| {
        b.iter(|| rules.resolve(Attribute::Hidden, black_box("/docs/upload.PHP")));
    });

    group.finish();
}

/// Benchmark building the operations structure for a full request.
fn bench_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("operations");

    let context = full_context();

    group.bench_function("five_builtin_drivers", |b| {
        b.iter(|| {
            let mut connector =
                Connector::new(context.clone(), ConnectorSettings::default()).unwrap();
            black_box(connector.get_operations())
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_merge,
    bench_attribute_resolution,
    bench_operations,
);

criterion_main!(benches);
