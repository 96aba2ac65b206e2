use autorisatie_formset::{FormSetConfig, FormSetHost, FormSetProps, RowData};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;

const ROW_SAMPLES: &[usize] = &[0, 8, 32, 128];
const APPENDS: usize = 16;

fn props(rows: usize) -> FormSetProps {
    let form_data: Vec<RowData> = (0..rows)
        .filter_map(|id| match json!({ "id": id, "component": "zrc", "scopes": ["lezen"] }) {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();
    let total = u32::try_from(rows).unwrap_or(u32::MAX);
    FormSetProps::new(FormSetConfig::new("auth", total, total, 0, 1000), form_data)
}

fn bench_mount(c: &mut Criterion) {
    let mut group = c.benchmark_group("formset_mount");
    for &rows in ROW_SAMPLES {
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, &rows| {
            b.iter(|| {
                let host = FormSetHost::mount(props(rows)).expect("mount");
                black_box(host.markup().expect("markup"));
            });
        });
    }
    group.finish();
}

fn bench_append(c: &mut Criterion) {
    c.bench_function("formset_append_rows", |b| {
        b.iter(|| {
            let mut host = FormSetHost::mount(props(8)).expect("mount");
            for _ in 0..APPENDS {
                host.append_row().expect("append");
            }
            black_box(host.row_count().expect("rows"));
        });
    });
}

fn bench_render(c: &mut Criterion) {
    let host = FormSetHost::mount(props(128)).expect("mount");
    c.bench_function("formset_render_markup", |b| {
        b.iter(|| black_box(host.markup().expect("markup")));
    });
}

criterion_group!(formset, bench_mount, bench_append, bench_render);
criterion_main!(formset);
