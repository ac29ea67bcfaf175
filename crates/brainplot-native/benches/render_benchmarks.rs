//! Benchmarks for the software renderer

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use brainplot_core::{build_electrode_plot, ElectrodeDataset, PlotOptions};
use brainplot_native::mesh::vtk::read_vtk;
use brainplot_native::{BrainScene, MeshStyle, SceneStyle, SurfaceMesh, ViewAngles};

/// UV sphere standing in for a cortical surface
fn generate_sphere(radius: f32, rings: u32, segments: u32) -> SurfaceMesh {
    use std::f32::consts::PI;

    let mut positions = Vec::new();
    for r in 0..=rings {
        let theta = PI * r as f32 / rings as f32;
        for s in 0..segments {
            let phi = 2.0 * PI * s as f32 / segments as f32;
            positions.push([
                radius * theta.sin() * phi.cos(),
                radius * theta.sin() * phi.sin(),
                radius * theta.cos(),
            ]);
        }
    }
    let mut triangles = Vec::new();
    for r in 0..rings {
        for s in 0..segments {
            let a = r * segments + s;
            let b = r * segments + (s + 1) % segments;
            let c = a + segments;
            let d = b + segments;
            triangles.push([a, c, b]);
            triangles.push([b, c, d]);
        }
    }
    SurfaceMesh::new(positions, triangles).unwrap()
}

/// Electrodes scattered on a shell, with alternating-sign t-values
fn generate_dataset(n: usize) -> ElectrodeDataset {
    let coords: Vec<String> = (0..n)
        .map(|i| {
            let a = i as f64 * 0.61;
            let b = i as f64 * 0.37;
            format!("[{}, {}, {}]", 60.0 * a.cos() * b.sin(), 60.0 * a.sin() * b.sin(), 60.0 * b.cos())
        })
        .collect();
    let t_values: Vec<String> = (0..n)
        .map(|i| format!("{}", (i as f64 * 0.7).sin() * 4.0))
        .collect();
    let json = format!(
        r#"{{"coords": [{}], "t_values": [{}]}}"#,
        coords.join(","),
        t_values.join(",")
    );
    ElectrodeDataset::from_json_str(&json).unwrap()
}

fn bench_render_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_frame");
    group.sample_size(10);

    let dataset = generate_dataset(200);
    let plot = build_electrode_plot(&dataset, &PlotOptions::default()).unwrap();
    let meshes = vec![
        (generate_sphere(70.0, 64, 128), MeshStyle::default()),
        (generate_sphere(75.0, 64, 128), MeshStyle::default()),
    ];

    for size in [256u32, 512].iter() {
        let scene = BrainScene::new(meshes.clone(), plot.clone(), SceneStyle::default());
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| black_box(scene.render(&ViewAngles::default(), size, size).unwrap()));
        });
    }

    group.finish();
}

fn bench_vtk_parse(c: &mut Criterion) {
    let mesh = generate_sphere(70.0, 128, 256);
    let mut text = String::from("# vtk DataFile Version 3.0\nbench\nASCII\nDATASET POLYDATA\n");
    text.push_str(&format!("POINTS {} float\n", mesh.vertex_count()));
    for p in &mesh.positions {
        text.push_str(&format!("{} {} {}\n", p[0], p[1], p[2]));
    }
    text.push_str(&format!(
        "POLYGONS {} {}\n",
        mesh.triangle_count(),
        mesh.triangle_count() * 4
    ));
    for t in &mesh.triangles {
        text.push_str(&format!("3 {} {} {}\n", t[0], t[1], t[2]));
    }
    let bytes = text.into_bytes();

    c.bench_function("vtk_parse_ascii", |b| {
        b.iter(|| black_box(read_vtk(black_box(&bytes)).unwrap()));
    });
}

criterion_group!(benches, bench_render_frame, bench_vtk_parse);
criterion_main!(benches);
