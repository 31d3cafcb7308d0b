use bvh_index::geometry::primitives::Aabb;
use bvh_index::spatial_partitioning::bvh::Bvh;
use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::Vector3;
use rand::{rngs::StdRng, Rng, SeedableRng};

type Vec3f = Vector3<f32>;

fn synthetic_scene(n: usize, seed: u64) -> Vec<Aabb> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..n)
        .map(|_| {
            let center = Vec3f::new(
                rng.gen_range(-500.0..500.0),
                rng.gen_range(-500.0..500.0),
                rng.gen_range(-500.0..500.0),
            );
            let half_extent = Vec3f::new(
                rng.gen_range(0.05..1.0),
                rng.gen_range(0.05..1.0),
                rng.gen_range(0.05..1.0),
            );
            Aabb::new(center - half_extent, center + half_extent)
        })
        .collect()
}

fn criterion_benchmark(c: &mut Criterion) {
    // `build_bottom_up` is the naive O(N^3) agglomerative merge (see
    // `Bvh::build_bottom_up` docs), so these groups stay small enough for it
    // to finish in a reasonable benchmark iteration.
    let groups = [50, 200, 800];

    for object_count in groups {
        let bvs = synthetic_scene(object_count, 42);
        let mut group = c.benchmark_group(format!("{object_count} objects"));

        group.bench_function("build_top_down", |b| {
            b.iter(|| {
                let mut bvh = Bvh::new();
                bvh.build_top_down(&bvs, Bvh::UNBOUNDED_DEPTH);
            })
        });

        group.bench_function("build_bottom_up", |b| {
            b.iter(|| {
                let mut bvh = Bvh::new();
                bvh.build_bottom_up(&bvs);
            })
        });

        group.bench_function("insert_all", |b| {
            b.iter(|| {
                let mut bvh = Bvh::new();
                for (i, bv) in bvs.iter().enumerate() {
                    bvh.insert(*bv, i as u32, Bvh::UNBOUNDED_DEPTH);
                }
            })
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
